//! Human-readable scenario summary shown for confirmation.

use super::model::{ParsedScenario, value_text};
use serde_json::Value;

pub const SUMMARY_HEADER: &str = "=== Scenario Summary ===";

/// Renders the summary: goal, constraints, conditions, then any parameters.
///
/// The output is a pure function of the scenario. Parameters keep the
/// order the oracle gave them in.
pub fn render(scenario: &ParsedScenario) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(
        6 + scenario.constraints.len() + scenario.conditions.len() + scenario.parameters.len(),
    );

    lines.push(format!("{SUMMARY_HEADER}\n"));
    lines.push(format!("Goal: {}\n", scenario.goal));

    lines.push("\nConstraints:".to_string());
    lines.extend(scenario.constraints.iter().map(|c| format!("- {c}")));

    lines.push("\nConditions:".to_string());
    lines.extend(scenario.conditions.iter().map(|c| format!("- {c}")));

    if !scenario.parameters.is_empty() {
        lines.push("\nAdditional Parameters:".to_string());
        lines.extend(
            scenario
                .parameters
                .iter()
                .map(|(key, value)| format!("- {key}: {}", parameter_text(value))),
        );
    }

    lines.join("\n")
}

fn parameter_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => value_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn scenario(parameters: Map<String, Value>) -> ParsedScenario {
        ParsedScenario {
            goal: "Agree a ceasefire".into(),
            constraints: vec!["by Friday".into(), "no third parties".into()],
            conditions: vec!["talks are in Geneva".into()],
            heuristic: "negotiation".into(),
            response_format: "text".into(),
            parameters,
        }
    }

    #[test]
    fn test_render_without_parameters() {
        let text = render(&scenario(Map::new()));
        assert_eq!(
            text,
            "=== Scenario Summary ===\n\n\
             Goal: Agree a ceasefire\n\n\n\
             Constraints:\n\
             - by Friday\n\
             - no third parties\n\n\
             Conditions:\n\
             - talks are in Geneva"
        );
    }

    #[test]
    fn test_render_with_parameters_in_fixed_order() {
        let mut params = Map::new();
        params.insert("heuristic".into(), json!("negotiation"));
        params.insert("entities".into(), json!(["A", "B"]));
        params.insert("confidence".into(), json!(0.5));

        let text = render(&scenario(params));
        assert!(text.starts_with("=== Scenario Summary ===\n\nGoal: "));

        let goal = text.find("Goal:").unwrap();
        let constraints = text.find("Constraints:").unwrap();
        let conditions = text.find("Conditions:").unwrap();
        let extra = text.find("Additional Parameters:").unwrap();
        assert!(goal < constraints && constraints < conditions && conditions < extra);

        assert!(text.contains("- entities: A, B"));
        assert!(text.contains("- heuristic: negotiation"));
        assert!(text.contains("- confidence: 0.5"));
    }

    #[test]
    fn test_parameters_keep_reply_order() {
        let params: Map<String, Value> = serde_json::from_str(
            r#"{"timeline": "this week", "analysis_depth": "deep", "entities": ["A", "B"]}"#,
        )
        .unwrap();

        let text = render(&scenario(params));
        let extra = text.split("Additional Parameters:\n").nth(1).unwrap();
        assert_eq!(
            extra,
            "- timeline: this week\n- analysis_depth: deep\n- entities: A, B"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut params = Map::new();
        params.insert("timeline".into(), json!("none specified"));
        let s = scenario(params);
        assert_eq!(render(&s), render(&s.clone()));
    }
}
