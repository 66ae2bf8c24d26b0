//! Structured scenario extracted from free text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Keys every extracted scenario must carry.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "goal",
    "constraints",
    "conditions",
    "heuristic",
    "response_format",
];

/// Placeholder the oracle is told to use for anything it cannot determine.
pub const NONE_SPECIFIED: &str = "none specified";

/// Why a JSON object was not accepted as a scenario.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScenarioValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field '{field}' must be {expected}, found {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// How deep the simulation should go.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AnalysisDepth {
    Quick,
    Standard,
    Deep,
}

/// A user request broken down into goal, constraints and conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedScenario {
    pub goal: String,
    pub constraints: Vec<String>,
    pub conditions: Vec<String>,
    pub heuristic: String,
    pub response_format: String,
    /// Free-form extras (entities, timeline, analysis_depth, ...). Always
    /// present, possibly empty.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ParsedScenario {
    /// Validates and normalises an oracle-produced JSON object.
    ///
    /// List fields given as a single string become one-element lists, and
    /// non-string list items are kept as their compact JSON text. A missing
    /// `parameters` (or one given as a placeholder string or null) becomes the
    /// empty map.
    pub fn from_json_object(object: &Map<String, Value>) -> Result<Self, ScenarioValidationError> {
        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(ScenarioValidationError::MissingField(field));
            }
        }

        let parameters = match object.get("parameters") {
            None | Some(Value::Null) | Some(Value::String(_)) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(ScenarioValidationError::WrongType {
                    field: "parameters",
                    expected: "an object",
                    found: json_kind(other),
                });
            }
        };

        Ok(Self {
            goal: string_field(object, "goal")?,
            constraints: list_field(object, "constraints")?,
            conditions: list_field(object, "conditions")?,
            heuristic: string_field(object, "heuristic")?,
            response_format: string_field(object, "response_format")?,
            parameters,
        })
    }

    /// The `analysis_depth` parameter, when present and recognised.
    pub fn analysis_depth(&self) -> Option<AnalysisDepth> {
        self.parameters
            .get("analysis_depth")
            .and_then(Value::as_str)
            .and_then(|s| AnalysisDepth::from_str(s.trim()).ok())
    }

    /// The `timeline` parameter unless it is the placeholder.
    pub fn timeline(&self) -> Option<&str> {
        self.parameters
            .get("timeline")
            .and_then(Value::as_str)
            .filter(|s| !s.eq_ignore_ascii_case(NONE_SPECIFIED))
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn string_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ScenarioValidationError> {
    match &object[field] {
        Value::String(s) => Ok(s.clone()),
        other => Err(ScenarioValidationError::WrongType {
            field,
            expected: "a string",
            found: json_kind(other),
        }),
    }
}

fn list_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, ScenarioValidationError> {
    match &object[field] {
        Value::Array(items) => Ok(items.iter().map(value_text).collect()),
        Value::String(s) => Ok(vec![s.clone()]),
        other => Err(ScenarioValidationError::WrongType {
            field,
            expected: "a list of strings",
            found: json_kind(other),
        }),
    }
}

/// Strings as-is, everything else as compact JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn complete() -> Value {
        json!({
            "goal": "Reach a ceasefire",
            "constraints": ["by Friday"],
            "conditions": ["both parties attend"],
            "heuristic": "negotiation",
            "response_format": "text",
            "parameters": {
                "timeline": "one week",
                "analysis_depth": "Deep",
                "entities": ["A", "B"]
            }
        })
    }

    #[test]
    fn test_complete_object_parses() {
        let scenario = ParsedScenario::from_json_object(&object(complete())).unwrap();
        assert_eq!(scenario.goal, "Reach a ceasefire");
        assert_eq!(scenario.constraints, vec!["by Friday"]);
        assert_eq!(scenario.analysis_depth(), Some(AnalysisDepth::Deep));
        assert_eq!(scenario.timeline(), Some("one week"));
    }

    #[test]
    fn test_each_required_field_is_enforced() {
        for field in REQUIRED_FIELDS {
            let mut map = object(complete());
            map.remove(field);
            assert_eq!(
                ParsedScenario::from_json_object(&map),
                Err(ScenarioValidationError::MissingField(field))
            );
        }
    }

    #[test]
    fn test_parameters_default_to_empty() {
        let mut map = object(complete());
        map.remove("parameters");
        let scenario = ParsedScenario::from_json_object(&map).unwrap();
        assert!(scenario.parameters.is_empty());

        map.insert("parameters".into(), json!(NONE_SPECIFIED));
        let scenario = ParsedScenario::from_json_object(&map).unwrap();
        assert!(scenario.parameters.is_empty());
    }

    #[test]
    fn test_list_normalisation() {
        let mut map = object(complete());
        map.insert("constraints".into(), json!(NONE_SPECIFIED));
        map.insert("conditions".into(), json!(["a", 3, {"k": "v"}]));
        let scenario = ParsedScenario::from_json_object(&map).unwrap();
        assert_eq!(scenario.constraints, vec![NONE_SPECIFIED]);
        assert_eq!(scenario.conditions, vec!["a", "3", r#"{"k":"v"}"#]);
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        let mut map = object(complete());
        map.insert("goal".into(), json!(42));
        assert!(matches!(
            ParsedScenario::from_json_object(&map),
            Err(ScenarioValidationError::WrongType { field: "goal", .. })
        ));

        let mut map = object(complete());
        map.insert("constraints".into(), json!({"a": 1}));
        assert!(ParsedScenario::from_json_object(&map).is_err());
    }

    #[test]
    fn test_unknown_analysis_depth_is_none() {
        let mut map = object(complete());
        map.insert("parameters".into(), json!({"analysis_depth": "quick|standard|deep"}));
        let scenario = ParsedScenario::from_json_object(&map).unwrap();
        assert_eq!(scenario.analysis_depth(), None);
        assert_eq!(scenario.timeline(), None);
    }
}
