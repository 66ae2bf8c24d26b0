//! Structured scenario extraction with bounded re-prompting.

use crate::prompts;
use scenar_core::config::RetryPolicy;
use scenar_core::error::{Result, ScenarError};
use scenar_core::heuristic::HeuristicCatalog;
use scenar_core::oracle::{Oracle, OracleMessage, OracleReply};
use scenar_core::scenario::ParsedScenario;
use std::sync::Arc;

/// Turns free text into a [`ParsedScenario`].
///
/// A reply without a parsable JSON object is re-requested with the parse
/// error and the original text, up to `policy.structural` times. A JSON
/// object that fails validation (missing or mistyped required field) fails
/// at once: re-asking is reserved for syntax problems.
pub struct ScenarioExtractor {
    oracle: Arc<dyn Oracle>,
    policy: RetryPolicy,
}

impl ScenarioExtractor {
    pub fn new(oracle: Arc<dyn Oracle>, policy: RetryPolicy) -> Self {
        Self { oracle, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn extract(&self, catalog: &HeuristicCatalog, text: &str) -> Result<ParsedScenario> {
        let today = chrono::Local::now().format("%A %Y-%m-%d").to_string();
        let system = prompts::extraction_directive(catalog, &today)?;
        let attempts = self.policy.structural_attempts();

        let mut query = prompts::extraction_query(text);
        let mut last_reason = String::new();

        for attempt in 1..=attempts {
            let outcome = self
                .oracle
                .complete(&system, &[OracleMessage::user(query.as_str())])
                .await;

            match OracleReply::from_outcome(outcome) {
                OracleReply::Failure(err) => return Err(err.into()),
                OracleReply::Structured(object) => {
                    return ParsedScenario::from_json_object(&object).map_err(|err| {
                        tracing::warn!(attempt, error = %err, "Extracted scenario failed validation");
                        ScenarError::extraction_failed(attempt, err.to_string())
                    });
                }
                OracleReply::RawText { reason, .. } => {
                    tracing::warn!(attempt, attempts, %reason, "Extraction reply was not valid JSON");
                    query = prompts::extraction_query(&prompts::extraction_retry_query(&reason, text));
                    last_reason = reason;
                }
            }
        }

        Err(ScenarError::extraction_failed(
            attempts,
            format!("Maximum retry attempts exceeded: {last_reason}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedOracle;
    use scenar_core::OracleError;

    const VALID: &str = r#"{
        "goal": "Reach a ceasefire",
        "constraints": ["by Friday"],
        "conditions": ["none specified"],
        "heuristic": "negotiation",
        "response_format": "text",
        "parameters": {"timeline": "this week", "analysis_depth": "deep"}
    }"#;

    fn extractor(oracle: &Arc<ScriptedOracle>) -> ScenarioExtractor {
        ScenarioExtractor::new(oracle.clone(), RetryPolicy::new(2, 0, 0))
    }

    #[tokio::test]
    async fn test_valid_reply_is_parsed() {
        let oracle = ScriptedOracle::with_texts([VALID]);
        let scenario = extractor(&oracle)
            .extract(&HeuristicCatalog::builtin(), "We need a ceasefire by Friday")
            .await
            .unwrap();

        assert_eq!(scenario.goal, "Reach a ceasefire");
        assert_eq!(scenario.constraints, vec!["by Friday"]);
        assert_eq!(scenario.timeline(), Some("this week"));
        assert_eq!(oracle.calls(), 1);
        assert_eq!(
            oracle.request(0).messages,
            vec![OracleMessage::user(
                "Here is the user query: We need a ceasefire by Friday"
            )]
        );
    }

    #[tokio::test]
    async fn test_fenced_reply_is_accepted() {
        let fenced = format!("Here is the scenario:\n```json\n{VALID}\n```");
        let oracle = ScriptedOracle::with_texts([fenced.as_str()]);
        let scenario = extractor(&oracle)
            .extract(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap();
        assert_eq!(scenario.heuristic, "negotiation");
    }

    #[tokio::test]
    async fn test_syntax_error_is_retried_with_error_description() {
        let oracle = ScriptedOracle::with_texts(["{\"goal\": ", VALID]);
        let scenario = extractor(&oracle)
            .extract(&HeuristicCatalog::builtin(), "ceasefire by Friday")
            .await
            .unwrap();
        assert_eq!(scenario.goal, "Reach a ceasefire");
        assert_eq!(oracle.calls(), 2);

        let retry = &oracle.request(1).messages[0].content;
        assert!(retry.contains("There was an error in the previous response: "));
        assert!(retry.contains("Here is the original user query: ceasefire by Friday."));
    }

    #[tokio::test]
    async fn test_three_syntax_failures_fail() {
        let oracle = ScriptedOracle::with_texts(["nope", "still nope", "[1, 2]", VALID]);
        let err = extractor(&oracle)
            .extract(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, ScenarError::ExtractionFailed { attempts: 3, .. }));
        assert!(err.is_retryable_input());
        assert_eq!(oracle.calls(), 3);
    }

    #[tokio::test]
    async fn test_partial_retry_config_keeps_reprompting() {
        let config: scenar_core::config::EngineConfig =
            serde_json::from_str(r#"{"retry": {"extraction": {"backoff_ms": 0}}}"#).unwrap();
        let oracle = ScriptedOracle::with_texts(["not json", VALID]);
        let scenario = ScenarioExtractor::new(oracle.clone(), config.retry.extraction)
            .extract(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap();
        assert_eq!(scenario.goal, "Reach a ceasefire");
        assert_eq!(oracle.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_goal_fails_without_retry() {
        let oracle = ScriptedOracle::with_texts([
            r#"{"constraints": [], "conditions": [], "heuristic": "negotiation", "response_format": "text"}"#,
            VALID,
        ]);
        let err = extractor(&oracle)
            .extract(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap_err();
        match err {
            ScenarError::ExtractionFailed { attempts, reason } => {
                assert_eq!(attempts, 1);
                assert!(reason.contains("goal"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_is_not_retried() {
        let oracle = ScriptedOracle::new([
            Err(OracleError::unavailable("HTTP 503: overloaded")),
            Ok(VALID.to_string()),
        ]);
        let err = extractor(&oracle)
            .extract(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap_err();
        assert!(err.is_oracle());
        assert_eq!(oracle.calls(), 1);
    }
}
