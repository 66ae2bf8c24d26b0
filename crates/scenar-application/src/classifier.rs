//! Confidence-gated heuristic classification.

use crate::prompts;
use scenar_core::config::RetryPolicy;
use scenar_core::error::Result;
use scenar_core::heuristic::HeuristicCatalog;
use scenar_core::oracle::{Oracle, OracleMessage, OracleReply};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A heuristic the oracle picked with enough confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicMatch {
    pub id: String,
    pub description: String,
    pub confidence: f64,
    pub reasoning: Option<String>,
}

/// Why a classification reply did not produce a match.
#[derive(Debug, Clone, PartialEq)]
enum Rejection {
    /// The reply was unusable; may be re-asked under the structural policy.
    Malformed(String),
    /// A well-formed answer that does not select a heuristic.
    NoMatch(String),
}

pub struct HeuristicClassifier {
    oracle: Arc<dyn Oracle>,
    threshold: f64,
    policy: RetryPolicy,
}

impl HeuristicClassifier {
    pub fn new(oracle: Arc<dyn Oracle>, threshold: f64) -> Self {
        Self {
            oracle,
            threshold,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Asks the oracle which heuristic fits `text`.
    ///
    /// Low confidence, `"none"`, unknown ids and malformed replies all yield
    /// `Ok(None)`. Oracle failures are returned as errors.
    pub async fn classify(
        &self,
        catalog: &HeuristicCatalog,
        text: &str,
    ) -> Result<Option<HeuristicMatch>> {
        let system = prompts::classification_directive(catalog)?;
        let messages = [OracleMessage::user(text)];
        let attempts = self.policy.structural_attempts();

        for attempt in 1..=attempts {
            let reply = OracleReply::from_outcome(self.oracle.complete(&system, &messages).await);
            let rejection = match reply {
                OracleReply::Failure(err) => return Err(err.into()),
                OracleReply::RawText { reason, .. } => Rejection::Malformed(reason),
                OracleReply::Structured(object) => match self.evaluate(catalog, &object) {
                    Ok(found) => {
                        tracing::info!(
                            heuristic = %found.id,
                            confidence = found.confidence,
                            "Classifier matched heuristic"
                        );
                        return Ok(Some(found));
                    }
                    Err(rejection) => rejection,
                },
            };

            match rejection {
                Rejection::NoMatch(reason) => {
                    tracing::debug!(%reason, "Classifier found no heuristic");
                    return Ok(None);
                }
                Rejection::Malformed(reason) => {
                    tracing::warn!(attempt, attempts, %reason, "Malformed classification reply");
                }
            }
        }

        Ok(None)
    }

    fn evaluate(
        &self,
        catalog: &HeuristicCatalog,
        object: &Map<String, Value>,
    ) -> std::result::Result<HeuristicMatch, Rejection> {
        let id = object
            .get("heuristic")
            .and_then(Value::as_str)
            .map(|s| s.trim().trim_start_matches('/').to_lowercase())
            .ok_or_else(|| Rejection::Malformed("missing 'heuristic'".into()))?;
        let confidence = object
            .get("confidence")
            .and_then(parse_confidence)
            .ok_or_else(|| {
                Rejection::Malformed("missing, non-numeric or out-of-range 'confidence'".into())
            })?;

        if id == "none" {
            return Err(Rejection::NoMatch("oracle answered none".into()));
        }
        if confidence <= self.threshold {
            return Err(Rejection::NoMatch(format!(
                "confidence {confidence} for '{id}' is not above {}",
                self.threshold
            )));
        }
        let definition = catalog
            .lookup(&id)
            .map_err(|_| Rejection::NoMatch(format!("'{id}' is not in the catalog")))?;

        Ok(HeuristicMatch {
            id: definition.id.clone(),
            description: definition.description.clone(),
            confidence,
            reasoning: object
                .get("reasoning")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

fn parse_confidence(value: &Value) -> Option<f64> {
    let confidence = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    confidence.filter(|c| (0.0..=1.0).contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedOracle;
    use scenar_core::{OracleError, ScenarError};

    fn classifier(oracle: &Arc<ScriptedOracle>) -> HeuristicClassifier {
        HeuristicClassifier::new(oracle.clone(), 0.7)
    }

    async fn classify(reply: &str) -> Option<HeuristicMatch> {
        let oracle = ScriptedOracle::with_texts([reply]);
        classifier(&oracle)
            .classify(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_confident_match_is_accepted() {
        let found = classify(r#"{"heuristic": "geopolitics", "confidence": 0.92, "reasoning": "trade war"}"#)
            .await
            .unwrap();
        assert_eq!(found.id, "geopolitics");
        assert_eq!(found.confidence, 0.92);
        assert_eq!(found.reasoning.as_deref(), Some("trade war"));
        assert!(found.description.contains("international relations"));
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        assert!(classify(r#"{"heuristic": "negotiation", "confidence": 0.7}"#).await.is_none());
        assert!(classify(r#"{"heuristic": "negotiation", "confidence": 0.65}"#).await.is_none());
        assert!(classify(r#"{"heuristic": "negotiation", "confidence": 0.71}"#).await.is_some());
    }

    #[tokio::test]
    async fn test_numeric_string_confidence() {
        let found = classify(r#"{"heuristic": "Kidnapping", "confidence": "0.9"}"#).await;
        assert_eq!(found.unwrap().id, "kidnapping");
    }

    #[tokio::test]
    async fn test_none_unknown_and_malformed_are_no_match() {
        assert!(classify(r#"{"heuristic": "none", "confidence": 0.99}"#).await.is_none());
        assert!(classify(r#"{"heuristic": "chess", "confidence": 0.99}"#).await.is_none());
        assert!(classify(r#"{"heuristic": "negotiation"}"#).await.is_none());
        assert!(classify("I think negotiation fits best").await.is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_no_match() {
        assert!(classify(r#"{"heuristic": "negotiation", "confidence": 7}"#).await.is_none());
        assert!(classify(r#"{"heuristic": "negotiation", "confidence": -0.9}"#).await.is_none());
        assert!(classify(r#"{"heuristic": "negotiation", "confidence": "1.5"}"#).await.is_none());
        assert!(classify(r#"{"heuristic": "negotiation", "confidence": 1}"#).await.is_some());
    }

    #[tokio::test]
    async fn test_oracle_failure_propagates() {
        let oracle = ScriptedOracle::new([Err(OracleError::Timeout(std::time::Duration::from_secs(1)))]);
        let err = classifier(&oracle)
            .classify(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, ScenarError::Oracle(OracleError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_request_shape() {
        let oracle = ScriptedOracle::with_texts([r#"{"heuristic": "none", "confidence": 0}"#]);
        classifier(&oracle)
            .classify(&HeuristicCatalog::builtin(), "Trade talks stalled")
            .await
            .unwrap();

        let request = oracle.request(0);
        assert!(request.system.contains("negotiation|kidnapping|geopolitics|none"));
        assert_eq!(request.messages, vec![OracleMessage::user("Trade talks stalled")]);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_not_retried_by_default() {
        let oracle = ScriptedOracle::with_texts([
            "not json",
            r#"{"heuristic": "negotiation", "confidence": 0.9}"#,
        ]);
        let found = classifier(&oracle)
            .classify(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap();
        assert!(found.is_none());
        assert_eq!(oracle.calls(), 1);

        let oracle = ScriptedOracle::with_texts([
            "not json",
            r#"{"heuristic": "negotiation", "confidence": 0.9}"#,
        ]);
        let found = classifier(&oracle)
            .with_policy(RetryPolicy::new(1, 0, 0))
            .classify(&HeuristicCatalog::builtin(), "text")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "negotiation");
        assert_eq!(oracle.calls(), 2);
    }
}
