//! Shortcode → classifier → extractor routing.

use crate::classifier::HeuristicClassifier;
use crate::extractor::ScenarioExtractor;
use scenar_core::config::EngineConfig;
use scenar_core::error::{Result, ScenarError};
use scenar_core::heuristic::{HeuristicCatalog, ShortcodeMatcher};
use scenar_core::oracle::Oracle;
use scenar_core::scenario::RoutingDecision;
use scenar_interaction::with_retry;
use serde_json::Value;
use std::sync::Arc;

/// How the heuristic was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Shortcode,
    Classifier,
}

impl RouteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shortcode => "shortcode",
            Self::Classifier => "classifier",
        }
    }
}

pub struct ScenarioRouter {
    classifier: HeuristicClassifier,
    extractor: ScenarioExtractor,
}

impl ScenarioRouter {
    pub fn new(classifier: HeuristicClassifier, extractor: ScenarioExtractor) -> Self {
        Self {
            classifier,
            extractor,
        }
    }

    /// Builds classifier and extractor over one oracle, each with the retry
    /// policy configured for its category.
    pub fn from_config(oracle: Arc<dyn Oracle>, config: &EngineConfig) -> Self {
        let retry = &config.retry;
        let classifier = HeuristicClassifier::new(
            with_retry(oracle.clone(), retry.classification),
            config.classifier.threshold,
        )
        .with_policy(retry.classification);
        let extractor = ScenarioExtractor::new(with_retry(oracle, retry.extraction), retry.extraction);
        Self::new(classifier, extractor)
    }

    /// Picks a heuristic for `text` and extracts its scenario.
    ///
    /// The extractor always sees the raw text; the chosen id is then written
    /// to `parameters["heuristic"]`, replacing anything the oracle put there.
    pub async fn route(&self, catalog: &HeuristicCatalog, text: &str) -> Result<RoutingDecision> {
        let (heuristic, description, source) = match ShortcodeMatcher::new(catalog).find(text) {
            Some(id) => {
                let definition = catalog.lookup(id)?;
                (id.to_string(), definition.description.clone(), RouteSource::Shortcode)
            }
            None => match self.classifier.classify(catalog, text).await? {
                Some(found) => (found.id, found.description, RouteSource::Classifier),
                None => {
                    tracing::info!(target: "scenar::pipeline", stage = "route", "No heuristic matched");
                    return Err(ScenarError::NoHeuristicMatched);
                }
            },
        };
        tracing::info!(
            target: "scenar::pipeline",
            stage = "route",
            heuristic = %heuristic,
            source = source.as_str(),
            "Heuristic selected"
        );

        let mut scenario = self.extractor.extract(catalog, text).await?;
        scenario
            .parameters
            .insert("heuristic".to_string(), Value::String(heuristic.clone()));
        tracing::info!(
            target: "scenar::pipeline",
            stage = "extract",
            goal = %scenario.goal,
            "Scenario extracted"
        );

        Ok(RoutingDecision::new(heuristic, description, scenario, text))
    }
}
