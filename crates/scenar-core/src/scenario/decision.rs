//! The routing decision bundle.

use super::display;
use super::model::ParsedScenario;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Everything the caller needs to confirm or cancel a routed scenario.
///
/// Immutable after creation; held by the session store until the user
/// confirms or cancels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub heuristic: String,
    pub heuristic_description: String,
    pub parsed_scenario: ParsedScenario,
    pub display_format: String,
    /// The user's input, verbatim, so it can be offered again for editing.
    pub original_prompt: String,
}

impl RoutingDecision {
    /// Bundles a scenario with its heuristic, rendering the display text.
    pub fn new(
        heuristic: impl Into<String>,
        heuristic_description: impl Into<String>,
        parsed_scenario: ParsedScenario,
        original_prompt: impl Into<String>,
    ) -> Self {
        let display_format = display::render(&parsed_scenario);
        Self {
            heuristic: heuristic.into(),
            heuristic_description: heuristic_description.into(),
            parsed_scenario,
            display_format,
            original_prompt: original_prompt.into(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The first user turn of the simulation: the scenario plus the
    /// heuristic's reasoning prompt, as JSON text.
    pub fn seed_text(&self, heuristic_prompt: &str) -> String {
        json!({
            "parsed_scenario": self.parsed_scenario,
            "heuristic_settings": {
                "heuristic": self.heuristic,
                "heuristic_prompt": heuristic_prompt,
            }
        })
        .to_string()
    }
}
