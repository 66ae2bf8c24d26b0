//! Heuristic domain model.

use serde::{Deserialize, Serialize};

/// Directives a heuristic imposes on the oracle's reasoning.
///
/// Both lists are ordered; they are rendered into the reasoning prompt in the
/// order they were configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub must_do: Vec<String>,
    #[serde(default)]
    pub must_not_do: Vec<String>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.must_do.is_empty() && self.must_not_do.is_empty()
    }

    /// Renders the rule set as two headed bullet lists.
    pub fn render(&self) -> String {
        let mut out = String::from("Must do:");
        for rule in &self.must_do {
            out.push_str("\n- ");
            out.push_str(rule);
        }
        out.push_str("\n\nMust not do:");
        for rule in &self.must_not_do {
            out.push_str("\n- ");
            out.push_str(rule);
        }
        out
    }
}

/// A named reasoning strategy.
///
/// Definitions are configuration: loaded once, then shared read-only through
/// catalog snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicDefinition {
    /// Unique key, also the shortcode (`/<id>`). Stored lowercase.
    pub id: String,
    /// Human-readable name. Falls back to the id when not configured.
    #[serde(default)]
    pub name: String,
    /// Short description used in classification prompts.
    pub description: String,
    /// Detailed reasoning directive for the simulation.
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleSet>,
}

impl HeuristicDefinition {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        let id = id.into().to_lowercase();
        Self {
            name: id.clone(),
            id,
            description: description.into(),
            prompt: prompt.into(),
            rules: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Returns the name to display, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// The full reasoning prompt with the rule set embedded.
    pub fn reasoning_prompt(&self) -> String {
        match &self.rules {
            Some(rules) if !rules.is_empty() => {
                format!("{}\n\nApply these rules:\n{}", self.prompt.trim_end(), rules.render())
            }
            _ => self.prompt.clone(),
        }
    }
}
