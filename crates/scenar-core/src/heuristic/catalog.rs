//! The heuristic catalog.
//!
//! A catalog is an immutable, ordered registry of [`HeuristicDefinition`]s.
//! Reloading produces a new catalog rather than mutating an existing one.

use super::model::{HeuristicDefinition, RuleSet};
use crate::error::{Result, ScenarError};
use std::collections::HashMap;

/// Immutable registry keyed by heuristic id.
#[derive(Debug, Clone, Default)]
pub struct HeuristicCatalog {
    definitions: Vec<HeuristicDefinition>,
    index: HashMap<String, usize>,
}

impl HeuristicCatalog {
    /// Builds a catalog, preserving the given order.
    ///
    /// Ids are case-folded. Duplicate or empty ids are configuration errors.
    pub fn new(definitions: Vec<HeuristicDefinition>) -> Result<Self> {
        let mut normalized = Vec::with_capacity(definitions.len());
        let mut index = HashMap::with_capacity(definitions.len());

        for mut definition in definitions {
            definition.id = definition.id.trim().to_lowercase();
            if definition.id.is_empty() {
                return Err(ScenarError::config("heuristic id must not be empty"));
            }
            if definition.id.contains(char::is_whitespace) {
                return Err(ScenarError::config(format!(
                    "heuristic id '{}' must not contain whitespace",
                    definition.id
                )));
            }
            if index.contains_key(&definition.id) {
                return Err(ScenarError::config(format!(
                    "duplicate heuristic id '{}'",
                    definition.id
                )));
            }
            index.insert(definition.id.clone(), normalized.len());
            normalized.push(definition);
        }

        Ok(Self {
            definitions: normalized,
            index,
        })
    }

    /// Looks up a definition by id.
    pub fn lookup(&self, id: &str) -> Result<&HeuristicDefinition> {
        self.index
            .get(id)
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| ScenarError::unknown_heuristic(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// `(id, description)` pairs in catalog order, for classification prompts.
    pub fn all(&self) -> Vec<(&str, &str)> {
        self.definitions
            .iter()
            .map(|d| (d.id.as_str(), d.description.as_str()))
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.id.as_str())
    }

    pub fn definitions(&self) -> &[HeuristicDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// The catalog shipped with the engine, used when no heuristics file exists.
    pub fn builtin() -> Self {
        let definitions = vec![
            HeuristicDefinition::new(
                "negotiation",
                "Strategy heuristic for diplomatic discussions, deal-making and conflict resolution",
                NEGOTIATION_PROMPT,
            )
            .with_name("Negotiation")
            .with_rules(negotiation_rules()),
            HeuristicDefinition::new(
                "kidnapping",
                "Crisis response heuristic for hostage and kidnapping situations",
                KIDNAPPING_PROMPT,
            )
            .with_name("Kidnapping & Hostage Crisis"),
            HeuristicDefinition::new(
                "geopolitics",
                "Analysis heuristic for international relations and political dynamics",
                GEOPOLITICS_PROMPT,
            )
            .with_name("Geopolitics"),
        ];

        // Ids above are unique, lowercase and non-empty.
        Self::new(definitions).unwrap_or_default()
    }
}

const NEGOTIATION_PROMPT: &str = "Calculate the optimum strategy for the negotiator(s) to reach their goal. \
Work through four steps. **1** Generate as many plausible options as possible that meet the goal, \
respect the specific parameters of the request and satisfy the 'must do' rules. \
**2** Check each option against the conditions of the simulated world and discard any that are \
impossible for economic, political, regulatory or environmental reasons. \
**3** Discard any option that breaches a 'must not do' rule. \
**4** Return the optimum option and explain why it beats the alternatives. \
Show the reasoning at each step as a clear, readable narrative.";

const KIDNAPPING_PROMPT: &str = "Act as a crisis response adviser for a hostage or kidnapping situation. \
Establish who is held, by whom, where and under what demands. Prioritise the safety of the hostages over \
every other outcome, separate verified facts from assumptions, and lay out communication, negotiation and \
escalation options with their risks. Finish with a recommended course of action and the signals that would \
change it.";

const GEOPOLITICS_PROMPT: &str = "Analyse the scenario as a problem of international relations. \
Describe the current state of relationships, the intent and motivation of every party, the economic \
factors and the strategic implications, and note where the scenario departs from the present global \
context. Project the most likely developments with stated confidence and the indicators to watch.";

fn negotiation_rules() -> RuleSet {
    RuleSet {
        must_do: [
            "You must prioritize agreements that create the highest combined value for all parties while safeguarding your critical interests.",
            "You must seek to understand the other party's goals, constraints, and motivations through active listening and targeted questioning.",
            "You must ensure all agreements are fair and transparent, reflecting honesty and mutual respect.",
            "You must explore alternative solutions that align with stated outcomes while respecting defined limits.",
            "You must use relevant data, historical precedents, and modeled scenarios to support your arguments and predict outcomes.",
            "You must favor agreements that strengthen long-term relationships, even if they require short-term concessions.",
            "You must ensure all agreements are explicitly defined, leaving no room for misinterpretation or ambiguity.",
            "You must make concessions proportional to the value gained and ensure they advance progress toward stated outcomes.",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        must_not_do: [
            "You must not misrepresent information, make offers that exploit vulnerabilities unfairly, or use coercion.",
            "You must not prioritize short-term wins at the expense of long-term sustainability or critical interests.",
            "You must not dismiss or ignore the other party's stated priorities, concerns, or constraints.",
            "You must not concede on non-negotiable points or compromise core priorities to reach an agreement.",
            "You must not enter negotiations without thorough preparation, relying instead on assumptions or incomplete data.",
            "You must not damage long-term relationships for the sake of immediate gains or unilateral advantage.",
            "You must not accept or propose agreements with vague terms or undefined conditions.",
            "You must not make disproportionate concessions that undermine your negotiation position or stated outcomes.",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_contents() {
        let catalog = HeuristicCatalog::builtin();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.ids().collect::<Vec<_>>(),
            vec!["negotiation", "kidnapping", "geopolitics"]
        );

        let negotiation = catalog.lookup("negotiation").unwrap();
        let rules = negotiation.rules.as_ref().unwrap();
        assert_eq!(rules.must_do.len(), 8);
        assert_eq!(rules.must_not_do.len(), 8);
        assert!(negotiation.reasoning_prompt().contains("Must not do:"));
    }

    #[test]
    fn test_lookup_missing_is_unknown_heuristic() {
        let catalog = HeuristicCatalog::builtin();
        let err = catalog.lookup("chess").unwrap_err();
        assert!(matches!(err, ScenarError::UnknownHeuristic { ref id } if id == "chess"));
    }

    #[test]
    fn test_new_rejects_duplicates_after_case_folding() {
        let result = HeuristicCatalog::new(vec![
            HeuristicDefinition::new("trade", "a", "p"),
            HeuristicDefinition {
                id: "TRADE".into(),
                name: String::new(),
                description: "b".into(),
                prompt: "p".into(),
                rules: None,
            },
        ]);
        assert!(matches!(result, Err(ScenarError::Config(_))));
    }

    #[test]
    fn test_new_rejects_empty_and_whitespace_ids() {
        assert!(HeuristicCatalog::new(vec![HeuristicDefinition::new("  ", "a", "p")]).is_err());
        assert!(HeuristicCatalog::new(vec![HeuristicDefinition::new("two words", "a", "p")]).is_err());
    }

    #[test]
    fn test_all_preserves_order() {
        let catalog = HeuristicCatalog::new(vec![
            HeuristicDefinition::new("zeta", "last letter", "p"),
            HeuristicDefinition::new("alpha", "first letter", "p"),
        ])
        .unwrap();
        assert_eq!(
            catalog.all(),
            vec![("zeta", "last letter"), ("alpha", "first letter")]
        );
    }
}
