//! TOML-based HeuristicRepository implementation.
//!
//! ```toml
//! [[heuristic]]
//! id = "negotiation"
//! name = "Negotiation"
//! description = "Strategy heuristic for diplomatic discussions"
//! prompt = "Calculate the optimum strategy..."
//!
//! [heuristic.rules]
//! must_do = ["..."]
//! must_not_do = ["..."]
//! ```

use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use scenar_core::error::Result;
use scenar_core::heuristic::{HeuristicDefinition, HeuristicRepository};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
struct HeuristicsFile {
    #[serde(rename = "heuristic", default)]
    heuristics: Vec<HeuristicDefinition>,
}

/// Stores the heuristic catalog in a single `heuristics.toml`.
pub struct TomlHeuristicRepository {
    file: AtomicTomlFile<HeuristicsFile>,
}

impl TomlHeuristicRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }
}

#[async_trait]
impl HeuristicRepository for TomlHeuristicRepository {
    async fn load_all(&self) -> Result<Vec<HeuristicDefinition>> {
        let definitions = self
            .file
            .load()?
            .map(|file| file.heuristics)
            .unwrap_or_default();
        tracing::debug!(
            path = %self.file.path().display(),
            count = definitions.len(),
            "Loaded heuristic definitions"
        );
        Ok(definitions)
    }

    async fn save_all(&self, definitions: &[HeuristicDefinition]) -> Result<()> {
        self.file.save(&HeuristicsFile {
            heuristics: definitions.to_vec(),
        })?;
        Ok(())
    }
}
