//! Heuristic repository trait.

use super::model::HeuristicDefinition;
use crate::error::Result;

/// An abstract source of heuristic definitions.
///
/// Decouples the catalog from its storage (TOML file, database, remote
/// configuration service).
#[async_trait::async_trait]
pub trait HeuristicRepository: Send + Sync {
    /// Retrieves all definitions in their configured order.
    ///
    /// An empty result means "nothing configured"; callers fall back to the
    /// builtin catalog.
    async fn load_all(&self) -> Result<Vec<HeuristicDefinition>>;

    /// Replaces all stored definitions.
    async fn save_all(&self, definitions: &[HeuristicDefinition]) -> Result<()>;
}
