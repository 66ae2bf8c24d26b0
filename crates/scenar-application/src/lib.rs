//! Application layer for SCENAR.
//!
//! Routing (shortcode, classifier, extractor), the simulation dialogue, and
//! the per-session use case that ties them to storage.

pub mod catalog_service;
pub mod classifier;
pub mod context;
pub mod conversation;
pub mod extractor;
pub mod prompts;
pub mod router;
pub mod simulation;

#[cfg(test)]
mod test_support;

pub use catalog_service::CatalogService;
pub use classifier::{HeuristicClassifier, HeuristicMatch};
pub use context::AppContext;
pub use conversation::{ConversationEngine, SimulationReply};
pub use extractor::ScenarioExtractor;
pub use router::{RouteSource, ScenarioRouter};
pub use simulation::{MessageOutcome, SimulationService};
