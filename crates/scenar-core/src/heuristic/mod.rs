//! Heuristic domain module.
//!
//! - `model`: `HeuristicDefinition` and its `RuleSet`
//! - `catalog`: the immutable `HeuristicCatalog`
//! - `shortcode`: `/<id>` detection
//! - `repository`: persistence trait for definitions

mod catalog;
mod model;
mod repository;
mod shortcode;

pub use catalog::HeuristicCatalog;
pub use model::{HeuristicDefinition, RuleSet};
pub use repository::HeuristicRepository;
pub use shortcode::{SHORTCODE_PREFIX, ShortcodeMatcher};
