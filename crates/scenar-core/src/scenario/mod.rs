//! Scenario domain module.
//!
//! - `model`: `ParsedScenario`, its validation and typed parameter accessors
//! - `display`: the confirmation summary text
//! - `decision`: `RoutingDecision`, the bundle handed to the caller

pub mod display;
mod decision;
mod model;

pub use decision::RoutingDecision;
pub use model::{
    AnalysisDepth, NONE_SPECIFIED, ParsedScenario, REQUIRED_FIELDS, ScenarioValidationError,
};
