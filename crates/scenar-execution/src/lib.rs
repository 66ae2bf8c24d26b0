//! Process-level runtime support: logging setup and the pipeline event
//! stream used by the interactive front end.

pub mod logging;
pub mod tracing_layer;

pub use logging::{LogOptions, init};
pub use tracing_layer::{PIPELINE_TARGET, PipelineEvent, PipelineEventLayer};
