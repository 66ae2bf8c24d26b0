//! Subscriber setup shared by the binaries.

use crate::tracing_layer::{PipelineEvent, PipelineEventLayer};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Checked before `RUST_LOG`.
pub const LOG_ENV: &str = "SCENAR_LOG";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Filter used when neither environment variable is set; `info` if unset.
    pub default_level: Option<String>,
    /// One JSON object per line instead of the human-readable format.
    pub json: bool,
    /// Forward `scenar::pipeline` events to the returned receiver.
    pub pipeline_events: bool,
}

/// Installs the global subscriber. Log lines go to stderr so they never mix
/// with REPL output.
///
/// Returns the pipeline event receiver when `pipeline_events` is set. A
/// second call (a subscriber already installed) is a no-op.
pub fn init(options: LogOptions) -> Option<mpsc::UnboundedReceiver<PipelineEvent>> {
    let filter = build_filter(options.default_level.as_deref());
    let (layer, receiver) = if options.pipeline_events {
        let (layer, receiver) = PipelineEventLayer::channel();
        (Some(layer), Some(receiver))
    } else {
        (None, None)
    };

    let registry = tracing_subscriber::registry().with(filter).with(layer);
    let result = if options.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }

    receiver
}

/// `SCENAR_LOG`, then `RUST_LOG`, then `default_level`, then `info`.
pub fn build_filter(default_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default_level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
