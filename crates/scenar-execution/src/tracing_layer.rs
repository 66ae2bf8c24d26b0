//! Tracing layer that streams pipeline events to a channel.
//!
//! Only events whose target starts with one of the configured prefixes are
//! forwarded (by default `scenar::pipeline`), so a front end can show
//! routing and simulation progress without parsing log lines.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

pub const PIPELINE_TARGET: &str = "scenar::pipeline";

/// One forwarded event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineEvent {
    /// Event target (e.g., "scenar::pipeline")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    pub message: String,
    /// Structured fields from the event, `message` excluded
    pub fields: HashMap<String, Value>,
    pub timestamp: String,
}

impl PipelineEvent {
    /// The `stage` field, when the event carries one.
    pub fn stage(&self) -> Option<&str> {
        self.fields.get("stage").and_then(Value::as_str)
    }
}

pub struct PipelineEventLayer {
    sender: mpsc::UnboundedSender<PipelineEvent>,
    targets: Vec<String>,
}

impl PipelineEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        Self {
            sender,
            targets: vec![PIPELINE_TARGET.to_string()],
        }
    }

    /// Also forwards events under `prefix` (e.g. "scenar::oracle").
    pub fn with_target(mut self, prefix: impl Into<String>) -> Self {
        self.targets.push(prefix.into());
        self
    }

    /// A layer plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    fn wants(&self, target: &str) -> bool {
        self.targets.iter().any(|prefix| target.starts_with(prefix.as_str()))
    }
}

impl<S> Layer<S> for PipelineEventLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.wants(metadata.target()) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        let message = match fields.remove("message") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        // The receiver may be gone (REPL exiting); dropping the event is fine.
        let _ = self.sender.send(PipelineEvent {
            target: metadata.target().to_string(),
            level: metadata.level().to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }
}

/// Field visitor that extracts tracing event fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(format!("{value:?}")));
    }
}
