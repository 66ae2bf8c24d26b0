//! The oracle capability.
//!
//! The oracle is the external language model: given a system directive and an
//! ordered message history it returns text. It usually, but not always,
//! honours instructions to answer in JSON. Replies are classified exactly once,
//! at the I/O boundary, into an [`OracleReply`].

use crate::conversation::{ConversationMessage, MessageRole};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// One entry of the history sent to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleMessage {
    pub role: MessageRole,
    pub content: String,
}

impl OracleMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationMessage> for OracleMessage {
    fn from(message: &ConversationMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Failure of a single oracle round-trip.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OracleError {
    /// Transport failure or server-side error.
    #[error("oracle unavailable: {message}")]
    Unavailable { message: String, retryable: bool },

    /// The call did not complete within the configured limit.
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),

    /// Rate limit or quota exhausted.
    #[error("oracle quota exceeded: {message}")]
    Quota {
        message: String,
        retry_after: Option<Duration>,
    },

    /// The backend refused the request (bad request, auth, unknown model).
    #[error("oracle rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered successfully but without any text.
    #[error("oracle returned an empty response")]
    EmptyResponse,

    /// The owning session was torn down while the call was in flight.
    #[error("oracle call cancelled")]
    Cancelled,

    /// The backend could not be constructed (missing key, bad URL).
    #[error("oracle configuration error: {0}")]
    Configuration(String),
}

impl OracleError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            retryable: true,
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { retryable, .. } => *retryable,
            Self::Timeout(_) | Self::Quota { .. } => true,
            Self::Rejected { .. }
            | Self::EmptyResponse
            | Self::Cancelled
            | Self::Configuration(_) => false,
        }
    }

    /// Server-suggested delay before retrying, when known.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Quota { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// The text-completion capability every backend provides.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    /// Sends `system` plus `messages` (oldest first) and returns the reply text.
    async fn complete(
        &self,
        system: &str,
        messages: &[OracleMessage],
    ) -> Result<String, OracleError>;

    /// Short backend label for logs.
    fn name(&self) -> &str {
        "oracle"
    }
}

#[async_trait::async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn complete(
        &self,
        system: &str,
        messages: &[OracleMessage],
    ) -> Result<String, OracleError> {
        (**self).complete(system, messages).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// The outcome of an oracle call, determined once.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    /// The reply contained a JSON object.
    Structured(Map<String, Value>),
    /// The reply was text that did not yield a JSON object; `reason` says why.
    RawText { text: String, reason: String },
    /// The call itself failed.
    Failure(OracleError),
}

impl OracleReply {
    pub fn from_outcome(outcome: Result<String, OracleError>) -> Self {
        match outcome {
            Ok(text) => Self::from_text(text),
            Err(err) => Self::Failure(err),
        }
    }

    /// Classifies reply text.
    ///
    /// The whole (trimmed) text is tried as JSON first; failing that, a JSON
    /// block is located inside surrounding prose or markdown fences.
    pub fn from_text(text: String) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::RawText {
                text,
                reason: "response was empty".to_string(),
            };
        }

        let direct_error = match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => return Self::Structured(map),
            Ok(other) => {
                let reason = format!("expected a JSON object, found {}", kind_of(&other));
                return Self::RawText { text, reason };
            }
            Err(e) => e.to_string(),
        };

        match llm_toolkit::extract_json(trimmed) {
            Ok(candidate) => match serde_json::from_str::<Value>(&candidate) {
                Ok(Value::Object(map)) => Self::Structured(map),
                Ok(other) => {
                    let reason = format!("expected a JSON object, found {}", kind_of(&other));
                    Self::RawText { text, reason }
                }
                Err(e) => Self::RawText {
                    text,
                    reason: e.to_string(),
                },
            },
            Err(_) => Self::RawText {
                text,
                reason: direct_error,
            },
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
