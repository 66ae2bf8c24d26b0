//! Error types for the Scenar engine.

use crate::oracle::OracleError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Scenar engine.
///
/// Routing and conversation failures carry enough structure for the caller
/// to decide between re-prompting the user, retrying later, or giving up.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ScenarError {
    /// A heuristic id that is not present in the catalog.
    #[error("Unknown heuristic: '{id}'")]
    UnknownHeuristic { id: String },

    /// Neither a shortcode nor a confident classification selected a heuristic.
    #[error("Could not match scenario to any available heuristic")]
    NoHeuristicMatched,

    /// The oracle never produced a usable structured scenario.
    #[error("Scenario extraction failed after {attempts} attempt(s): {reason}")]
    ExtractionFailed { attempts: u32, reason: String },

    /// The oracle call itself failed (transport, timeout, quota, cancellation).
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// An operation was invoked against a session or conversation in the wrong phase.
    #[error("Invalid state for {operation}: expected {expected}, found {actual}")]
    InvalidState {
        operation: &'static str,
        expected: String,
        actual: String,
    },

    /// The simulation reply violated the structured reply contract.
    #[error("Malformed simulation reply after {attempts} attempt(s): {reason}")]
    MalformedReply { attempts: u32, reason: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScenarError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn unknown_heuristic(id: impl Into<String>) -> Self {
        Self::UnknownHeuristic { id: id.into() }
    }

    pub fn extraction_failed(attempts: u32, reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            attempts,
            reason: reason.into(),
        }
    }

    pub fn invalid_state(
        operation: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            operation,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from the oracle
    pub fn is_oracle(&self) -> bool {
        matches!(self, Self::Oracle(_))
    }

    /// True when the user should be shown their original input again for editing.
    ///
    /// Both variants mean the text itself could not be turned into a scenario;
    /// nothing about the session changed.
    pub fn is_retryable_input(&self) -> bool {
        matches!(
            self,
            Self::NoHeuristicMatched | Self::ExtractionFailed { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ScenarError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ScenarError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ScenarError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ScenarError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for ScenarError {
    fn from(err: minijinja::Error) -> Self {
        Self::Internal(format!("prompt template: {err}"))
    }
}

/// A type alias for `Result<T, ScenarError>`.
pub type Result<T> = std::result::Result<T, ScenarError>;
