//! Secret configuration file storage.
//!
//! Loads API credentials from `secret.json`, filling providers the file does
//! not configure from environment variables.

use scenar_core::config::{ClaudeSecret, OpenAiSecret, SecretConfig};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const CLAUDE_MODEL_NAME: &str = "CLAUDE_MODEL_NAME";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL_NAME: &str = "OPENAI_MODEL_NAME";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Errors that can occur during secret storage operations.
#[derive(Error, Debug)]
pub enum SecretStorageError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only access to `secret.json`.
///
/// Does not validate keys, and never writes the file. The file should be
/// readable by its owner only.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file; a missing file yields an empty configuration.
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SecretConfig::default());
            }
            Err(source) => {
                return Err(SecretStorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| SecretStorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads the file, then fills unconfigured providers from the process
    /// environment.
    pub fn load_with_env(&self) -> Result<SecretConfig, SecretStorageError> {
        let config = self.load()?;
        Ok(apply_env_fallback(config, |key| std::env::var(key).ok()))
    }
}

/// Fills providers missing from `config` using `lookup`.
///
/// The file always wins. For the OpenAI-compatible provider an
/// `OPENAI_API_KEY` is preferred; a lone `GROQ_API_KEY` selects Groq's
/// endpoint.
pub fn apply_env_fallback(
    mut config: SecretConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> SecretConfig {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if config.claude.is_none() {
        if let Some(api_key) = non_empty(ANTHROPIC_API_KEY) {
            config.claude = Some(ClaudeSecret {
                api_key,
                model_name: non_empty(CLAUDE_MODEL_NAME),
            });
        }
    }

    if config.openai.is_none() {
        if let Some(api_key) = non_empty(OPENAI_API_KEY) {
            config.openai = Some(OpenAiSecret {
                api_key,
                model_name: non_empty(OPENAI_MODEL_NAME),
                base_url: non_empty(OPENAI_BASE_URL),
            });
        } else if let Some(api_key) = non_empty(GROQ_API_KEY) {
            config.openai = Some(OpenAiSecret {
                api_key,
                model_name: non_empty(OPENAI_MODEL_NAME),
                base_url: Some(GROQ_BASE_URL.to_string()),
            });
        }
    }

    config
}
