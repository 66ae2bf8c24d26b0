//! Engine configuration.
//!
//! Every section has serde defaults, so an empty or partial `config.toml`
//! yields a working configuration.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub oracle: OracleSettings,
    pub classifier: ClassifierSettings,
    pub retry: RetrySettings,
    pub conversation: ConversationSettings,
    pub storage: StorageSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    #[default]
    Claude,
    /// Any OpenAI-compatible Chat Completions endpoint (OpenAI, Groq, ...).
    OpenAi,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OracleSettings {
    pub backend: OracleBackend,
    /// Model name; the backend's default (or the secret file's) when unset.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Overrides the backend's base URL.
    pub base_url: Option<String>,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            backend: OracleBackend::Claude,
            model: None,
            max_tokens: 2000,
            timeout_secs: 120,
            base_url: None,
        }
    }
}

impl OracleSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Confidence must be strictly greater than this to accept a match.
    pub threshold: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self { threshold: 0.7 }
    }
}

/// Retry budget for one category of oracle interaction.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RetryPolicy {
    /// Re-prompts after a malformed (unparsable or off-contract) reply.
    pub structural: u32,
    /// Re-sends after a transient oracle failure (timeout, 5xx, quota).
    pub transient: u32,
    /// Base delay for transient retries; doubles each attempt.
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub const fn new(structural: u32, transient: u32, backoff_ms: u64) -> Self {
        Self {
            structural,
            transient,
            backoff_ms,
        }
    }

    /// Total attempts allowed for structural re-prompting.
    pub fn structural_attempts(&self) -> u32 {
        self.structural.saturating_add(1)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Per-category retry budgets. A partial `[retry.<category>]` table only
/// overrides the keys it names; the rest keep that category's defaults.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RetrySettings {
    pub classification: RetryPolicy,
    pub extraction: RetryPolicy,
    pub conversation: RetryPolicy,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            classification: RetryPolicy::new(0, 0, 500),
            extraction: RetryPolicy::new(2, 0, 500),
            conversation: RetryPolicy::new(2, 0, 500),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RetryOverrides {
    structural: Option<u32>,
    transient: Option<u32>,
    backoff_ms: Option<u64>,
}

impl RetryOverrides {
    fn apply(self, base: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            structural: self.structural.unwrap_or(base.structural),
            transient: self.transient.unwrap_or(base.transient),
            backoff_ms: self.backoff_ms.unwrap_or(base.backoff_ms),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RetrySettingsTable {
    classification: RetryOverrides,
    extraction: RetryOverrides,
    conversation: RetryOverrides,
}

impl<'de> Deserialize<'de> for RetrySettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let table = RetrySettingsTable::deserialize(deserializer)?;
        let defaults = Self::default();
        Ok(Self {
            classification: table.classification.apply(defaults.classification),
            extraction: table.extraction.apply(defaults.extraction),
            conversation: table.conversation.apply(defaults.conversation),
        })
    }
}

/// How the simulation reply is interpreted.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplyContract {
    /// A JSON object `{narrative, state_update, available_actions}`.
    #[default]
    Json,
    /// Any text, taken as the narrative.
    FreeText,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ConversationSettings {
    /// Turn pairs replayed to the oracle; unbounded when unset.
    pub max_turns_retained: Option<usize>,
    pub reply_contract: ReplyContract,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
}

/// API credentials, read from `secret.json`. Never logged.
#[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct SecretConfig {
    #[serde(default)]
    pub claude: Option<ClaudeSecret>,
    #[serde(default)]
    pub openai: Option<OpenAiSecret>,
}

impl std::fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretConfig")
            .field("claude", &self.claude.as_ref().map(|_| "<redacted>"))
            .field("openai", &self.openai.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ClaudeSecret {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct OpenAiSecret {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}
