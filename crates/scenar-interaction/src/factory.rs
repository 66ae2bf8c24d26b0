//! Builds the configured oracle stack.

use crate::claude_oracle::ClaudeApiOracle;
use crate::openai_oracle::OpenAiCompatOracle;
use crate::retry::RetryingOracle;
use crate::timeout::TimeoutOracle;
use scenar_core::config::{OracleBackend, OracleSettings, RetryPolicy, SecretConfig};
use scenar_core::oracle::{Oracle, OracleError};
use scenar_infrastructure::ScenarPaths;
use scenar_infrastructure::storage::SecretStorage;
use std::sync::Arc;

/// Creates the backend selected by `settings`, wrapped in its time limit.
///
/// `settings.model` and `settings.base_url` override the secret file.
pub fn build_oracle(
    settings: &OracleSettings,
    secrets: &SecretConfig,
) -> Result<Arc<dyn Oracle>, OracleError> {
    let timeout = settings.timeout();
    let oracle: Arc<dyn Oracle> = match settings.backend {
        OracleBackend::Claude => {
            let secret = secrets.claude.as_ref().ok_or_else(|| {
                OracleError::Configuration(
                    "no Claude credentials; add \"claude\" to secret.json or set ANTHROPIC_API_KEY"
                        .into(),
                )
            })?;
            let mut oracle =
                ClaudeApiOracle::from_secret(secret)?.with_max_tokens(settings.max_tokens);
            if let Some(model) = &settings.model {
                oracle = oracle.with_model(model.clone());
            }
            if let Some(base_url) = &settings.base_url {
                oracle = oracle.with_base_url(base_url.clone());
            }
            tracing::info!(backend = "claude", model = oracle.model(), "Oracle configured");
            Arc::new(TimeoutOracle::new(oracle, timeout))
        }
        OracleBackend::OpenAi => {
            let secret = secrets.openai.as_ref().ok_or_else(|| {
                OracleError::Configuration(
                    "no OpenAI credentials; add \"openai\" to secret.json or set OPENAI_API_KEY"
                        .into(),
                )
            })?;
            let mut oracle =
                OpenAiCompatOracle::from_secret(secret)?.with_max_tokens(settings.max_tokens);
            if let Some(model) = &settings.model {
                oracle = oracle.with_model(model.clone());
            }
            if let Some(base_url) = &settings.base_url {
                oracle = oracle.with_base_url(base_url.clone());
            }
            tracing::info!(
                backend = "openai",
                model = oracle.model(),
                base_url = oracle.base_url(),
                "Oracle configured"
            );
            Arc::new(TimeoutOracle::new(oracle, timeout))
        }
    };
    Ok(oracle)
}

/// Loads `secret.json` (with environment fallback) from `paths` and builds
/// the oracle.
pub fn build_oracle_from_storage(
    settings: &OracleSettings,
    paths: &ScenarPaths,
) -> Result<Arc<dyn Oracle>, OracleError> {
    let secrets = SecretStorage::new(paths.secret_file())
        .load_with_env()
        .map_err(|e| OracleError::Configuration(e.to_string()))?;
    build_oracle(settings, &secrets)
}

/// Wraps `oracle` in transient retry when the policy allows any.
pub fn with_retry(oracle: Arc<dyn Oracle>, policy: RetryPolicy) -> Arc<dyn Oracle> {
    if policy.transient == 0 {
        oracle
    } else {
        Arc::new(RetryingOracle::new(oracle, policy))
    }
}
