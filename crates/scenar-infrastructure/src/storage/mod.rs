//! Storage layer for atomic file operations and secrets.

mod atomic_toml;
mod secret_storage;

pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
pub use secret_storage::{
    ANTHROPIC_API_KEY, CLAUDE_MODEL_NAME, GROQ_API_KEY, OPENAI_API_KEY, OPENAI_BASE_URL,
    OPENAI_MODEL_NAME, SecretStorage, SecretStorageError, apply_env_fallback,
};
