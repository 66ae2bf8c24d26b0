//! Unified path management for scenar files.
//!
//! ```text
//! ~/.config/scenar/            # Config directory ($SCENAR_CONFIG_DIR)
//! ├── config.toml              # Engine configuration
//! ├── heuristics.toml          # Heuristic catalog ([[heuristic]] tables)
//! └── secret.json              # API keys
//!
//! ~/.local/share/scenar/       # Data directory ($SCENAR_DATA_DIR, [storage] data_dir)
//! └── sessions/                # One <id>.toml per simulation session
//! ```

use scenar_core::config::StorageSettings;
use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "scenar";
pub const CONFIG_DIR_ENV: &str = "SCENAR_CONFIG_DIR";
pub const DATA_DIR_ENV: &str = "SCENAR_DATA_DIR";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// No platform config or data directory could be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolved config and data directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ScenarPaths {
    /// Resolves directories from the environment, then the platform defaults.
    pub fn resolve() -> Result<Self, PathError> {
        let config_dir = match env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or(PathError::HomeDirNotFound)?
                .join(APP_DIR),
        };
        let data_dir = match env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .ok_or(PathError::HomeDirNotFound)?
                .join(APP_DIR),
        };
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Uses explicit directories (tests, embedding).
    pub fn with_dirs(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Applies `[storage]` overrides from the loaded configuration.
    ///
    /// The environment variable still wins over the config file.
    pub fn apply_settings(mut self, storage: &StorageSettings) -> Self {
        if env::var_os(DATA_DIR_ENV).is_none() {
            if let Some(dir) = &storage.data_dir {
                self.data_dir = dir.clone();
            }
        }
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn heuristics_file(&self) -> PathBuf {
        self.config_dir.join("heuristics.toml")
    }

    /// Path to secret.json. Keep it readable by the owner only.
    pub fn secret_file(&self) -> PathBuf {
        self.config_dir.join("secret.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}
