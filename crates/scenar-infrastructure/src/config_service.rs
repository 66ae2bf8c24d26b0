//! Loads the engine configuration from `config.toml`.

use crate::storage::AtomicTomlFile;
use scenar_core::config::EngineConfig;
use scenar_core::error::Result;
use std::path::{Path, PathBuf};

pub struct ConfigService {
    file: AtomicTomlFile<EngineConfig>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the configuration; a missing or blank file yields the defaults.
    pub fn load(&self) -> Result<EngineConfig> {
        match self.file.load()? {
            Some(config) => {
                tracing::debug!(path = %self.path().display(), "Loaded engine configuration");
                Ok(config)
            }
            None => {
                tracing::debug!(
                    path = %self.path().display(),
                    "No configuration file, using defaults"
                );
                Ok(EngineConfig::default())
            }
        }
    }

    /// Writes `config`, replacing the file atomically.
    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        self.file.save(config)?;
        Ok(())
    }
}
