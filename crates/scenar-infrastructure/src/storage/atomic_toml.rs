//! Atomic TOML file operations.
//!
//! Writes go to a temporary sibling file which is fsynced and renamed over
//! the target, under an exclusive lock file, so readers never observe a
//! partially written session or catalog.

use scenar_core::ScenarError;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during atomic TOML operations.
#[derive(Error, Debug)]
pub enum AtomicTomlError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Lock error on {path}: {message}")]
    Lock { path: PathBuf, message: String },
}

impl From<AtomicTomlError> for ScenarError {
    fn from(err: AtomicTomlError) -> Self {
        match err {
            AtomicTomlError::Io { path, source } => {
                ScenarError::io(format!("{}: {source}", path.display()))
            }
            AtomicTomlError::Parse { path, source } => ScenarError::Serialization {
                format: "TOML".to_string(),
                message: format!("{}: {source}", path.display()),
            },
            AtomicTomlError::Serialize(source) => source.into(),
            AtomicTomlError::Lock { path, message } => {
                ScenarError::io(format!("{}: {message}", path.display()))
            }
        }
    }
}

/// A handle to a TOML file with atomic replace semantics.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// - `Ok(Some(T))`: loaded
    /// - `Ok(None)`: file missing or blank
    pub fn load(&self) -> Result<Option<T>, AtomicTomlError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        toml::from_str(&content)
            .map(Some)
            .map_err(|source| AtomicTomlError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Serializes `data` and atomically replaces the file.
    pub fn save(&self, data: &T) -> Result<(), AtomicTomlError> {
        let toml_string = toml::to_string_pretty(data)?;

        let _lock = FileLock::acquire(&self.path)?;

        let tmp_path = self.temp_path();
        let mut tmp_file = File::create(&tmp_path).map_err(|e| self.io_error(e))?;
        tmp_file
            .write_all(toml_string.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp_file.sync_all().map_err(|e| self.io_error(e))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Removes the file. A missing file is not an error.
    pub fn remove(&self) -> Result<(), AtomicTomlError> {
        let _lock = FileLock::acquire(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }

    fn io_error(&self, source: std::io::Error) -> AtomicTomlError {
        AtomicTomlError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Exclusive lock guard; released (and the lock file removed) on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicTomlError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|source| AtomicTomlError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| AtomicTomlError::Io {
                path: lock_path.clone(),
                source,
            })?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| AtomicTomlError::Lock {
                path: lock_path.clone(),
                message: format!("Failed to acquire lock: {e}"),
            })?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
