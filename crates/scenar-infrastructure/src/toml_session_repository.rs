//! TOML-based SessionRepository implementation

use crate::dto::SessionRecord;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use scenar_core::error::{Result, ScenarError};
use scenar_core::session::{SessionRepository, SimulationSession};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each session as its own TOML file.
///
/// ```text
/// sessions_dir/
/// ├── 5f0c...e1.toml
/// └── 9a7b...42.toml
/// ```
pub struct TomlSessionRepository {
    sessions_dir: PathBuf,
}

impl TomlSessionRepository {
    /// Creates the repository, creating `sessions_dir` if needed.
    pub fn new(sessions_dir: impl AsRef<Path>) -> Result<Self> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        fs::create_dir_all(&sessions_dir).map_err(|e| {
            ScenarError::io(format!(
                "Failed to create sessions directory {}: {e}",
                sessions_dir.display()
            ))
        })?;
        Ok(Self { sessions_dir })
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn session_file(&self, session_id: &str) -> Result<AtomicTomlFile<SessionRecord>> {
        validate_session_id(session_id)?;
        Ok(AtomicTomlFile::new(
            self.sessions_dir.join(format!("{session_id}.toml")),
        ))
    }
}

/// Session ids become file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ScenarError::config(format!(
            "invalid session id '{session_id}': use letters, digits, '-' or '_'"
        )))
    }
}

#[async_trait]
impl SessionRepository for TomlSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SimulationSession>> {
        match self.session_file(session_id)?.load()? {
            Some(record) => Ok(Some(record.into_domain()?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &SimulationSession) -> Result<()> {
        let file = self.session_file(&session.id)?;
        let record = SessionRecord::from_domain(session)?;
        file.save(&record)?;
        tracing::debug!(
            session_id = %session.id,
            phase = %session.phase,
            turns = record.turns.len(),
            "Saved session"
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.session_file(session_id)?.remove()?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SimulationSession>> {
        let entries = fs::read_dir(&self.sessions_dir).map_err(|e| {
            ScenarError::io(format!(
                "Failed to read sessions directory {}: {e}",
                self.sessions_dir.display()
            ))
        })?;

        let mut sessions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }

            let loaded = AtomicTomlFile::<SessionRecord>::new(path.clone())
                .load()
                .map_err(ScenarError::from)
                .and_then(|record| record.map(SessionRecord::into_domain).transpose());
            match loaded {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                }
            }
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }
}
