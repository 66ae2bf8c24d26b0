//! Session repository trait.

use super::model::SimulationSession;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for simulation sessions.
///
/// Sessions must be retrievable by id so a simulation can resume after a
/// process restart.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// - `Ok(Some(session))`: session found
    /// - `Ok(None)`: no such session
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SimulationSession>>;

    /// Saves a session, replacing any stored version.
    async fn save(&self, session: &SimulationSession) -> Result<()>;

    /// Deletes a session. Deleting a missing session is not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists all stored sessions, most recently updated first.
    async fn list_all(&self) -> Result<Vec<SimulationSession>>;
}
