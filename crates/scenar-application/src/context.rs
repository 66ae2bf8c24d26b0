//! Wiring of the file-backed stack into a ready [`SimulationService`].

use crate::catalog_service::CatalogService;
use crate::simulation::SimulationService;
use scenar_core::config::EngineConfig;
use scenar_core::error::{Result, ScenarError};
use scenar_core::oracle::Oracle;
use scenar_core::session::SessionRepository;
use scenar_infrastructure::{
    ConfigService, ScenarPaths, TomlHeuristicRepository, TomlSessionRepository,
};
use scenar_interaction::build_oracle_from_storage;
use std::sync::Arc;

/// Everything loaded from disk at startup.
///
/// The oracle is built separately so commands that never call it (listing
/// heuristics or sessions) work without credentials.
pub struct AppContext {
    pub paths: ScenarPaths,
    pub config: EngineConfig,
    pub catalog: Arc<CatalogService>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl AppContext {
    /// Resolves paths from the environment and loads everything.
    pub async fn resolve() -> Result<Self> {
        let paths = ScenarPaths::resolve().map_err(|e| ScenarError::config(e.to_string()))?;
        Self::load(paths).await
    }

    pub async fn load(paths: ScenarPaths) -> Result<Self> {
        let config = ConfigService::new(paths.config_file()).load()?;
        let paths = paths.apply_settings(&config.storage);

        let catalog = CatalogService::load(Arc::new(TomlHeuristicRepository::new(
            paths.heuristics_file(),
        )))
        .await?;
        let sessions = TomlSessionRepository::new(paths.sessions_dir())?;

        tracing::debug!(
            config_dir = %paths.config_dir().display(),
            data_dir = %paths.data_dir().display(),
            "Application context loaded"
        );

        Ok(Self {
            paths,
            config,
            catalog: Arc::new(catalog),
            sessions: Arc::new(sessions),
        })
    }

    /// Builds the configured oracle from `secret.json` and the environment.
    pub fn oracle(&self) -> Result<Arc<dyn Oracle>> {
        Ok(build_oracle_from_storage(&self.config.oracle, &self.paths)?)
    }

    pub fn simulation_service(&self) -> Result<SimulationService> {
        Ok(self.simulation_service_with(self.oracle()?))
    }

    /// Same as [`AppContext::simulation_service`] over a caller-supplied oracle.
    pub fn simulation_service_with(&self, oracle: Arc<dyn Oracle>) -> SimulationService {
        SimulationService::new(
            oracle,
            self.config.clone(),
            self.catalog.clone(),
            self.sessions.clone(),
        )
    }
}
