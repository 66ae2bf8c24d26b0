//! Shared, reloadable heuristic catalog.

use scenar_core::error::Result;
use scenar_core::heuristic::{HeuristicCatalog, HeuristicRepository};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Hands out catalog snapshots and swaps them on reload.
///
/// Work that already holds a snapshot keeps using it; only later calls to
/// [`CatalogService::snapshot`] see a reloaded catalog.
pub struct CatalogService {
    repository: Arc<dyn HeuristicRepository>,
    current: RwLock<Arc<HeuristicCatalog>>,
}

impl CatalogService {
    /// Loads the initial catalog from `repository`.
    pub async fn load(repository: Arc<dyn HeuristicRepository>) -> Result<Self> {
        let catalog = Self::read(repository.as_ref()).await?;
        Ok(Self {
            repository,
            current: RwLock::new(Arc::new(catalog)),
        })
    }

    pub async fn snapshot(&self) -> Arc<HeuristicCatalog> {
        self.current.read().await.clone()
    }

    /// Re-reads the repository and replaces the snapshot.
    ///
    /// On error the previous catalog stays in place.
    pub async fn reload(&self) -> Result<Arc<HeuristicCatalog>> {
        let catalog = Arc::new(Self::read(self.repository.as_ref()).await?);
        *self.current.write().await = catalog.clone();
        tracing::info!(heuristics = catalog.len(), "Heuristic catalog reloaded");
        Ok(catalog)
    }

    async fn read(repository: &dyn HeuristicRepository) -> Result<HeuristicCatalog> {
        let definitions = repository.load_all().await?;
        if definitions.is_empty() {
            tracing::debug!("No heuristics configured, using builtin catalog");
            return Ok(HeuristicCatalog::builtin());
        }
        HeuristicCatalog::new(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenar_core::heuristic::HeuristicDefinition;
    use std::sync::Mutex;

    struct MemoryRepository(Mutex<Vec<HeuristicDefinition>>);

    #[async_trait::async_trait]
    impl HeuristicRepository for MemoryRepository {
        async fn load_all(&self) -> Result<Vec<HeuristicDefinition>> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn save_all(&self, definitions: &[HeuristicDefinition]) -> Result<()> {
            *self.0.lock().unwrap() = definitions.to_vec();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_empty_repository_uses_builtin() {
        let service = CatalogService::load(Arc::new(MemoryRepository(Mutex::new(vec![]))))
            .await
            .unwrap();
        assert_eq!(service.snapshot().await.len(), HeuristicCatalog::builtin().len());
    }

    #[tokio::test]
    async fn test_reload_swaps_snapshot() {
        let repository = Arc::new(MemoryRepository(Mutex::new(vec![])));
        let service = CatalogService::load(repository.clone()).await.unwrap();
        let before = service.snapshot().await;

        repository
            .save_all(&[HeuristicDefinition::new("trade", "Tariff disputes", "Model the trade flows.")])
            .await
            .unwrap();
        service.reload().await.unwrap();

        let after = service.snapshot().await;
        assert_eq!(after.ids().collect::<Vec<_>>(), vec!["trade"]);
        assert!(before.contains("negotiation"));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_catalog() {
        let repository = Arc::new(MemoryRepository(Mutex::new(vec![])));
        let service = CatalogService::load(repository.clone()).await.unwrap();

        repository
            .save_all(&[
                HeuristicDefinition::new("trade", "a", "p"),
                HeuristicDefinition::new("trade", "b", "q"),
            ])
            .await
            .unwrap();
        assert!(service.reload().await.is_err());
        assert!(service.snapshot().await.contains("negotiation"));
    }
}
