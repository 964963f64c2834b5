use crate::config::{Config, StoreBackend};
use crate::engine::{EndpointStatus, HttpEngine};
use crate::error::Result;
use crate::store::{ArticleStore, EngineArticleStore, InMemoryArticleStore, StoreTargets};
use std::sync::Arc;

/// Create an article store based on configuration
///
/// Partial endpoint connectivity is only logged here; use [`connect_store`]
/// to inspect each endpoint's outcome.
pub async fn create_store(config: &Config) -> Result<Arc<dyn ArticleStore>> {
    let (store, _statuses) = connect_store(config).await?;
    Ok(store)
}

/// Create an article store and report how each configured endpoint fared
///
/// The in-memory backend probes nothing and reports no statuses.
pub async fn connect_store(
    config: &Config,
) -> Result<(Arc<dyn ArticleStore>, Vec<EndpointStatus>)> {
    let targets = StoreTargets::from_config(&config.elasticsearch);

    match config.store.backend {
        StoreBackend::Elasticsearch => {
            tracing::info!(
                write_index = ?targets.write_index(),
                search_indices = ?targets.search_indices(),
                "Initializing Elasticsearch article store"
            );

            let (engine, statuses) = HttpEngine::connect(&config.elasticsearch).await?;
            let connected = statuses.iter().filter(|s| s.is_connected()).count();
            if connected < statuses.len() {
                tracing::warn!(
                    connected,
                    configured = statuses.len(),
                    "Some search engine endpoints are unavailable"
                );
            }

            let store: Arc<dyn ArticleStore> =
                Arc::new(EngineArticleStore::new(Arc::new(engine), targets));
            Ok((store, statuses))
        }

        StoreBackend::InMemory => Ok((create_in_memory_store(targets), Vec::new())),
    }
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store(targets: StoreTargets) -> Arc<dyn ArticleStore> {
    tracing::info!("Initializing in-memory article store");
    Arc::new(InMemoryArticleStore::new(targets))
}
