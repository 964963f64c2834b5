//! One-shot creation of the article write index

use crate::config::Config;
use crate::engine::SearchEngine;
use crate::error::{AppError, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const INDEX_SETTINGS: &str = include_str!("../resources/index_settings.json");
const ARTICLE_MAPPING: &str = include_str!("../resources/article_mapping.json");

/// Settings and article mapping sent when creating an index
pub fn index_definition() -> Result<Value> {
    let settings: Value = serde_json::from_str(INDEX_SETTINGS)?;
    let mappings: Value = serde_json::from_str(ARTICLE_MAPPING)?;
    Ok(json!({ "settings": settings, "mappings": mappings }))
}

/// Creates the article index on an engine
pub struct Provisioner<E: SearchEngine + ?Sized> {
    engine: Arc<E>,
}

impl<E: SearchEngine + ?Sized> Provisioner<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Provision the index named by configuration
    pub async fn provision_from_config(&self, config: &Config) -> Result<()> {
        let index = config
            .provision
            .write_index
            .as_deref()
            .or(config.elasticsearch.write_index.as_deref())
            .ok_or_else(|| {
                AppError::Configuration(
                    "A write index must be set to provision (provision.write_index or elasticsearch.write_index)"
                        .to_string(),
                )
            })?;
        self.provision(index, config.provision.drop_and_create).await
    }

    /// Create `index` with the article mapping.
    ///
    /// An existing index is an error unless `drop_and_create` is set, in which
    /// case it is deleted first.
    pub async fn provision(&self, index: &str, drop_and_create: bool) -> Result<()> {
        if self.engine.index_exists(index).await? {
            if !drop_and_create {
                return Err(AppError::Configuration(format!(
                    "Articles index {} already exists; enable provision.drop_and_create to recreate it",
                    index
                )));
            }
            info!(index = %index, "Articles index already exists, dropping index");
            self.engine.delete_index(index).await?;
        }

        self.engine.create_index(index, &index_definition()?).await?;
        info!(index = %index, "Successfully provisioned articles index");
        Ok(())
    }
}
