//! Article datastore contract and its implementations
//!
//! [`ArticleStore`] is the narrow CRUD surface application code talks to.
//! [`EngineArticleStore`] forwards to a [`crate::engine::SearchEngine`];
//! [`InMemoryArticleStore`] evaluates the same queries in-process.

pub mod engine_store;
pub mod factory;
pub mod memory;

pub use engine_store::EngineArticleStore;
pub use factory::{connect_store, create_in_memory_store, create_store};
pub use memory::InMemoryArticleStore;

use crate::config::ElasticsearchConfig;
use crate::engine::RawHit;
use crate::error::{AppError, Result};
use crate::models::{Article, ArticleHit};
use crate::search::SearchQuery;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Trait for article storage operations
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Run a structured search over the search indices
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ArticleHit>>;

    /// Run a raw engine query string over the search indices
    async fn search_query_string(&self, query: &str) -> Result<Vec<ArticleHit>>;

    /// Upsert one article into the write index, keyed by its URL
    async fn index(&self, article: &Article) -> Result<()>;

    /// Upsert a batch of articles in one round trip
    ///
    /// Item failures do not fail the call; they are listed in the report.
    async fn index_all(&self, articles: &[Article]) -> Result<BulkReport>;

    /// Remove an article from the write index; a missing id is not an error
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Indices a store writes to and searches over, fixed at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreTargets {
    write_index: Option<String>,
    search_indices: Vec<String>,
}

impl StoreTargets {
    /// Blank names are treated as unset
    pub fn new<I, S>(write_index: Option<String>, search_indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            write_index: write_index.filter(|name| !name.trim().is_empty()),
            search_indices: search_indices
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.trim().is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ElasticsearchConfig) -> Self {
        Self::new(config.write_index.clone(), config.search_indices.clone())
    }

    pub fn write_index(&self) -> Option<&str> {
        self.write_index.as_deref()
    }

    pub fn search_indices(&self) -> &[String] {
        &self.search_indices
    }

    pub(crate) fn require_write_index(&self, operation: &str) -> Result<&str> {
        self.write_index().ok_or_else(|| {
            AppError::Configuration(format!("write index must be set to {}", operation))
        })
    }

    pub(crate) fn require_search_indices(&self) -> Result<&[String]> {
        if self.search_indices.is_empty() {
            return Err(AppError::Configuration(
                "search indices must be set to search".to_string(),
            ));
        }
        Ok(&self.search_indices)
    }
}

/// Outcome of [`ArticleStore::index_all`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkReport {
    /// Articles submitted
    pub total: usize,
    /// Items that were not written, in submission order
    pub failures: Vec<BulkFailure>,
}

impl BulkReport {
    pub fn succeeded(&self) -> usize {
        self.total - self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// One line per failed item, `None` when everything was written
    pub fn failure_message(&self) -> Option<String> {
        if !self.has_failures() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(|f| format!("[{}]: {}", f.id, f.reason))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    /// Position of the article in the submitted batch
    pub position: usize,
    pub id: String,
    pub reason: String,
}

/// Documents ready for a bulk write, keyed by batch position
pub(crate) struct PreparedBatch {
    pub documents: Vec<(usize, String, Value)>,
    pub failures: Vec<BulkFailure>,
}

/// Serialize a batch, rejecting articles that cannot be written
pub(crate) fn prepare_bulk(articles: &[Article]) -> PreparedBatch {
    let mut documents = Vec::with_capacity(articles.len());
    let mut failures = Vec::new();

    for (position, article) in articles.iter().enumerate() {
        if article.url.trim().is_empty() {
            failures.push(BulkFailure {
                position,
                id: article.url.clone(),
                reason: "article URL is empty".to_string(),
            });
            continue;
        }
        match article.to_document() {
            Ok(document) => documents.push((position, article.url.clone(), document)),
            Err(e) => failures.push(BulkFailure {
                position,
                id: article.url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    PreparedBatch {
        documents,
        failures,
    }
}

pub(crate) fn require_url(article: &Article) -> Result<&str> {
    if article.url.trim().is_empty() {
        return Err(AppError::Validation(
            "article URL must be set to index".to_string(),
        ));
    }
    Ok(&article.url)
}

/// Map raw hits to articles in engine order, dropping undeserializable sources
pub(crate) fn to_hits(raw: Vec<RawHit>) -> Vec<ArticleHit> {
    raw.into_iter()
        .filter_map(|hit| {
            let id = hit.id;
            match ArticleHit::from_source(id.clone(), hit.score, hit.source) {
                Ok(article) => Some(article),
                Err(e) => {
                    tracing::debug!(id = %id, error = %e, "Dropping hit that is not an article");
                    None
                }
            }
        })
        .collect()
}
