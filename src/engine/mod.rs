//! Search-engine RPC boundary
//!
//! [`SearchEngine`] names the logical requests the stores issue: single upsert,
//! bulk upsert, delete, search and index administration. [`HttpEngine`]
//! implements them against an Elasticsearch-compatible REST API.

mod http;

pub use http::{normalize_endpoint, EndpointOutcome, EndpointStatus, HttpEngine, DEFAULT_PORT};

use crate::error::Result;
use crate::search::EngineQuery;
use async_trait::async_trait;
use serde_json::Value;

/// A search result as returned by the engine, before mapping to a domain type
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub id: String,
    pub score: f32,
    pub source: Value,
}

/// Outcome of one item of a bulk write
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    pub id: String,
    /// Failure reason, `None` when the item was written
    pub error: Option<String>,
}

impl BulkItemResult {
    pub fn written(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: Some(reason.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Trait for search-engine clients
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Upsert one document under `id`
    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<()>;

    /// Upsert many documents in one round trip, returning one result per
    /// document in request order
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[(String, Value)],
    ) -> Result<Vec<BulkItemResult>>;

    /// Remove a document; a missing document is not an error
    async fn delete_document(&self, index: &str, id: &str) -> Result<()>;

    /// Run a search over one or more indices, hits in engine order
    async fn search(&self, indices: &[String], request: &EngineQuery) -> Result<Vec<RawHit>>;

    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create an index from a settings + mappings body
    async fn create_index(&self, index: &str, definition: &Value) -> Result<()>;

    async fn delete_index(&self, index: &str) -> Result<()>;
}
