use crate::engine::SearchEngine;
use crate::error::Result;
use crate::models::{Article, ArticleHit};
use crate::search::{query_string, translate, SearchQuery};
use crate::store::{prepare_bulk, require_url, to_hits, ArticleStore, BulkFailure, BulkReport, StoreTargets};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Article store backed by a search engine client
pub struct EngineArticleStore<E: SearchEngine + ?Sized> {
    engine: Arc<E>,
    targets: StoreTargets,
}

impl<E: SearchEngine + ?Sized> EngineArticleStore<E> {
    pub fn new(engine: Arc<E>, targets: StoreTargets) -> Self {
        Self { engine, targets }
    }

    /// A store over the same engine with different targets
    pub fn with_targets(&self, targets: StoreTargets) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            targets,
        }
    }

    pub fn targets(&self) -> &StoreTargets {
        &self.targets
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }
}

#[async_trait]
impl<E: SearchEngine + ?Sized> ArticleStore for EngineArticleStore<E> {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ArticleHit>> {
        let indices = self.targets.require_search_indices()?;
        let request = translate(query)?;

        debug!(indices = ?indices, query = %query, "Searching articles");
        let raw = self.engine.search(indices, &request).await?;
        Ok(to_hits(raw))
    }

    async fn search_query_string(&self, query: &str) -> Result<Vec<ArticleHit>> {
        let indices = self.targets.require_search_indices()?;

        debug!(indices = ?indices, query = %query, "Searching articles by query string");
        let raw = self.engine.search(indices, &query_string(query)).await?;
        Ok(to_hits(raw))
    }

    async fn index(&self, article: &Article) -> Result<()> {
        let index = self.targets.require_write_index("index")?;
        let id = require_url(article)?;
        let document = article.to_document()?;

        self.engine.index_document(index, id, &document).await?;
        debug!(index = %index, id = %id, "Article indexed");
        Ok(())
    }

    async fn index_all(&self, articles: &[Article]) -> Result<BulkReport> {
        let index = self.targets.require_write_index("index")?;
        let batch = prepare_bulk(articles);
        let mut failures = batch.failures;

        if !batch.documents.is_empty() {
            let positions: Vec<usize> = batch.documents.iter().map(|(p, _, _)| *p).collect();
            let documents: Vec<(String, serde_json::Value)> = batch
                .documents
                .into_iter()
                .map(|(_, id, document)| (id, document))
                .collect();

            let results = self.engine.bulk_index(index, &documents).await?;

            for (i, position) in positions.into_iter().enumerate() {
                match results.get(i) {
                    Some(result) => {
                        if let Some(reason) = &result.error {
                            failures.push(BulkFailure {
                                position,
                                id: result.id.clone(),
                                reason: reason.clone(),
                            });
                        }
                    }
                    None => failures.push(BulkFailure {
                        position,
                        id: documents[i].0.clone(),
                        reason: "no result reported for item".to_string(),
                    }),
                }
            }
            failures.sort_by_key(|f| f.position);
        }

        let report = BulkReport {
            total: articles.len(),
            failures,
        };

        if let Some(message) = report.failure_message() {
            warn!(
                index = %index,
                total = report.total,
                failed = report.failures.len(),
                "Failures indexing articles:\n{}",
                message
            );
        } else {
            debug!(index = %index, total = report.total, "Articles indexed");
        }

        Ok(report)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let index = self.targets.require_write_index("delete")?;

        self.engine.delete_document(index, id).await?;
        debug!(index = %index, id = %id, "Article deleted");
        Ok(())
    }
}
