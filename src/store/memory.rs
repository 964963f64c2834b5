use crate::engine::RawHit;
use crate::error::Result;
use crate::models::{Article, ArticleHit};
use crate::search::{values_at, SearchQuery, DEFAULT_LIMIT};
use crate::store::{prepare_bulk, require_url, to_hits, ArticleStore, BulkReport, StoreTargets};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type Indices = HashMap<String, BTreeMap<String, Value>>;

/// In-memory article store (for testing and development)
///
/// Filters are evaluated with [`crate::search::Filter::matches`]. A free-text
/// term scores a document by the number of term tokens found in its best
/// matching field; documents scoring zero are not returned. Stores created
/// with [`InMemoryArticleStore::with_targets`] share the same data.
#[derive(Clone)]
pub struct InMemoryArticleStore {
    indices: Arc<RwLock<Indices>>,
    targets: StoreTargets,
}

impl InMemoryArticleStore {
    pub fn new(targets: StoreTargets) -> Self {
        Self {
            indices: Arc::new(RwLock::new(HashMap::new())),
            targets,
        }
    }

    pub fn with_targets(&self, targets: StoreTargets) -> Self {
        Self {
            indices: Arc::clone(&self.indices),
            targets,
        }
    }

    pub fn targets(&self) -> &StoreTargets {
        &self.targets
    }

    /// Store an arbitrary document, bypassing article serialization
    pub fn insert_raw(&self, index: &str, id: impl Into<String>, document: Value) {
        self.indices
            .write()
            .entry(index.to_string())
            .or_default()
            .insert(id.into(), document);
    }

    /// Number of documents held in `index`
    pub fn count(&self, index: &str) -> usize {
        self.indices.read().get(index).map_or(0, BTreeMap::len)
    }

    /// Matching documents across `indices`, highest score first
    fn scored<F>(&self, indices: &[String], score: F) -> Vec<RawHit>
    where
        F: Fn(&Value) -> Option<f32>,
    {
        let data = self.indices.read();
        let mut hits: Vec<RawHit> = indices
            .iter()
            .filter_map(|name| data.get(name))
            .flat_map(|docs| docs.iter())
            .filter_map(|(id, source)| {
                score(source).map(|score| RawHit {
                    id: id.clone(),
                    score,
                    source: source.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits
    }
}

impl Default for InMemoryArticleStore {
    fn default() -> Self {
        Self::new(StoreTargets::default())
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ArticleHit>> {
        let indices = self.targets.require_search_indices()?;
        query.validate()?;

        let tokens = query.search_term().map(|term| tokenize(&term.to_string()));
        let fields: Vec<&str> = query.fields().iter().map(|f| strip_boost(f)).collect();

        let hits = self.scored(indices, |doc| {
            if let Some(filter) = query.filters() {
                if !filter.matches(doc) {
                    return None;
                }
            }
            match &tokens {
                None => Some(1.0),
                Some(tokens) => {
                    let best = fields
                        .iter()
                        .map(|field| field_score(doc, field, tokens))
                        .max()
                        .unwrap_or(0);
                    (best > 0).then_some(best as f32)
                }
            }
        });

        let page = hits
            .into_iter()
            .skip(query.from())
            .take(query.limit())
            .collect();
        Ok(to_hits(page))
    }

    async fn search_query_string(&self, query: &str) -> Result<Vec<ArticleHit>> {
        let indices = self.targets.require_search_indices()?;
        let tokens = tokenize(query);

        let hits = self.scored(indices, |doc| {
            let mut text = Vec::new();
            string_leaves(doc, &mut text);
            let score = text
                .iter()
                .map(|leaf| count_matches(leaf, &tokens))
                .sum::<usize>();
            (score > 0).then_some(score as f32)
        });

        Ok(to_hits(hits.into_iter().take(DEFAULT_LIMIT).collect()))
    }

    async fn index(&self, article: &Article) -> Result<()> {
        let index = self.targets.require_write_index("index")?;
        let id = require_url(article)?;
        let document = article.to_document()?;

        self.insert_raw(index, id, document);
        tracing::debug!(index = %index, id = %id, "Article indexed");
        Ok(())
    }

    async fn index_all(&self, articles: &[Article]) -> Result<BulkReport> {
        let index = self.targets.require_write_index("index")?;
        let batch = prepare_bulk(articles);

        if !batch.documents.is_empty() {
            let mut data = self.indices.write();
            let docs = data.entry(index.to_string()).or_default();
            for (_, id, document) in batch.documents {
                docs.insert(id, document);
            }
        }

        let report = BulkReport {
            total: articles.len(),
            failures: batch.failures,
        };
        if let Some(message) = report.failure_message() {
            tracing::warn!(
                index = %index,
                total = report.total,
                failed = report.failures.len(),
                "Failures indexing articles:\n{}",
                message
            );
        }
        Ok(report)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let index = self.targets.require_write_index("delete")?;

        if let Some(docs) = self.indices.write().get_mut(index) {
            docs.remove(id);
        }
        tracing::debug!(index = %index, id = %id, "Article deleted");
        Ok(())
    }
}

/// Field name without a `^boost` suffix
fn strip_boost(field: &str) -> &str {
    field.split('^').next().unwrap_or(field)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn count_matches(text: &str, tokens: &[String]) -> usize {
    tokenize(text)
        .iter()
        .filter(|t| tokens.contains(*t))
        .count()
}

fn field_score(doc: &Value, field: &str, tokens: &[String]) -> usize {
    values_at(doc, field)
        .into_iter()
        .filter_map(Value::as_str)
        .map(|text| count_matches(text, tokens))
        .sum()
}

fn string_leaves<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| string_leaves(v, out)),
        Value::Object(map) => map.values().for_each(|v| string_leaves(v, out)),
        _ => {}
    }
}
