//! Translation of [`SearchQuery`] into the engine's JSON query DSL

use crate::error::Result;
use crate::search::filter::{Filter, RangeFilter};
use crate::search::query::SearchQuery;
use serde_json::{json, Map, Value};

/// Engine-native search request body
#[derive(Debug, Clone, PartialEq)]
pub struct EngineQuery {
    /// Scoring query
    pub query: Value,

    /// Non-scoring restriction applied after scoring
    pub post_filter: Option<Value>,

    pub from: Option<usize>,

    pub size: Option<usize>,
}

impl EngineQuery {
    /// Request body for the `_search` endpoint
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.query.clone());
        if let Some(post_filter) = &self.post_filter {
            body.insert("post_filter".to_string(), post_filter.clone());
        }
        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        Value::Object(body)
    }
}

/// Translate a query; fails when a search term has no target fields
pub fn translate(query: &SearchQuery) -> Result<EngineQuery> {
    query.validate()?;

    let scoring = match query.search_term() {
        None => json!({ "match_all": {} }),
        Some(term) => json!({
            "multi_match": {
                "query": term.to_json(),
                "fields": query.fields(),
            }
        }),
    };

    Ok(EngineQuery {
        query: scoring,
        post_filter: query.filters().map(filter_to_dsl),
        from: Some(query.from()),
        size: Some(query.limit()),
    })
}

/// Raw query-string search, bypassing query translation
pub fn query_string(query: &str) -> EngineQuery {
    EngineQuery {
        query: json!({ "simple_query_string": { "query": query } }),
        post_filter: None,
        from: None,
        size: None,
    }
}

/// Translate a filter tree node by node
pub fn filter_to_dsl(filter: &Filter) -> Value {
    match filter {
        Filter::Term { field, value } => json!({ "term": { field.as_str(): value.to_json() } }),
        Filter::Range(range) => range_to_dsl(range),
        Filter::And(children) => json!({
            "bool": { "filter": children.iter().map(filter_to_dsl).collect::<Vec<_>>() }
        }),
        Filter::Or(children) => json!({
            "bool": {
                "should": children.iter().map(filter_to_dsl).collect::<Vec<_>>(),
                "minimum_should_match": 1
            }
        }),
        Filter::Nested { path, filter } => json!({
            "nested": { "path": path, "query": filter_to_dsl(filter) }
        }),
    }
}

fn range_to_dsl(range: &RangeFilter) -> Value {
    let mut bounds = Map::new();
    if let Some(lower) = &range.lower {
        let op = if lower.inclusive { "gte" } else { "gt" };
        bounds.insert(op.to_string(), lower.value.to_json());
    }
    if let Some(upper) = &range.upper {
        let op = if upper.inclusive { "lte" } else { "lt" };
        bounds.insert(op.to_string(), upper.value.to_json());
    }
    json!({ "range": { range.field.as_str(): Value::Object(bounds) } })
}
