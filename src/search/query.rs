//! Search query description and its builder

use crate::error::{AppError, Result};
use crate::search::filter::Filter;
use crate::search::value::FieldValue;
use std::fmt;

/// Default page size
pub const DEFAULT_LIMIT: usize = 10;

/// Immutable description of a search
///
/// Built with [`QueryBuilder`] (or [`crate::search::ArticleQueryBuilder`]).
/// Nothing is validated at build time; [`SearchQuery::validate`] runs when a
/// store consumes the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    fields: Vec<String>,
    search_term: Option<FieldValue>,
    filters: Option<Filter>,
    from: usize,
    limit: usize,
}

impl SearchQuery {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Every document, first page
    pub fn match_all() -> Self {
        QueryBuilder::new().build()
    }

    /// Target fields for the free-text term
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn search_term(&self) -> Option<&FieldValue> {
        self.search_term.as_ref()
    }

    pub fn filters(&self) -> Option<&Filter> {
        self.filters.as_ref()
    }

    /// Result offset
    pub fn from(&self) -> usize {
        self.from
    }

    /// Page size
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// A free-text term needs at least one field to match against, and no
    /// value in the query may be a non-finite number
    pub fn validate(&self) -> Result<()> {
        if self.search_term.is_some() && self.fields.is_empty() {
            return Err(AppError::Validation(
                "fields must be set to perform search term query".to_string(),
            ));
        }
        if self.search_term.as_ref().is_some_and(|t| !t.is_finite()) {
            return Err(AppError::Validation(
                "search term must not be a non-finite number".to_string(),
            ));
        }
        if let Some(field) = self.filters.as_ref().and_then(non_finite_field) {
            return Err(AppError::Validation(format!(
                "filter on '{}' must not use a non-finite number",
                field
            )));
        }
        Ok(())
    }
}

/// First field whose filter value is NaN or infinite
fn non_finite_field(filter: &Filter) -> Option<&str> {
    match filter {
        Filter::Term { field, value } => (!value.is_finite()).then_some(field.as_str()),
        Filter::Range(range) => [&range.lower, &range.upper]
            .into_iter()
            .flatten()
            .any(|bound| !bound.value.is_finite())
            .then_some(range.field.as_str()),
        Filter::And(children) | Filter::Or(children) => {
            children.iter().find_map(non_finite_field)
        }
        Filter::Nested { filter, .. } => non_finite_field(filter),
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::match_all()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchQuery [search_term: {}, fields: {:?}, filters: {}, from: {}, limit: {}]",
            self.search_term
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "<none>".to_string()),
            self.fields,
            if self.filters.is_some() { "set" } else { "none" },
            self.from,
            self.limit
        )
    }
}

/// Accumulates search parameters until [`QueryBuilder::build`]
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    fields: Vec<String>,
    search_term: Option<FieldValue>,
    filters: Option<Filter>,
    from: usize,
    limit: usize,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            search_term: None,
            filters: None,
            from: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Set the fields searched by the free-text term, replacing any previous set
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the free-text term
    pub fn with_search_term(mut self, term: impl Into<FieldValue>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Set the result offset; negative values clamp to 0
    pub fn with_from(mut self, from: i64) -> Self {
        self.from = clamp(from);
        self
    }

    /// Set the page size; negative values clamp to 0
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = clamp(limit);
        self
    }

    /// Replace the filter tree
    pub fn with_filters(mut self, filters: Filter) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Snapshot the current state
    pub fn build(&self) -> SearchQuery {
        self.build_with_filters(self.filters.clone())
    }

    pub(crate) fn build_with_filters(&self, filters: Option<Filter>) -> SearchQuery {
        SearchQuery {
            fields: self.fields.clone(),
            search_term: self.search_term.clone(),
            filters,
            from: self.from,
            limit: self.limit,
        }
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}
