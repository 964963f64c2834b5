//! Article-specific query building
//!
//! Domain setters compile to generic [`Filter`] nodes. Distinct filters are
//! conjoined (AND); tags form a single OR group that is itself conjoined with
//! everything else, so a document matches when it carries any requested tag
//! and satisfies every other filter.

use crate::models::{Article, Tag};
use crate::search::filter::{Filter, RangeDirection, RangeFilter};
use crate::search::query::{QueryBuilder, SearchQuery};
use crate::search::value::FieldValue;

/// Engine field names used by the article filters
pub mod fields {
    pub const CONTENT_TYPE: &str = "contentType";
    pub const AUTHOR_RAW: &str = "author.raw";
    pub const TITLE_RAW: &str = "title.raw";
    pub const CREATED: &str = "created";
    pub const PUBLISHED: &str = "published";
    pub const TAGS: &str = "tags";
    pub const TAG: &str = "tags.tag";
    pub const TAG_TYPE: &str = "tags.tagType";
}

/// Builds a [`SearchQuery`] over articles
#[derive(Debug, Clone, Default)]
pub struct ArticleQueryBuilder {
    base: QueryBuilder,
    clauses: Vec<Filter>,
    tag_group: Vec<Filter>,
}

impl ArticleQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base = self.base.with_fields(fields);
        self
    }

    /// Search the standard article text fields
    pub fn with_default_fields(self) -> Self {
        self.with_fields(Article::DEFAULT_SEARCH_FIELDS)
    }

    pub fn with_search_term(mut self, term: impl Into<FieldValue>) -> Self {
        self.base = self.base.with_search_term(term);
        self
    }

    pub fn with_from(mut self, from: i64) -> Self {
        self.base = self.base.with_from(from);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.base = self.base.with_limit(limit);
        self
    }

    /// Replace every accumulated filter with `filters`; later domain setters
    /// conjoin onto it
    pub fn with_filters(mut self, filters: Filter) -> Self {
        self.clauses = vec![filters];
        self.tag_group.clear();
        self
    }

    pub fn with_content_type(self, content_type: impl Into<FieldValue>) -> Self {
        self.conjoin(Filter::term(fields::CONTENT_TYPE, content_type))
    }

    pub fn with_author(self, author: impl Into<FieldValue>) -> Self {
        self.conjoin(Filter::term(fields::AUTHOR_RAW, author))
    }

    pub fn with_title(self, title: impl Into<FieldValue>) -> Self {
        self.conjoin(Filter::term(fields::TITLE_RAW, title))
    }

    /// One-sided range on `created`
    pub fn with_created(self, date: impl Into<FieldValue>, direction: RangeDirection) -> Self {
        self.conjoin(Filter::directional(fields::CREATED, date, direction))
    }

    /// Inclusive range on `created`
    pub fn with_created_between(
        self,
        from: impl Into<FieldValue>,
        to: impl Into<FieldValue>,
    ) -> Self {
        self.conjoin(Filter::between(fields::CREATED, from, to))
    }

    /// One-sided range on `published`
    pub fn with_published(self, date: impl Into<FieldValue>, direction: RangeDirection) -> Self {
        self.conjoin(Filter::directional(fields::PUBLISHED, date, direction))
    }

    /// Inclusive range on `published`
    pub fn with_published_between(
        self,
        from: impl Into<FieldValue>,
        to: impl Into<FieldValue>,
    ) -> Self {
        self.conjoin(Filter::between(fields::PUBLISHED, from, to))
    }

    /// Open range on `published`; either side may be left unbounded
    pub fn with_published_range(
        self,
        from: Option<FieldValue>,
        to: Option<FieldValue>,
    ) -> Self {
        self.conjoin(Filter::Range(RangeFilter::between(fields::PUBLISHED, from, to)))
    }

    /// Add one tag to the OR group
    pub fn with_tag(mut self, tag: &Tag) -> Self {
        self.tag_group.push(Self::tag_filter(tag));
        self
    }

    /// Add several tags to the OR group
    pub fn with_tags<'a>(mut self, tags: impl IntoIterator<Item = &'a Tag>) -> Self {
        self.tag_group.extend(tags.into_iter().map(Self::tag_filter));
        self
    }

    /// Filter matching a document that carries `tag`, with both name and type
    /// on the same tag entry
    pub fn tag_filter(tag: &Tag) -> Filter {
        Filter::nested(
            fields::TAGS,
            Filter::and([
                Filter::term(fields::TAG, tag.tag.as_str()),
                Filter::term(fields::TAG_TYPE, tag.tag_type.as_str()),
            ]),
        )
    }

    /// The filter tree accumulated so far, `None` when no filter was set
    pub fn filters(&self) -> Option<Filter> {
        let mut children = self.clauses.clone();
        if !self.tag_group.is_empty() {
            children.push(Filter::Or(self.tag_group.clone()));
        }
        if children.is_empty() {
            None
        } else {
            Some(Filter::And(children))
        }
    }

    pub fn build(&self) -> SearchQuery {
        self.base.build_with_filters(self.filters())
    }

    fn conjoin(mut self, filter: Filter) -> Self {
        self.clauses.push(filter);
        self
    }
}
