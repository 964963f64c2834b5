//! Query model for article search
//!
//! This module describes *what* to search for, independent of any engine:
//!
//! - **Filter Model**: term, range, boolean and nested filter nodes
//! - **Query Builder**: free-text term, target fields, filters and pagination
//! - **Article Query Builder**: author/title/content-type terms, date ranges and tag matching
//! - **Translator**: maps a [`SearchQuery`] onto the engine's JSON query DSL
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           ArticleQueryBuilder                    │
//! │  - with_author()     - with_published()         │
//! │  - with_tags()       - with_content_type()      │
//! └─────────────────────────────────────────────────┘
//!                      │ build()
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │           SearchQuery (immutable)                │
//! │  fields · search_term · filters · from · limit  │
//! └─────────────────────────────────────────────────┘
//!                      │ translate()
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │           EngineQuery                            │
//! │  match_all | multi_match  +  post_filter        │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use article_index::models::Tag;
//! use article_index::search::{translate, ArticleQueryBuilder, RangeDirection};
//!
//! let query = ArticleQueryBuilder::new()
//!     .with_default_fields()
//!     .with_search_term("database outage")
//!     .with_published("2024-01-01T00:00:00Z", RangeDirection::GreaterThanOrEqual)
//!     .with_tags([&Tag::new("postgres", "topic"), &Tag::new("mysql", "topic")])
//!     .with_limit(20)
//!     .build();
//!
//! let request = translate(&query).unwrap();
//! assert!(request.post_filter.is_some());
//! ```

mod article;
mod filter;
mod query;
mod translate;
mod value;

pub use article::{fields, ArticleQueryBuilder};
pub(crate) use filter::values_at;
pub use filter::{Filter, RangeBound, RangeDirection, RangeFilter};
pub use query::{QueryBuilder, SearchQuery, DEFAULT_LIMIT};
pub use translate::{filter_to_dsl, query_string, translate, EngineQuery};
pub use value::FieldValue;
