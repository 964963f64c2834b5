//! Article indexing and search over an Elasticsearch-compatible engine
//!
//! Build a [`search::SearchQuery`] with [`search::ArticleQueryBuilder`], then
//! run it through an [`store::ArticleStore`]. Stores are created from a
//! [`config::Config`] with [`store::create_store`].

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod provision;
pub mod search;
pub mod store;

pub use error::{AppError, Result};
