//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::application::resources::Resource;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Exact-match article filters; absent fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQueryFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub star_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueryFilter {
    pub reviewer: Option<String>,
    pub article_id: Option<i64>,
}

/// Durable storage for one resource type.
///
/// `update` and `delete` report `RepoError::NotFound` for unknown ids instead
/// of succeeding silently. `list` returns matches in ascending id order.
#[async_trait]
pub trait ResourceRepo<E: Resource>: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<E>, RepoError>;

    async fn list(&self, filter: &E::Filter) -> Result<Vec<E>, RepoError>;

    async fn add(&self, draft: E::Draft) -> Result<E, RepoError>;

    async fn update(&self, entity: &E) -> Result<E, RepoError>;

    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}
