use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::application::pagination::PaginationError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::domain::types::ResourceKind;

/// Diagnostic chain attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: i64 },
    #[error("referenced {kind} {id} does not exist")]
    InvalidReference { kind: ResourceKind, id: i64 },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("repository failure")]
    Repo(#[source] RepoError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Map a repository failure for the entity `kind`/`id`.
    pub fn from_repo(kind: ResourceKind, id: i64, err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound { kind, id },
            RepoError::InvalidInput { message } => Self::Validation(message),
            other => Self::Repo(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<PaginationError> for AppError {
    fn from(err: PaginationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_not_found_becomes_entity_not_found() {
        let err = AppError::from_repo(ResourceKind::Article, 7, RepoError::NotFound);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "article 7 not found");
    }

    #[test]
    fn repo_timeout_is_kept_as_source() {
        let err = AppError::from_repo(ResourceKind::Review, 1, RepoError::Timeout);
        let report = ErrorReport::from_error("test", StatusCode::SERVICE_UNAVAILABLE, &err);
        assert_eq!(
            report.messages,
            vec!["repository failure".to_string(), "database timeout".to_string()]
        );
    }
}
