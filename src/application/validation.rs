//! Cross-service referential integrity checks.

use async_trait::async_trait;

use crate::domain::types::ResourceKind;

/// Answers whether a resource owned by another service exists.
///
/// Implementations fail closed: any transport failure, timeout or non-success
/// answer is reported as `false`.
#[async_trait]
pub trait ExistenceValidator: Send + Sync {
    async fn exists(&self, kind: ResourceKind, id: i64) -> bool;
}
