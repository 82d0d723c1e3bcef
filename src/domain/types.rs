//! Shared domain enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The resource types served by folio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Article,
    Review,
}

impl ResourceKind {
    /// Singular name, used as the cache key prefix (`article-42`).
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Article => "article",
            ResourceKind::Review => "review",
        }
    }

    /// Collection name, used as the URL segment (`/articles/42`).
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Article => "articles",
            ResourceKind::Review => "reviews",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A foreign reference from one resource to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub kind: ResourceKind,
    pub id: i64,
}

impl Reference {
    pub fn new(kind: ResourceKind, id: i64) -> Self {
        Self { kind, id }
    }
}
