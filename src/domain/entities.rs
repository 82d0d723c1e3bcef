//! Domain entities mirrored from persistent storage.
//!
//! Entities serialize with camelCase field names; the same encoding is used
//! for HTTP bodies and for cache entries.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(alias = "articleContent")]
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub publish_date: OffsetDateTime,
    pub star_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: i64,
    pub article_id: i64,
    pub reviewer: String,
    #[serde(alias = "reviewContent")]
    pub content: String,
}
