//! Article drafts and their validation rules.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::entities::ArticleRecord;
use super::error::DomainError;

/// Client-supplied article fields for create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    pub author: String,
    #[serde(default, alias = "articleContent")]
    pub content: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub publish_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub star_count: i32,
}

impl ArticleDraft {
    /// Trim text fields and enforce the article invariants.
    ///
    /// A missing publish date is stamped with the current time so the stored
    /// entity always carries one.
    pub fn normalize(self) -> Result<Self, DomainError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }

        let author = self.author.trim().to_string();
        if author.is_empty() {
            return Err(DomainError::validation("author must not be empty"));
        }

        if self.star_count < 0 {
            return Err(DomainError::validation("starCount must not be negative"));
        }

        Ok(Self {
            title,
            author,
            content: self.content,
            publish_date: Some(self.publish_date.unwrap_or_else(OffsetDateTime::now_utc)),
            star_count: self.star_count,
        })
    }

    pub fn into_record(self, id: i64) -> ArticleRecord {
        ArticleRecord {
            id,
            title: self.title,
            author: self.author,
            content: self.content,
            publish_date: self.publish_date.unwrap_or_else(OffsetDateTime::now_utc),
            star_count: self.star_count,
        }
    }
}

/// Partial article update. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, alias = "articleContent")]
    pub content: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub publish_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub star_count: Option<i32>,
}

impl ArticlePatch {
    /// Overlay the supplied fields on `current`, yielding a draft to validate.
    pub fn apply_to(self, current: &ArticleRecord) -> ArticleDraft {
        ArticleDraft {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            author: self.author.unwrap_or_else(|| current.author.clone()),
            content: self.content.unwrap_or_else(|| current.content.clone()),
            publish_date: Some(self.publish_date.unwrap_or(current.publish_date)),
            star_count: self.star_count.unwrap_or(current.star_count),
        }
    }
}

impl From<ArticleDraft> for ArticlePatch {
    fn from(draft: ArticleDraft) -> Self {
        Self {
            title: Some(draft.title),
            author: Some(draft.author),
            content: Some(draft.content),
            publish_date: draft.publish_date,
            star_count: Some(draft.star_count),
        }
    }
}
