//! Review drafts and their validation rules.

use serde::{Deserialize, Serialize};

use super::entities::ReviewRecord;
use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub article_id: i64,
    pub reviewer: String,
    #[serde(default, alias = "reviewContent")]
    pub content: String,
}

impl ReviewDraft {
    pub fn normalize(self) -> Result<Self, DomainError> {
        if self.article_id < 1 {
            return Err(DomainError::validation("articleId must be positive"));
        }

        let reviewer = self.reviewer.trim().to_string();
        if reviewer.is_empty() {
            return Err(DomainError::validation("reviewer must not be empty"));
        }

        Ok(Self {
            article_id: self.article_id,
            reviewer,
            content: self.content,
        })
    }

    pub fn into_record(self, id: i64) -> ReviewRecord {
        ReviewRecord {
            id,
            article_id: self.article_id,
            reviewer: self.reviewer,
            content: self.content,
        }
    }
}

/// Partial review update. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    #[serde(default)]
    pub article_id: Option<i64>,
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default, alias = "reviewContent")]
    pub content: Option<String>,
}

impl ReviewPatch {
    pub fn apply_to(self, current: &ReviewRecord) -> ReviewDraft {
        ReviewDraft {
            article_id: self.article_id.unwrap_or(current.article_id),
            reviewer: self.reviewer.unwrap_or_else(|| current.reviewer.clone()),
            content: self.content.unwrap_or_else(|| current.content.clone()),
        }
    }
}

impl From<ReviewDraft> for ReviewPatch {
    fn from(draft: ReviewDraft) -> Self {
        Self {
            article_id: Some(draft.article_id),
            reviewer: Some(draft.reviewer),
            content: Some(draft.content),
        }
    }
}
