use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    application::repos::{RepoError, ResourceRepo, ReviewQueryFilter},
    domain::{entities::ReviewRecord, reviews::ReviewDraft},
};

use super::{PostgresRepositories, with_deadline};

const REVIEW_COLUMNS: &str = "id, article_id, reviewer, content";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    article_id: i64,
    reviewer: String,
    content: String,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            article_id: row.article_id,
            reviewer: row.reviewer,
            content: row.content,
        }
    }
}

#[async_trait]
impl ResourceRepo<ReviewRecord> for PostgresRepositories {
    async fn get(&self, id: i64) -> Result<Option<ReviewRecord>, RepoError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let row = with_deadline(
            self.statement_timeout(),
            sqlx::query_as::<_, ReviewRow>(&sql)
                .bind(id)
                .fetch_optional(self.pool()),
        )
        .await?;

        Ok(row.map(ReviewRecord::from))
    }

    async fn list(&self, filter: &ReviewQueryFilter) -> Result<Vec<ReviewRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(REVIEW_COLUMNS);
        qb.push(" FROM reviews WHERE 1 = 1");

        if let Some(reviewer) = filter.reviewer.as_ref() {
            qb.push(" AND reviewer = ");
            qb.push_bind(reviewer.clone());
        }
        if let Some(article_id) = filter.article_id {
            qb.push(" AND article_id = ");
            qb.push_bind(article_id);
        }
        qb.push(" ORDER BY id ASC");

        let rows = with_deadline(
            self.statement_timeout(),
            qb.build_query_as::<ReviewRow>().fetch_all(self.pool()),
        )
        .await?;

        Ok(rows.into_iter().map(ReviewRecord::from).collect())
    }

    async fn add(&self, draft: ReviewDraft) -> Result<ReviewRecord, RepoError> {
        let sql = format!(
            "INSERT INTO reviews (article_id, reviewer, content) \
             VALUES ($1, $2, $3) RETURNING {REVIEW_COLUMNS}"
        );
        let row = with_deadline(
            self.statement_timeout(),
            sqlx::query_as::<_, ReviewRow>(&sql)
                .bind(draft.article_id)
                .bind(draft.reviewer)
                .bind(draft.content)
                .fetch_one(self.pool()),
        )
        .await?;

        Ok(row.into())
    }

    async fn update(&self, entity: &ReviewRecord) -> Result<ReviewRecord, RepoError> {
        let sql = format!(
            "UPDATE reviews SET article_id = $2, reviewer = $3, content = $4 \
             WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        );
        let row = with_deadline(
            self.statement_timeout(),
            sqlx::query_as::<_, ReviewRow>(&sql)
                .bind(entity.id)
                .bind(entity.article_id)
                .bind(&entity.reviewer)
                .bind(&entity.content)
                .fetch_optional(self.pool()),
        )
        .await?;

        row.map(ReviewRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let result = with_deadline(
            self.statement_timeout(),
            sqlx::query("DELETE FROM reviews WHERE id = $1")
                .bind(id)
                .execute(self.pool()),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
