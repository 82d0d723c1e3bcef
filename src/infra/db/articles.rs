use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{ArticleQueryFilter, RepoError, ResourceRepo},
    domain::{articles::ArticleDraft, entities::ArticleRecord},
};

use super::{PostgresRepositories, with_deadline};

const ARTICLE_COLUMNS: &str = "id, title, author, content, publish_date, star_count";

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    author: String,
    content: String,
    publish_date: OffsetDateTime,
    star_count: i32,
}

impl From<ArticleRow> for ArticleRecord {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            content: row.content,
            publish_date: row.publish_date,
            star_count: row.star_count,
        }
    }
}

#[async_trait]
impl ResourceRepo<ArticleRecord> for PostgresRepositories {
    async fn get(&self, id: i64) -> Result<Option<ArticleRecord>, RepoError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = with_deadline(
            self.statement_timeout(),
            sqlx::query_as::<_, ArticleRow>(&sql)
                .bind(id)
                .fetch_optional(self.pool()),
        )
        .await?;

        Ok(row.map(ArticleRecord::from))
    }

    async fn list(&self, filter: &ArticleQueryFilter) -> Result<Vec<ArticleRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(ARTICLE_COLUMNS);
        qb.push(" FROM articles WHERE 1 = 1");

        if let Some(title) = filter.title.as_ref() {
            qb.push(" AND title = ");
            qb.push_bind(title.clone());
        }
        if let Some(author) = filter.author.as_ref() {
            qb.push(" AND author = ");
            qb.push_bind(author.clone());
        }
        if let Some(star_count) = filter.star_count {
            qb.push(" AND star_count = ");
            qb.push_bind(star_count);
        }
        qb.push(" ORDER BY id ASC");

        let rows = with_deadline(
            self.statement_timeout(),
            qb.build_query_as::<ArticleRow>().fetch_all(self.pool()),
        )
        .await?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }

    async fn add(&self, draft: ArticleDraft) -> Result<ArticleRecord, RepoError> {
        let sql = format!(
            "INSERT INTO articles (title, author, content, publish_date, star_count) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ARTICLE_COLUMNS}"
        );
        let publish_date = draft.publish_date.unwrap_or_else(OffsetDateTime::now_utc);
        let row = with_deadline(
            self.statement_timeout(),
            sqlx::query_as::<_, ArticleRow>(&sql)
                .bind(draft.title)
                .bind(draft.author)
                .bind(draft.content)
                .bind(publish_date)
                .bind(draft.star_count)
                .fetch_one(self.pool()),
        )
        .await?;

        Ok(row.into())
    }

    async fn update(&self, entity: &ArticleRecord) -> Result<ArticleRecord, RepoError> {
        let sql = format!(
            "UPDATE articles SET title = $2, author = $3, content = $4, publish_date = $5, \
             star_count = $6 WHERE id = $1 RETURNING {ARTICLE_COLUMNS}"
        );
        let row = with_deadline(
            self.statement_timeout(),
            sqlx::query_as::<_, ArticleRow>(&sql)
                .bind(entity.id)
                .bind(&entity.title)
                .bind(&entity.author)
                .bind(&entity.content)
                .bind(entity.publish_date)
                .bind(entity.star_count)
                .fetch_optional(self.pool()),
        )
        .await?;

        row.map(ArticleRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let result = with_deadline(
            self.statement_timeout(),
            sqlx::query("DELETE FROM articles WHERE id = $1")
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
