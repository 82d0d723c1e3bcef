//! Postgres-backed repository implementations.

mod articles;
mod reviews;
mod util;

pub use util::{map_sqlx_error, with_deadline};

use std::sync::Arc;
use std::time::Duration;

use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::domain::types::ResourceKind;

const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool handle shared by the repository implementations of one service.
#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
    statement_timeout: Duration,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) fn statement_timeout(&self) -> Duration {
        self.statement_timeout
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
    }

    /// Apply the embedded migrations owned by the `kind` service.
    pub async fn run_migrations(pool: &PgPool, kind: ResourceKind) -> Result<(), sqlx::Error> {
        let migrator = match kind {
            ResourceKind::Article => sqlx::migrate!("./migrations/articles"),
            ResourceKind::Review => sqlx::migrate!("./migrations/reviews"),
        };
        migrator.run(pool).await.map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}
