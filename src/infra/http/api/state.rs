use std::sync::Arc;

use crate::application::resources::{Resource, ResourceService};
use crate::infra::db::PostgresRepositories;

/// Router state for one resource service.
pub struct ApiState<E: Resource> {
    pub service: Arc<ResourceService<E>>,
    /// Probed by `GET /health`; services without a database always report healthy.
    pub db: Option<Arc<PostgresRepositories>>,
}

impl<E: Resource> ApiState<E> {
    pub fn new(service: ResourceService<E>) -> Self {
        Self {
            service: Arc::new(service),
            db: None,
        }
    }

    pub fn with_database(mut self, db: Arc<PostgresRepositories>) -> Self {
        self.db = Some(db);
        self
    }
}

impl<E: Resource> Clone for ApiState<E> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            db: self.db.clone(),
        }
    }
}
