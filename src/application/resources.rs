//! Generic resource orchestration: repository, cache-aside store and
//! cross-service reference checks composed into CRUD and search.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::application::error::AppError;
use crate::application::pagination::{PageLimits, PageRequest, Paginated};
use crate::application::repos::{
    ArticleQueryFilter, RepoError, ResourceRepo, ReviewQueryFilter,
};
use crate::application::validation::ExistenceValidator;
use crate::cache::{CacheAside, entity_key};
use crate::domain::articles::{ArticleDraft, ArticlePatch};
use crate::domain::entities::{ArticleRecord, ReviewRecord};
use crate::domain::error::DomainError;
use crate::domain::reviews::{ReviewDraft, ReviewPatch};
use crate::domain::types::{Reference, ResourceKind};

/// Capabilities an entity needs to be served by [`ResourceService`].
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Client-supplied fields for create.
    type Draft: DeserializeOwned + Clone + Send + Sync + 'static;
    /// Partial update; omitted fields keep their stored value.
    type Patch: DeserializeOwned + Clone + Send + Sync + 'static;
    /// Listing filter, deserialized from the query string.
    type Filter: DeserializeOwned + Default + Clone + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> i64;

    fn normalize(draft: Self::Draft) -> Result<Self::Draft, DomainError>;

    /// Entities owned elsewhere that must exist before `draft` is stored.
    fn references(draft: &Self::Draft) -> Vec<Reference>;

    fn merge(current: &Self, patch: Self::Patch) -> Self::Draft;

    fn from_draft(id: i64, draft: Self::Draft) -> Self;
}

impl Resource for ArticleRecord {
    type Draft = ArticleDraft;
    type Patch = ArticlePatch;
    type Filter = ArticleQueryFilter;

    const KIND: ResourceKind = ResourceKind::Article;

    fn id(&self) -> i64 {
        self.id
    }

    fn normalize(draft: ArticleDraft) -> Result<ArticleDraft, DomainError> {
        draft.normalize()
    }

    fn references(_draft: &ArticleDraft) -> Vec<Reference> {
        Vec::new()
    }

    fn merge(current: &Self, patch: ArticlePatch) -> ArticleDraft {
        patch.apply_to(current)
    }

    fn from_draft(id: i64, draft: ArticleDraft) -> Self {
        draft.into_record(id)
    }
}

impl Resource for ReviewRecord {
    type Draft = ReviewDraft;
    type Patch = ReviewPatch;
    type Filter = ReviewQueryFilter;

    const KIND: ResourceKind = ResourceKind::Review;

    fn id(&self) -> i64 {
        self.id
    }

    fn normalize(draft: ReviewDraft) -> Result<ReviewDraft, DomainError> {
        draft.normalize()
    }

    fn references(draft: &ReviewDraft) -> Vec<Reference> {
        vec![Reference::new(ResourceKind::Article, draft.article_id)]
    }

    fn merge(current: &Self, patch: ReviewPatch) -> ReviewDraft {
        patch.apply_to(current)
    }

    fn from_draft(id: i64, draft: ReviewDraft) -> Self {
        draft.into_record(id)
    }
}

/// CRUD and search for one resource type.
///
/// Reads go through the cache; writes go to the repository first and
/// invalidate the entity key only once the write is confirmed.
pub struct ResourceService<E: Resource> {
    repo: Arc<dyn ResourceRepo<E>>,
    cache: CacheAside<E>,
    validator: Option<Arc<dyn ExistenceValidator>>,
    limits: PageLimits,
}

impl<E: Resource> Clone for ResourceService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            cache: self.cache.clone(),
            validator: self.validator.clone(),
            limits: self.limits,
        }
    }
}

impl<E: Resource> ResourceService<E> {
    pub fn new(
        repo: Arc<dyn ResourceRepo<E>>,
        cache: CacheAside<E>,
        validator: Option<Arc<dyn ExistenceValidator>>,
        limits: PageLimits,
    ) -> Self {
        Self {
            repo,
            cache,
            validator,
            limits,
        }
    }

    pub async fn read(&self, id: i64) -> Result<E, AppError> {
        let key = entity_key(E::KIND, id);
        let loaded = self
            .cache
            .get_or_set(
                &key,
                || async move {
                    self.repo
                        .get(id)
                        .await
                        .map_err(|err| AppError::from_repo(E::KIND, id, err))
                },
                None,
            )
            .await?;

        loaded.ok_or(AppError::NotFound { kind: E::KIND, id })
    }

    /// Store a new entity. The cache is populated by the first read, not here.
    pub async fn create(&self, draft: E::Draft) -> Result<E, AppError> {
        let draft = E::normalize(draft)?;
        self.ensure_references(&draft).await?;

        let created = self
            .repo
            .add(draft)
            .await
            .map_err(|err| AppError::from_repo(E::KIND, 0, err))?;

        info!(
            target = "folio::application::resources",
            kind = %E::KIND,
            id = created.id(),
            "Created resource"
        );
        Ok(created)
    }

    /// Overlay `patch` on the stored row and write the result back.
    /// The current row comes from the repository, not the cache.
    pub async fn update(&self, id: i64, patch: E::Patch) -> Result<E, AppError> {
        let current = self
            .repo
            .get(id)
            .await
            .map_err(|err| AppError::from_repo(E::KIND, id, err))?
            .ok_or(AppError::NotFound { kind: E::KIND, id })?;

        let draft = E::normalize(E::merge(&current, patch))?;
        self.ensure_references(&draft).await?;

        let entity = E::from_draft(id, draft);
        let updated = self
            .repo
            .update(&entity)
            .await
            .map_err(|err| AppError::from_repo(E::KIND, id, err))?;

        self.cache.remove(&entity_key(E::KIND, id)).await;

        info!(
            target = "folio::application::resources",
            kind = %E::KIND,
            id,
            "Updated resource"
        );
        Ok(updated)
    }

    /// Delete `id`. The cache key is invalidated whether or not the row existed.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = self.repo.delete(id).await;

        if matches!(result, Ok(()) | Err(RepoError::NotFound)) {
            self.cache.remove(&entity_key(E::KIND, id)).await;
        }

        result.map_err(|err| AppError::from_repo(E::KIND, id, err))?;

        info!(
            target = "folio::application::resources",
            kind = %E::KIND,
            id,
            "Deleted resource"
        );
        Ok(())
    }

    /// Filtered listing sliced to one page. Results are not cached.
    pub async fn search(
        &self,
        filter: &E::Filter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Paginated<E>, AppError> {
        let request = PageRequest::from_query(page, page_size, self.limits)?;
        let all = self
            .repo
            .list(filter)
            .await
            .map_err(|err| AppError::from_repo(E::KIND, 0, err))?;

        debug!(
            target = "folio::application::resources",
            kind = %E::KIND,
            total = all.len(),
            page = request.page(),
            "Listed resources"
        );
        Ok(Paginated::from_items(all, request))
    }

    async fn ensure_references(&self, draft: &E::Draft) -> Result<(), AppError> {
        for reference in E::references(draft) {
            let exists = match self.validator.as_ref() {
                Some(validator) => validator.exists(reference.kind, reference.id).await,
                None => false,
            };

            if !exists {
                info!(
                    target = "folio::application::resources",
                    kind = %E::KIND,
                    reference_kind = %reference.kind,
                    reference_id = reference.id,
                    "Rejected draft with unknown reference"
                );
                return Err(AppError::InvalidReference {
                    kind: reference.kind,
                    id: reference.id,
                });
            }
        }
        Ok(())
    }
}
