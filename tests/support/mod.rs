//! In-memory fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::macros::datetime;

use folio::application::pagination::PageLimits;
use folio::application::repos::{ArticleQueryFilter, RepoError, ResourceRepo, ReviewQueryFilter};
use folio::application::resources::{Resource, ResourceService};
use folio::application::validation::ExistenceValidator;
use folio::cache::{CacheAside, CacheBackend, CacheError, MemoryCache};
use folio::domain::articles::ArticleDraft;
use folio::domain::entities::{ArticleRecord, ReviewRecord};
use folio::domain::reviews::ReviewDraft;
use folio::domain::types::ResourceKind;

/// Map-backed repository that counts reads and can be switched offline.
pub struct MemoryRepo<E> {
    rows: Mutex<BTreeMap<i64, E>>,
    next_id: AtomicI64,
    gets: AtomicUsize,
    offline: AtomicBool,
}

impl<E> Default for MemoryRepo<E> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            gets: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }
}

impl<E: Resource> MemoryRepo<E> {
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Overwrite a stored row behind the service's back.
    pub fn put(&self, entity: E) {
        self.rows
            .lock()
            .expect("rows lock")
            .insert(entity.id(), entity);
    }

    fn check_online(&self) -> Result<(), RepoError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("repository offline".to_string()));
        }
        Ok(())
    }

    fn insert(&self, draft: E::Draft) -> E {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entity = E::from_draft(id, draft);
        self.put(entity.clone());
        entity
    }

    fn replace(&self, entity: &E) -> Result<E, RepoError> {
        let mut rows = self.rows.lock().expect("rows lock");
        match rows.get_mut(&entity.id()) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(entity.clone())
            }
            None => Err(RepoError::NotFound),
        }
    }

    fn remove(&self, id: i64) -> Result<(), RepoError> {
        match self.rows.lock().expect("rows lock").remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }

    fn find(&self, id: i64) -> Option<E> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().expect("rows lock").get(&id).cloned()
    }

    fn matching(&self, keep: impl Fn(&E) -> bool) -> Vec<E> {
        self.rows
            .lock()
            .expect("rows lock")
            .values()
            .filter(|row| keep(row))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ResourceRepo<ArticleRecord> for MemoryRepo<ArticleRecord> {
    async fn get(&self, id: i64) -> Result<Option<ArticleRecord>, RepoError> {
        self.check_online()?;
        Ok(self.find(id))
    }

    async fn list(&self, filter: &ArticleQueryFilter) -> Result<Vec<ArticleRecord>, RepoError> {
        self.check_online()?;
        Ok(self.matching(|row| {
            filter.title.as_ref().is_none_or(|title| &row.title == title)
                && filter.author.as_ref().is_none_or(|author| &row.author == author)
                && filter.star_count.is_none_or(|stars| row.star_count == stars)
        }))
    }

    async fn add(&self, draft: ArticleDraft) -> Result<ArticleRecord, RepoError> {
        self.check_online()?;
        Ok(self.insert(draft))
    }

    async fn update(&self, entity: &ArticleRecord) -> Result<ArticleRecord, RepoError> {
        self.check_online()?;
        self.replace(entity)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.check_online()?;
        self.remove(id)
    }
}

#[async_trait]
impl ResourceRepo<ReviewRecord> for MemoryRepo<ReviewRecord> {
    async fn get(&self, id: i64) -> Result<Option<ReviewRecord>, RepoError> {
        self.check_online()?;
        Ok(self.find(id))
    }

    async fn list(&self, filter: &ReviewQueryFilter) -> Result<Vec<ReviewRecord>, RepoError> {
        self.check_online()?;
        Ok(self.matching(|row| {
            filter
                .reviewer
                .as_ref()
                .is_none_or(|reviewer| &row.reviewer == reviewer)
                && filter
                    .article_id
                    .is_none_or(|article| row.article_id == article)
        }))
    }

    async fn add(&self, draft: ReviewDraft) -> Result<ReviewRecord, RepoError> {
        self.check_online()?;
        Ok(self.insert(draft))
    }

    async fn update(&self, entity: &ReviewRecord) -> Result<ReviewRecord, RepoError> {
        self.check_online()?;
        self.replace(entity)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.check_online()?;
        self.remove(id)
    }
}

/// Validator answering from a fixed set of known references.
#[derive(Default)]
pub struct KnownReferences {
    known: HashSet<(ResourceKind, i64)>,
    calls: AtomicUsize,
}

impl KnownReferences {
    pub fn with(kind: ResourceKind, ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            known: ids.into_iter().map(|id| (kind, id)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExistenceValidator for KnownReferences {
    async fn exists(&self, kind: ResourceKind, id: i64) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.known.contains(&(kind, id))
    }
}

/// Backend whose every operation fails, as an unreachable Redis would.
pub struct BrokenBackend;

#[async_trait]
impl CacheBackend for BrokenBackend {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }
}

pub fn memory_backend() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(
        NonZeroUsize::new(64).expect("non-zero capacity"),
    ))
}

pub fn store<E: Resource>(backend: Arc<dyn CacheBackend>) -> CacheAside<E> {
    CacheAside::new(
        backend,
        E::KIND.as_str(),
        Duration::from_secs(60),
        Duration::from_millis(200),
    )
}

pub fn article_service(
    repo: Arc<MemoryRepo<ArticleRecord>>,
    backend: Arc<dyn CacheBackend>,
) -> ResourceService<ArticleRecord> {
    ResourceService::new(repo, store(backend), None, PageLimits::default())
}

pub fn review_service(
    repo: Arc<MemoryRepo<ReviewRecord>>,
    backend: Arc<dyn CacheBackend>,
    validator: Option<Arc<dyn ExistenceValidator>>,
) -> ResourceService<ReviewRecord> {
    ResourceService::new(repo, store(backend), validator, PageLimits::default())
}

pub fn article_draft(title: &str, author: &str, stars: i32) -> ArticleDraft {
    ArticleDraft {
        title: title.to_string(),
        author: author.to_string(),
        content: format!("{title} body"),
        publish_date: Some(datetime!(2024-03-01 12:00 UTC)),
        star_count: stars,
    }
}

pub fn review_draft(article_id: i64, reviewer: &str) -> ReviewDraft {
    ReviewDraft {
        article_id,
        reviewer: reviewer.to_string(),
        content: "Solid read".to_string(),
    }
}
