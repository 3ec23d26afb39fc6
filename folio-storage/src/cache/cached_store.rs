//! `Store<T>` composed with the read-through cache.

use std::sync::Arc;

use async_trait::async_trait;
use folio_core::{Entity, EntityId, FolioResult};

use super::read::CacheRead;
use super::read_through::ReadThroughCache;
use crate::store::Store;

/// Reads that may be served from the cache.
#[async_trait]
pub trait CachedReader<T: Entity>: Send + Sync {
    async fn get_cached(&self, id: EntityId) -> FolioResult<Option<CacheRead<T>>>;

    async fn list_cached(&self) -> FolioResult<CacheRead<Vec<T>>>;
}

/// A store with a cached read path.
///
/// Plain [`Store`] calls, writes included, go straight to the inner store
/// and leave cache entries untouched.
#[derive(Clone)]
pub struct CachedStore<T: Entity> {
    store: Arc<dyn Store<T>>,
    cache: ReadThroughCache,
}

impl<T: Entity> CachedStore<T> {
    pub fn new(store: Arc<dyn Store<T>>, cache: ReadThroughCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &Arc<dyn Store<T>> {
        &self.store
    }

    pub fn cache(&self) -> &ReadThroughCache {
        &self.cache
    }
}

#[async_trait]
impl<T: Entity> CachedReader<T> for CachedStore<T> {
    async fn get_cached(&self, id: EntityId) -> FolioResult<Option<CacheRead<T>>> {
        self.cache.get_item(id, self.store.as_ref()).await
    }

    async fn list_cached(&self) -> FolioResult<CacheRead<Vec<T>>> {
        self.cache.get_collection(self.store.as_ref()).await
    }
}

#[async_trait]
impl<T: Entity> Store<T> for CachedStore<T> {
    async fn create(&self, new: T::New) -> FolioResult<T> {
        self.store.create(new).await
    }

    async fn find_by_id(&self, id: EntityId) -> FolioResult<Option<T>> {
        self.store.find_by_id(id).await
    }

    async fn list(&self) -> FolioResult<Vec<T>> {
        self.store.list().await
    }

    async fn update(&self, id: EntityId, update: T::Update) -> FolioResult<T> {
        self.store.update(id, update).await
    }

    async fn delete(&self, id: EntityId) -> FolioResult<()> {
        self.store.delete(id).await
    }
}
