//! In-memory credential store used by tests and local runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use folio_core::{Entity, EntityId, FolioResult, StorageError, User};
use tokio::sync::RwLock;

use crate::store::{Store, UserStore};

/// Per-operation call counters.
#[derive(Debug, Default)]
struct CallCounts {
    creates: AtomicU64,
    finds: AtomicU64,
    lists: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
}

/// `BTreeMap`-backed store with auto-incrementing ids, soft deletes, unique
/// field checks and call counters.
#[derive(Debug)]
pub struct InMemoryStore<T> {
    records: RwLock<BTreeMap<EntityId, T>>,
    next_id: AtomicI64,
    calls: CallCounts,
    failing: AtomicBool,
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            calls: CallCounts::default(),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn find_calls(&self) -> u64 {
        self.calls.finds.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u64 {
        self.calls.lists.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> u64 {
        self.calls.creates.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> u64 {
        self.calls.updates.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u64 {
        self.calls.deletes.load(Ordering::SeqCst)
    }

    /// Every stored row, soft-deleted ones included.
    pub async fn snapshot(&self) -> Vec<T> {
        self.records.read().await.values().cloned().collect()
    }

    fn check_available(&self) -> FolioResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend {
                reason: "in-memory store is configured to fail".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn check_unique(records: &BTreeMap<EntityId, T>, candidate: &T) -> FolioResult<()> {
        let Some((field, value)) = candidate.unique_field() else {
            return Ok(());
        };
        let taken = records.values().any(|other| {
            other.id() != candidate.id()
                && other.is_live()
                && other.unique_field() == Some((field, value))
        });
        if taken {
            return Err(StorageError::Duplicate {
                entity_type: T::ENTITY_TYPE,
                field: field.to_string(),
                value: value.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn not_found(id: EntityId) -> StorageError {
        StorageError::NotFound {
            entity_type: T::ENTITY_TYPE,
            id,
        }
    }
}

#[async_trait]
impl<T: Entity> Store<T> for InMemoryStore<T> {
    async fn create(&self, new: T::New) -> FolioResult<T> {
        self.calls.creates.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.write().await;
        let id = self.next_id.load(Ordering::SeqCst);
        let record = T::build(id, new, Utc::now());
        Self::check_unique(&records, &record)?;

        self.next_id.fetch_add(1, Ordering::SeqCst);
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: EntityId) -> FolioResult<Option<T>> {
        self.calls.finds.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let records = self.records.read().await;
        Ok(records.get(&id).filter(|r| r.is_live()).cloned())
    }

    async fn list(&self) -> FolioResult<Vec<T>> {
        self.calls.lists.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let records = self.records.read().await;
        Ok(records.values().filter(|r| r.is_live()).cloned().collect())
    }

    async fn update(&self, id: EntityId, update: T::Update) -> FolioResult<T> {
        self.calls.updates.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.write().await;
        let mut updated = records
            .get(&id)
            .filter(|r| r.is_live())
            .cloned()
            .ok_or_else(|| Self::not_found(id))?;
        updated.apply(update, Utc::now());
        Self::check_unique(&records, &updated)?;

        records.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: EntityId) -> FolioResult<()> {
        self.calls.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.write().await;
        match records.get_mut(&id).filter(|r| r.is_live()) {
            Some(record) => {
                record.mark_deleted(Utc::now());
                Ok(())
            }
            None => Err(Self::not_found(id).into()),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore<User> {
    async fn find_by_email(&self, email: &str) -> FolioResult<Option<User>> {
        self.calls.finds.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|u| u.is_live() && u.email == email)
            .cloned())
    }
}
