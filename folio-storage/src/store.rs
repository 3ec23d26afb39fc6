//! Credential store traits.

use async_trait::async_trait;
use folio_core::{Entity, EntityId, FolioResult, User};

/// CRUD over one kind of soft-deletable record.
///
/// Reads never return soft-deleted rows. `update` and `delete` fail with
/// `StorageError::NotFound` when the id does not name a live record.
#[async_trait]
pub trait Store<T: Entity>: Send + Sync {
    async fn create(&self, new: T::New) -> FolioResult<T>;

    async fn find_by_id(&self, id: EntityId) -> FolioResult<Option<T>>;

    /// All live records, ordered by id.
    async fn list(&self) -> FolioResult<Vec<T>>;

    async fn update(&self, id: EntityId, update: T::Update) -> FolioResult<T>;

    async fn delete(&self, id: EntityId) -> FolioResult<()>;
}

/// User lookups needed by signup, login and the auth gate.
#[async_trait]
pub trait UserStore: Store<User> {
    async fn find_by_email(&self, email: &str) -> FolioResult<Option<User>>;
}
