//! Shared application state for Axum routers.

use std::sync::Arc;

use folio_core::Article;
use folio_storage::{CachedStore, ImageBucket, UserStore};

use crate::auth::AuthConfig;
use crate::routes::health::HealthState;

/// Article access: CRUD on the store, reads through the cache.
pub type ArticleService = CachedStore<Article>;

/// Application-wide state shared across all routes.
///
/// Every backend arrives as a trait object or handle, so the binary wires
/// Postgres, Redis and S3 while tests wire in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub articles: Arc<ArticleService>,
    pub images: ImageBucket,
    pub auth: Arc<AuthConfig>,
    pub health: HealthState,
}

crate::impl_from_ref!(Arc<dyn UserStore>, users);
crate::impl_from_ref!(Arc<ArticleService>, articles);
crate::impl_from_ref!(ImageBucket, images);
crate::impl_from_ref!(Arc<AuthConfig>, auth);
crate::impl_from_ref!(HealthState, health);
