//! Folio Test Utilities
//!
//! Shared test infrastructure for the Folio workspace:
//! - Proptest generators for users, articles and tokens
//! - Test fixtures for common records
//! - In-memory backends wired together the way the server wires the real ones

use std::sync::Arc;

// Re-export the in-memory doubles from their source crate
pub use folio_storage::{
    CacheBackend, CacheConfig, CachedStore, ImageBucket, InMemoryCacheBackend, InMemoryStore,
    ReadThroughCache, Store, UserStore,
};

// Re-export core types for convenience
pub use folio_core::{
    Article, ArticleUpdate, EntityId, EntityType, FolioError, FolioResult, ImageKey, NewArticle,
    NewUser, StorageError, Timestamp, User, UserUpdate,
};

// ============================================================================
// IN-MEMORY BACKENDS
// ============================================================================

/// Every backing service the API needs, in memory.
///
/// The concrete handles stay reachable so tests can inject faults and read
/// call counters after driving requests through the router.
#[derive(Clone)]
pub struct InMemoryBackends {
    pub users: Arc<InMemoryStore<User>>,
    pub articles: Arc<InMemoryStore<Article>>,
    pub cache: Arc<InMemoryCacheBackend>,
    pub images: ImageBucket,
}

impl Default for InMemoryBackends {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackends {
    pub fn new() -> Self {
        Self {
            users: Arc::new(InMemoryStore::new()),
            articles: Arc::new(InMemoryStore::new()),
            cache: Arc::new(InMemoryCacheBackend::new()),
            images: ImageBucket::in_memory("images"),
        }
    }

    /// Article store behind the read-through cache, with default TTLs.
    pub fn cached_articles(&self) -> CachedStore<Article> {
        self.cached_articles_with(CacheConfig::default())
    }

    pub fn cached_articles_with(&self, config: CacheConfig) -> CachedStore<Article> {
        let cache = ReadThroughCache::new(self.cache.clone(), config);
        CachedStore::new(self.articles.clone(), cache)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made payloads for tests that do not care about the values.

    use super::*;

    pub const TEST_PASSWORD: &str = "correct horse battery staple";

    pub fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            // Not a real argon2 hash; stores never inspect it.
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$fixture$fixture".to_string(),
        }
    }

    pub fn new_article(email: &str, title: &str) -> NewArticle {
        NewArticle {
            email: email.to_string(),
            title: title.to_string(),
            content: format!("Body of {}", title),
        }
    }

    pub fn title_update(title: &str) -> ArticleUpdate {
        ArticleUpdate {
            title: Some(title.to_string()),
            content: None,
        }
    }

    /// JSON body accepted by `POST /signup`.
    pub fn signup_body(name: &str, email: &str, password: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "email": email,
            "password": password,
        })
    }

    pub fn login_body(email: &str, password: &str) -> serde_json::Value {
        serde_json::json!({
            "email": email,
            "password": password,
        })
    }

    pub fn article_body(title: &str, content: &str) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "content": content,
        })
    }

    /// Seed `count` articles and return them in creation order.
    pub async fn seed_articles(
        store: &InMemoryStore<Article>,
        email: &str,
        count: usize,
    ) -> FolioResult<Vec<Article>> {
        let mut created = Vec::with_capacity(count);
        for i in 0..count {
            created.push(store.create(new_article(email, &format!("article {}", i))).await?);
        }
        Ok(created)
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Folio inputs.

    use super::*;
    use proptest::prelude::*;

    /// Display names: letters and spaces, never blank.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z ]{0,30}"
    }

    /// Syntactically plausible email addresses.
    pub fn arb_email() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9.]{0,15}", "[a-z]{2,10}", prop_oneof!["com", "org", "net", "io"])
            .prop_map(|(local, domain, tld)| format!("{}@{}.{}", local, domain, tld))
    }

    pub fn arb_password() -> impl Strategy<Value = String> {
        "[ -~]{1,64}"
    }

    pub fn arb_title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ,.!?-]{0,80}"
    }

    pub fn arb_content() -> impl Strategy<Value = String> {
        "[ -~\n]{1,500}"
    }

    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        1i64..1_000_000
    }

    /// Timestamps between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now)
        })
    }

    pub fn arb_new_user() -> impl Strategy<Value = NewUser> {
        (arb_name(), arb_email())
            .prop_map(|(name, email)| fixtures::new_user(&name, &email))
    }

    pub fn arb_new_article() -> impl Strategy<Value = NewArticle> {
        (arb_email(), arb_title(), arb_content()).prop_map(|(email, title, content)| NewArticle {
            email,
            title,
            content,
        })
    }

    pub fn arb_article_update() -> impl Strategy<Value = ArticleUpdate> {
        (
            proptest::option::of(arb_title()),
            proptest::option::of(arb_content()),
        )
            .prop_map(|(title, content)| ArticleUpdate { title, content })
    }

    /// Strings that are never a valid signed JWT: random text, truncated
    /// three-part shapes, and unsigned tokens.
    pub fn arb_garbage_token() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Za-z0-9_-]{0,120}",
            ("[A-Za-z0-9_-]{1,40}", "[A-Za-z0-9_-]{1,40}")
                .prop_map(|(a, b)| format!("{}.{}", a, b)),
            ("[A-Za-z0-9_-]{1,40}", "[A-Za-z0-9_-]{1,40}", "[A-Za-z0-9_-]{1,40}")
                .prop_map(|(a, b, c)| format!("{}.{}.{}", a, b, c)),
            "[A-Za-z0-9_-]{1,60}".prop_map(|payload| format!(
                "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.",
                payload
            )),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_seed_articles_in_order() {
        let backends = InMemoryBackends::new();
        let seeded = fixtures::seed_articles(&backends.articles, "a@example.com", 3)
            .await
            .unwrap();
        let ids: Vec<EntityId> = seeded.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(backends.articles.create_calls(), 3);
    }

    proptest! {
        #[test]
        fn prop_generated_emails_have_one_at(email in generators::arb_email()) {
            prop_assert_eq!(email.matches('@').count(), 1);
        }

        #[test]
        fn prop_generated_names_are_not_blank(name in generators::arb_name()) {
            prop_assert!(!name.trim().is_empty());
        }
    }
}
