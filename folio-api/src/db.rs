//! Database Connection Pool and Postgres Stores
//!
//! `DbClient` wraps a deadpool-postgres pool. `PgUserStore` and
//! `PgArticleStore` implement the storage traits with plain SQL; soft
//! deletes set `deleted_at` and every read filters it out.

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use folio_core::{
    Article, ArticleUpdate, ConfigError, EntityId, EntityType, FolioError, FolioResult, NewArticle,
    NewUser, StorageError, User, UserUpdate,
};
use folio_storage::{Store, UserStore};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// DATABASE CONFIGURATION
// ============================================================================

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Connection string, as a `postgres://` URL or `key=value` pairs.
    pub url: String,
    /// Maximum pool size
    pub max_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres@localhost:5432/folio".to_string(),
            max_size: 16,
        }
    }
}

impl DbConfig {
    /// Read `FOLIO_DATABASE_URL` (required) and `FOLIO_DB_POOL_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("FOLIO_DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "FOLIO_DATABASE_URL".to_string(),
            })?;

        let max_size = match std::env::var("FOLIO_DB_POOL_SIZE") {
            Ok(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    field: "FOLIO_DB_POOL_SIZE".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            Err(_) => Self::default().max_size,
        };

        Ok(Self { url, max_size })
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.url = Some(self.url.clone());
        cfg.pool = Some(PoolConfig::new(self.max_size));
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    name          TEXT        NOT NULL,
    email         TEXT        NOT NULL,
    password_hash TEXT        NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at    TIMESTAMPTZ
);
CREATE UNIQUE INDEX IF NOT EXISTS users_email_live_idx ON users (email) WHERE deleted_at IS NULL;
CREATE INDEX IF NOT EXISTS users_deleted_at_idx ON users (deleted_at);

CREATE TABLE IF NOT EXISTS articles (
    id         BIGSERIAL PRIMARY KEY,
    email      TEXT        NOT NULL,
    title      TEXT        NOT NULL,
    content    TEXT        NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS articles_deleted_at_idx ON articles (deleted_at);
"#;

/// Pooled Postgres client shared by the stores.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> FolioResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            tracing::error!("Connection pool error: {:?}", e);
            StorageError::Backend {
                reason: format!("Failed to acquire database connection: {}", e),
            }
            .into()
        })
    }

    /// Create tables and indexes if they are missing.
    pub async fn ensure_schema(&self) -> FolioResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA).await.map_err(backend_error)?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    /// `SELECT 1` round-trip.
    pub async fn ping(&self) -> FolioResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(backend_error)?;
        Ok(())
    }
}

fn backend_error(e: tokio_postgres::Error) -> FolioError {
    tracing::error!("Database error: {:?}", e);
    StorageError::Backend {
        reason: e.to_string(),
    }
    .into()
}

/// Map a unique violation on `field` to `Duplicate`, anything else to
/// `Backend`.
fn write_error(
    e: tokio_postgres::Error,
    entity_type: EntityType,
    field: &str,
    value: &str,
) -> FolioError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        return StorageError::Duplicate {
            entity_type,
            field: field.to_string(),
            value: value.to_string(),
        }
        .into();
    }
    backend_error(e)
}

fn not_found(entity_type: EntityType, id: EntityId) -> FolioError {
    StorageError::NotFound { entity_type, id }.into()
}

// ============================================================================
// USERS
// ============================================================================

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at, deleted_at";

fn user_from_row(row: &Row) -> FolioResult<User> {
    let read = || -> Result<User, tokio_postgres::Error> {
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    };
    read().map_err(backend_error)
}

#[derive(Clone)]
pub struct PgUserStore {
    db: DbClient,
}

impl PgUserStore {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store<User> for PgUserStore {
    async fn create(&self, new: NewUser) -> FolioResult<User> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let row = conn
            .query_one(&sql, &[&new.name, &new.email, &new.password_hash])
            .await
            .map_err(|e| write_error(e, EntityType::User, "email", &new.email))?;
        user_from_row(&row)
    }

    async fn find_by_id(&self, id: EntityId) -> FolioResult<Option<User>> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let row = conn.query_opt(&sql, &[&id]).await.map_err(backend_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> FolioResult<Vec<User>> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM users WHERE deleted_at IS NULL ORDER BY id",
            USER_COLUMNS
        );
        let rows = conn.query(&sql, &[]).await.map_err(backend_error)?;
        rows.iter().map(user_from_row).collect()
    }

    async fn update(&self, id: EntityId, update: UserUpdate) -> FolioResult<User> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             updated_at = now() WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            USER_COLUMNS
        );
        let email = update.email.clone().unwrap_or_default();
        let row = conn
            .query_opt(&sql, &[&id, &update.name, &update.email])
            .await
            .map_err(|e| write_error(e, EntityType::User, "email", &email))?;
        match row {
            Some(row) => user_from_row(&row),
            None => Err(not_found(EntityType::User, id)),
        }
    }

    async fn delete(&self, id: EntityId) -> FolioResult<()> {
        let conn = self.db.get_conn().await?;
        let affected = conn
            .execute(
                "UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
                &[&id],
            )
            .await
            .map_err(backend_error)?;
        if affected == 0 {
            return Err(not_found(EntityType::User, id));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> FolioResult<Option<User>> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&email])
            .await
            .map_err(backend_error)?;
        row.as_ref().map(user_from_row).transpose()
    }
}

// ============================================================================
// ARTICLES
// ============================================================================

const ARTICLE_COLUMNS: &str = "id, email, title, content, created_at, updated_at, deleted_at";

fn article_from_row(row: &Row) -> FolioResult<Article> {
    let read = || -> Result<Article, tokio_postgres::Error> {
        Ok(Article {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    };
    read().map_err(backend_error)
}

#[derive(Clone)]
pub struct PgArticleStore {
    db: DbClient,
}

impl PgArticleStore {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store<Article> for PgArticleStore {
    async fn create(&self, new: NewArticle) -> FolioResult<Article> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "INSERT INTO articles (email, title, content) VALUES ($1, $2, $3) RETURNING {}",
            ARTICLE_COLUMNS
        );
        let row = conn
            .query_one(&sql, &[&new.email, &new.title, &new.content])
            .await
            .map_err(backend_error)?;
        article_from_row(&row)
    }

    async fn find_by_id(&self, id: EntityId) -> FolioResult<Option<Article>> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM articles WHERE id = $1 AND deleted_at IS NULL",
            ARTICLE_COLUMNS
        );
        let row = conn.query_opt(&sql, &[&id]).await.map_err(backend_error)?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn list(&self) -> FolioResult<Vec<Article>> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM articles WHERE deleted_at IS NULL ORDER BY id",
            ARTICLE_COLUMNS
        );
        let rows = conn.query(&sql, &[]).await.map_err(backend_error)?;
        rows.iter().map(article_from_row).collect()
    }

    async fn update(&self, id: EntityId, update: ArticleUpdate) -> FolioResult<Article> {
        let conn = self.db.get_conn().await?;
        let sql = format!(
            "UPDATE articles SET title = COALESCE($2, title), content = COALESCE($3, content), \
             updated_at = now() WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            ARTICLE_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&id, &update.title, &update.content])
            .await
            .map_err(backend_error)?;
        match row {
            Some(row) => article_from_row(&row),
            None => Err(not_found(EntityType::Article, id)),
        }
    }

    async fn delete(&self, id: EntityId) -> FolioResult<()> {
        let conn = self.db.get_conn().await?;
        let affected = conn
            .execute(
                "UPDATE articles SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
                &[&id],
            )
            .await
            .map_err(backend_error)?;
        if affected == 0 {
            return Err(not_found(EntityType::Article, id));
        }
        Ok(())
    }
}
