//! User and article records plus their create/update payloads.

use crate::{EntityId, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of records the service stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Article,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Article => "article",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted record with a numeric id, soft-delete marker and typed
/// create/update payloads.
///
/// `build`, `apply` and `mark_deleted` describe how a store materializes the
/// payloads; SQL-backed stores express the same rules in their statements.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type New: Clone + Send + Sync + 'static;
    type Update: Clone + Send + Sync + 'static;

    const ENTITY_TYPE: EntityType;

    fn id(&self) -> EntityId;

    fn deleted_at(&self) -> Option<Timestamp>;

    fn build(id: EntityId, new: Self::New, at: Timestamp) -> Self;

    fn apply(&mut self, update: Self::Update, at: Timestamp);

    fn mark_deleted(&mut self, at: Timestamp);

    /// Field that must be unique among live records, as `(field, value)`.
    fn unique_field(&self) -> Option<(&'static str, &str)> {
        None
    }

    fn is_live(&self) -> bool {
        self.deleted_at().is_none()
    }
}

// ============================================================================
// USERS
// ============================================================================

/// A registered account. `password_hash` is an argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile change; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Entity for User {
    type New = NewUser;
    type Update = UserUpdate;

    const ENTITY_TYPE: EntityType = EntityType::User;

    fn id(&self) -> EntityId {
        self.id
    }

    fn deleted_at(&self) -> Option<Timestamp> {
        self.deleted_at
    }

    fn build(id: EntityId, new: NewUser, at: Timestamp) -> Self {
        User {
            id,
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    fn apply(&mut self, update: UserUpdate, at: Timestamp) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        self.updated_at = at;
    }

    fn mark_deleted(&mut self, at: Timestamp) {
        self.deleted_at = Some(at);
    }

    fn unique_field(&self) -> Option<(&'static str, &str)> {
        Some(("email", &self.email))
    }
}

// ============================================================================
// ARTICLES
// ============================================================================

/// A piece of content. `email` names the author but is not a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Article {
    pub id: EntityId,
    pub email: String,
    pub title: String,
    pub content: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub deleted_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub email: String,
    pub title: String,
    pub content: String,
}

/// Title/content change; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl Entity for Article {
    type New = NewArticle;
    type Update = ArticleUpdate;

    const ENTITY_TYPE: EntityType = EntityType::Article;

    fn id(&self) -> EntityId {
        self.id
    }

    fn deleted_at(&self) -> Option<Timestamp> {
        self.deleted_at
    }

    fn build(id: EntityId, new: NewArticle, at: Timestamp) -> Self {
        Article {
            id,
            email: new.email,
            title: new.title,
            content: new.content,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    fn apply(&mut self, update: ArticleUpdate, at: Timestamp) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        self.updated_at = at;
    }

    fn mark_deleted(&mut self, at: Timestamp) {
        self.deleted_at = Some(at);
    }
}
