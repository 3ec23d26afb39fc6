//! Request and response bodies for the REST API.

use folio_core::{Article, EntityId, Timestamp, User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// USERS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile change. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Public view of a user. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Timestamp,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub message: String,
    pub data: UserResponse,
}

impl UserEnvelope {
    pub fn new(message: impl Into<String>, user: User) -> Self {
        Self {
            message: message.into(),
            data: user.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub data: UserResponse,
}

// ============================================================================
// ARTICLES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    /// Author email. Defaults to the caller's email.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateArticleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Which layer served a cached read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Database,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Cache => "cache",
            DataSource::Database => "database",
        }
    }
}

impl From<folio_storage::ReadSource> for DataSource {
    fn from(source: folio_storage::ReadSource) -> Self {
        match source {
            folio_storage::ReadSource::Cache => DataSource::Cache,
            folio_storage::ReadSource::Store => DataSource::Database,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleEnvelope {
    pub message: String,
    pub data: Article,
}

/// Single article read through the cache.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CachedArticleEnvelope {
    pub message: String,
    pub source: DataSource,
    pub data: Article,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleListEnvelope {
    pub message: String,
    pub source: DataSource,
    pub data: Vec<Article>,
}

// ============================================================================
// IMAGES AND GENERIC
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
