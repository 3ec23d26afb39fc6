//! Folio Core - Entity Types
//!
//! Pure data structures and the error taxonomy shared by every Folio crate.
//! No I/O happens here.

pub mod entities;
pub mod error;
pub mod image;

pub use entities::*;
pub use error::*;
pub use image::ImageKey;

use chrono::{DateTime, Utc};

/// Database-assigned, auto-incrementing record identifier.
pub type EntityId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
