//! Metadata of an object held by the configured store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored blob. The payload itself lives in the store; this is only what
/// `head` reports about it.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct StoredObject {
    /// Unique key the object is stored under (e.g. `<uuid>.zip`).
    pub name: String,

    /// MIME type supplied at upload time.
    pub content_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: i64,

    /// Hex MD5 of the payload.
    pub etag: Option<String>,

    /// When the current payload was written.
    pub created_at: DateTime<Utc>,
}

impl StoredObject {
    pub fn size(&self) -> u64 {
        self.size_bytes.max(0) as u64
    }
}
