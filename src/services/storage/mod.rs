//! Object store interface consumed by the upload, download and zip listing paths.
//!
//! Two adapters ship with the service:
//! - [`local::LocalObjectStore`] keeps payloads on disk and metadata in SQLite.
//! - [`memory::MemoryObjectStore`] keeps everything in process, mostly for tests.
//!
//! Callers hold an `Arc<dyn ObjectStore>` so the adapter is picked once at start-up.

use crate::models::object::StoredObject;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;
use std::{io, time::Duration};
use thiserror::Error;

pub mod local;
pub mod memory;

/// Sequential body of an object being written. Errors yielded by the stream
/// surface from `put` as [`StorageError::Body`].
pub type ByteStream<'a> = BoxStream<'a, io::Result<Bytes>>;

const MAX_OBJECT_NAME_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object `{0}` not found")]
    ObjectNotFound(String),
    #[error("range {start}-{end} is not satisfiable for `{name}` ({size} bytes)")]
    RangeUnsatisfiable {
        name: String,
        start: u64,
        end: u64,
        size: u64,
    },
    #[error("invalid object name")]
    InvalidObjectName,
    #[error("download link not found")]
    LinkNotFound,
    #[error("download link has expired")]
    LinkExpired,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The body being written failed to arrive; the store itself is fine.
    #[error("upload body could not be read: {0}")]
    Body(io::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of one readiness probe run by a store.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub ok: bool,
    pub error: Option<String>,
}

impl HealthCheck {
    pub fn from_result(name: &'static str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self {
                name,
                ok: true,
                error: None,
            },
            Err(error) => Self {
                name,
                ok: false,
                error: Some(error),
            },
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `name`, replacing any existing object.
    async fn put(
        &self,
        name: &str,
        body: ByteStream<'_>,
        content_type: Option<String>,
    ) -> StorageResult<StoredObject>;

    /// Metadata only; `ObjectNotFound` when absent.
    async fn head(&self, name: &str) -> StorageResult<StoredObject>;

    /// Read the inclusive byte range `[start, end]`.
    async fn get_range(&self, name: &str, start: u64, end: u64) -> StorageResult<Bytes>;

    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// Issue a URL granting read access to `name` for `ttl`.
    async fn presign_read(&self, name: &str, ttl: Duration) -> StorageResult<String>;

    async fn health_checks(&self) -> Vec<HealthCheck> {
        Vec::new()
    }
}

/// Reject names that could escape the storage root or break path handling.
pub(crate) fn ensure_name_safe(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.len() > MAX_OBJECT_NAME_LEN {
        return Err(StorageError::InvalidObjectName);
    }
    if name.starts_with('/') || name.split('/').any(|part| part == ".." || part == ".") {
        return Err(StorageError::InvalidObjectName);
    }
    if name
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(StorageError::InvalidObjectName);
    }
    Ok(())
}

/// Validate an inclusive range against an object size.
pub(crate) fn ensure_range(name: &str, start: u64, end: u64, size: u64) -> StorageResult<()> {
    if start > end || end >= size {
        return Err(StorageError::RangeUnsatisfiable {
            name: name.to_string(),
            start,
            end,
            size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_names_are_rejected() {
        for name in ["", "/abs.zip", "a/../b", "..", "a/./b", "bad\\name", "tab\tname"] {
            assert!(
                matches!(ensure_name_safe(name), Err(StorageError::InvalidObjectName)),
                "{name:?} should be rejected"
            );
        }
        assert!(ensure_name_safe(&"x".repeat(MAX_OBJECT_NAME_LEN + 1)).is_err());
        assert!(ensure_name_safe("3f2a.zip").is_ok());
        assert!(ensure_name_safe("3f2a/report.pdf").is_ok());
        assert!(ensure_name_safe("3f2a/notes..v2.txt").is_ok());
        assert!(ensure_name_safe("3f2a/..hidden").is_ok());
    }

    #[test]
    fn ranges_must_fit_inside_the_object() {
        assert!(ensure_range("a", 0, 9, 10).is_ok());
        assert!(ensure_range("a", 9, 9, 10).is_ok());
        assert!(matches!(
            ensure_range("a", 5, 10, 10),
            Err(StorageError::RangeUnsatisfiable { size: 10, .. })
        ));
        assert!(ensure_range("a", 4, 3, 10).is_err());
        assert!(ensure_range("a", 0, 0, 0).is_err());
    }
}
