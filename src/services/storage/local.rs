//! LocalObjectStore: payloads on local disk, metadata and download links in
//! SQLite.
//!
//! Payloads are sharded beneath `base_path/{shard}/{shard}/{name}` where the
//! shards are the first two bytes of MD5(name). Presigned links are rows in
//! `download_links` and are served back by `GET /links/{token}`.

use super::{
    ByteStream, HealthCheck, ObjectStore, StorageError, StorageResult, ensure_name_safe,
    ensure_range,
};
use crate::models::{link::DownloadLink, object::StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use md5::Context;
use sqlx::SqlitePool;
use std::{
    io::{self, ErrorKind, SeekFrom},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct LocalObjectStore {
    /// Shared SQLite connection pool used for metadata and links.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where object payloads are stored.
    pub base_path: PathBuf,

    /// Externally reachable base URL of this service, used in presigned links.
    pub public_url: String,
}

impl LocalObjectStore {
    pub fn new(
        db: Arc<SqlitePool>,
        base_path: impl Into<PathBuf>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            base_path: base_path.into(),
            public_url: public_url.into(),
        }
    }

    /// Two-level shard identifiers for an object name, as lowercase hex.
    fn object_shards(name: &str) -> (String, String) {
        let digest = md5::compute(name);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Fully-qualified payload path. Parent directories may not exist yet.
    fn object_path(&self, name: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::object_shards(name);
        let mut path = self.base_path.clone();
        path.push(shard_a);
        path.push(shard_b);
        path.push(name);
        path
    }

    async fn fetch_object(&self, name: &str) -> StorageResult<StoredObject> {
        sqlx::query_as::<_, StoredObject>(
            "SELECT name, content_type, size_bytes, etag, created_at
             FROM objects WHERE name = ?",
        )
        .bind(name)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StorageError::ObjectNotFound(name.to_string()),
            other => StorageError::Sqlx(other),
        })
    }

    async fn open_payload(&self, name: &str) -> StorageResult<File> {
        File::open(self.object_path(name)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StorageError::ObjectNotFound(name.to_string())
            } else {
                StorageError::Io(err)
            }
        })
    }

    /// Resolve a presigned link token to the object it grants and an open
    /// payload handle. Expired links are removed on sight.
    pub async fn open_link(&self, token: Uuid) -> StorageResult<(StoredObject, File)> {
        let link = sqlx::query_as::<_, DownloadLink>(
            "SELECT object_name, expires_at FROM download_links WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StorageError::LinkNotFound)?;

        if link.is_expired(Utc::now()) {
            sqlx::query("DELETE FROM download_links WHERE token = ?")
                .bind(token)
                .execute(&*self.db)
                .await?;
            debug!("download link {} expired at {}", token, link.expires_at);
            return Err(StorageError::LinkExpired);
        }

        let object = self.fetch_object(&link.object_name).await?;
        let file = self.open_payload(&link.object_name).await?;
        Ok((object, file))
    }

    /// Remove empty shard directories from `start` up to (excluding) `stop`.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }

    async fn check_sqlite(&self) -> Result<(), String> {
        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await
        {
            Ok(1) => Ok(()),
            Ok(v) => Err(format!("unexpected result: {}", v)),
            Err(e) => Err(format!("error: {}", e)),
        }
    }

    async fn check_disk(&self) -> Result<(), String> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("could not create storage dir: {}", e))?;
        let tmp_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&tmp_path, b"readyz")
            .await
            .map_err(|e| format!("could not write tmp file: {}", e))?;
        let read = fs::read(&tmp_path).await;
        let removed = fs::remove_file(&tmp_path).await;
        match read {
            Ok(bytes) if bytes == b"readyz" => {
                removed.map_err(|e| format!("could not remove tmp file: {}", e))
            }
            Ok(_) => Err("file content mismatch".to_string()),
            Err(e) => Err(format!("could not read tmp file: {}", e)),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    /// Stream the body to a temp file, fsync, rename into place, then upsert
    /// the metadata row. Temp files are removed on any error.
    async fn put(
        &self,
        name: &str,
        mut body: ByteStream<'_>,
        content_type: Option<String>,
    ) -> StorageResult<StoredObject> {
        ensure_name_safe(name)?;

        let file_path = self.object_path(name);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: i64 = 0;
        let mut digest = Context::new();
        while let Some(chunk_res) = body.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(StorageError::Body(err));
                }
            };
            size_bytes += chunk.len() as i64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }

        let etag = format!("{:x}", digest.compute());
        let inserted = sqlx::query_as::<_, StoredObject>(
            r#"
            INSERT INTO objects (name, content_type, size_bytes, etag, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                created_at = excluded.created_at
            RETURNING name, content_type, size_bytes, etag, created_at
            "#,
        )
        .bind(name)
        .bind(content_type)
        .bind(size_bytes)
        .bind(&etag)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        match inserted {
            Ok(object) => {
                debug!("stored {} ({} bytes) at {}", name, size_bytes, file_path.display());
                Ok(object)
            }
            Err(err) => {
                let _ = fs::remove_file(&file_path).await;
                Err(StorageError::Sqlx(err))
            }
        }
    }

    async fn head(&self, name: &str) -> StorageResult<StoredObject> {
        ensure_name_safe(name)?;
        self.fetch_object(name).await
    }

    async fn get_range(&self, name: &str, start: u64, end: u64) -> StorageResult<Bytes> {
        let object = self.head(name).await?;
        ensure_range(name, start, end, object.size())?;

        let mut file = self.open_payload(name).await?;
        file.seek(SeekFrom::Start(start)).await?;
        let mut buf = vec![0u8; (end - start + 1) as usize];
        file.read_exact(&mut buf).await.map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                StorageError::Unavailable(format!("payload of `{}` is shorter than its metadata", name))
            } else {
                StorageError::Io(err)
            }
        })?;
        Ok(Bytes::from(buf))
    }

    /// Remove metadata, links and payload, then prune empty shard directories.
    async fn delete(&self, name: &str) -> StorageResult<()> {
        ensure_name_safe(name)?;

        let result = sqlx::query("DELETE FROM objects WHERE name = ?")
            .bind(name)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::ObjectNotFound(name.to_string()));
        }
        sqlx::query("DELETE FROM download_links WHERE object_name = ?")
            .bind(name)
            .execute(&*self.db)
            .await?;

        let file_path = self.object_path(name);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed physical file {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("file {} already missing", file_path.display());
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent, &self.base_path).await;
        }

        Ok(())
    }

    async fn presign_read(&self, name: &str, ttl: Duration) -> StorageResult<String> {
        ensure_name_safe(name)?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|err| StorageError::Unavailable(format!("invalid link ttl: {}", err)))?;
        let now = Utc::now();
        let token = Uuid::new_v4();

        // Dead links are never served again.
        let swept = sqlx::query("DELETE FROM download_links WHERE expires_at <= ?")
            .bind(now)
            .execute(&*self.db)
            .await?
            .rows_affected();
        if swept > 0 {
            debug!("swept {} expired download links", swept);
        }

        sqlx::query(
            "INSERT INTO download_links (token, object_name, expires_at, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(name)
        .bind(now + ttl)
        .bind(now)
        .execute(&*self.db)
        .await?;

        Ok(format!(
            "{}/links/{}",
            self.public_url.trim_end_matches('/'),
            token
        ))
    }

    async fn health_checks(&self) -> Vec<HealthCheck> {
        vec![
            HealthCheck::from_result("sqlite", self.check_sqlite().await),
            HealthCheck::from_result("disk", self.check_disk().await),
        ]
    }
}
