//! In-memory object store, mostly for testing purposes

use super::{
    ByteStream, HealthCheck, ObjectStore, StorageError, StorageResult, ensure_name_safe,
    ensure_range,
};
use crate::models::object::StoredObject;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures::StreamExt;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};

#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, (StoredObject, Bytes)>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects held.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Full payload of an object, if present.
    #[cfg(test)]
    pub fn payload(&self, name: &str) -> Option<Bytes> {
        self.read().get(name).map(|(_, data)| data.clone())
    }

    fn read(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, (StoredObject, Bytes)>> {
        self.objects.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, (StoredObject, Bytes)>> {
        self.objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, name: &str) -> StorageResult<(StoredObject, Bytes)> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound(name.to_string()))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        name: &str,
        mut body: ByteStream<'_>,
        content_type: Option<String>,
    ) -> StorageResult<StoredObject> {
        ensure_name_safe(name)?;

        let mut buf = BytesMut::new();
        let mut digest = md5::Context::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(StorageError::Body)?;
            digest.consume(&chunk);
            buf.extend_from_slice(&chunk);
        }

        let object = StoredObject {
            name: name.to_string(),
            content_type,
            size_bytes: buf.len() as i64,
            etag: Some(format!("{:x}", digest.compute())),
            created_at: Utc::now(),
        };
        self.write()
            .insert(name.to_string(), (object.clone(), buf.freeze()));
        Ok(object)
    }

    async fn head(&self, name: &str) -> StorageResult<StoredObject> {
        self.lookup(name).map(|(object, _)| object)
    }

    async fn get_range(&self, name: &str, start: u64, end: u64) -> StorageResult<Bytes> {
        let (_, data) = self.lookup(name)?;
        ensure_range(name, start, end, data.len() as u64)?;
        Ok(data.slice(start as usize..=end as usize))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        self.write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::ObjectNotFound(name.to_string()))
    }

    async fn presign_read(&self, name: &str, ttl: Duration) -> StorageResult<String> {
        self.lookup(name)?;
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("memory://{}?expires={}", name, expires))
    }

    async fn health_checks(&self) -> Vec<HealthCheck> {
        vec![HealthCheck::from_result("memory", Ok(()))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn body(data: &'static [u8]) -> ByteStream<'static> {
        stream::iter(vec![Ok(Bytes::from_static(data))]).boxed()
    }

    #[tokio::test]
    async fn test_memory_store_basic_operations() {
        let store = MemoryObjectStore::new();
        assert!(store.is_empty());

        store.put("k.zip", body(b"0123456789"), None).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains("k.zip"));
        assert_eq!(store.head("k.zip").await.unwrap().size(), 10);
        assert_eq!(&store.get_range("k.zip", 2, 4).await.unwrap()[..], b"234");

        store.delete("k.zip").await.unwrap();
        assert!(!store.contains("k.zip"));
        assert!(matches!(
            store.delete("k.zip").await,
            Err(StorageError::ObjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_rejects_bad_ranges() {
        let store = MemoryObjectStore::new();
        store.put("k.zip", body(b"abc"), None).await.unwrap();
        assert!(matches!(
            store.get_range("k.zip", 1, 3).await,
            Err(StorageError::RangeUnsatisfiable { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store_presign_requires_object() {
        let store = MemoryObjectStore::new();
        assert!(store.presign_read("x", Duration::from_secs(900)).await.is_err());

        store.put("x", body(b"1"), None).await.unwrap();
        let url = store.presign_read("x", Duration::from_secs(900)).await.unwrap();
        assert!(url.starts_with("memory://x?expires="));
    }
}
