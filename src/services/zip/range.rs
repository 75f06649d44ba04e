//! Byte-range reads against the object store.

use super::ZipResult;
use crate::services::storage::{ObjectStore, StorageError};
use bytes::Bytes;

/// Fetch exactly `length` bytes of `name` starting at `start`.
///
/// The store is asked for the inclusive range `[start, start + length - 1]`.
/// A reply of any other length is treated as a storage failure. Nothing is
/// retried.
pub async fn fetch(
    store: &dyn ObjectStore,
    name: &str,
    start: u64,
    length: u64,
) -> ZipResult<Bytes> {
    if length == 0 {
        return Ok(Bytes::new());
    }
    let end = start
        .checked_add(length - 1)
        .ok_or_else(|| StorageError::RangeUnsatisfiable {
            name: name.to_string(),
            start,
            end: u64::MAX,
            size: 0,
        })?;

    let bytes = store.get_range(name, start, end).await?;
    if bytes.len() as u64 != length {
        return Err(StorageError::Unavailable(format!(
            "range {}-{} of `{}` returned {} bytes, expected {}",
            start,
            end,
            name,
            bytes.len(),
            length
        ))
        .into());
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        storage::memory::MemoryObjectStore,
        zip::{ZipError, fixtures},
    };
    use futures::{StreamExt, stream};

    async fn stored(store: &MemoryObjectStore, name: &str, data: Vec<u8>) {
        store
            .put(name, stream::iter(vec![Ok(Bytes::from(data))]).boxed(), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn tail_fetch_matches_the_last_22_bytes() {
        let store = MemoryObjectStore::new();
        let archive = fixtures::archive(&[("a.txt", "alpha"), ("dir/", ""), ("dir/b.txt", "beta")]);
        stored(&store, "t.zip", archive.clone()).await;

        let size = archive.len() as u64;
        let tail = fetch(&store, "t.zip", size - 22, 22).await.unwrap();
        assert_eq!(&tail[..], &archive[archive.len() - 22..]);
    }

    #[tokio::test]
    async fn zero_length_fetch_skips_the_store() {
        let store = MemoryObjectStore::new();
        assert!(fetch(&store, "absent", 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn errors_carry_the_storage_kind() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            fetch(&store, "absent", 0, 4).await,
            Err(ZipError::Storage(StorageError::ObjectNotFound(_)))
        ));

        stored(&store, "small", vec![0; 8]).await;
        assert!(matches!(
            fetch(&store, "small", 4, 5).await,
            Err(ZipError::Storage(StorageError::RangeUnsatisfiable { .. }))
        ));
    }
}
