//! Locate and fetch the central directory of a stored archive.

use super::{
    ZipResult, fetch, malformed,
    structures::{EOCD_SIZE, EndOfCentralDirectory},
};
use crate::services::storage::ObjectStore;
use bytes::{Bytes, BytesMut};
use tracing::debug;

/// Central directory bytes followed by the EOCD record.
///
/// This is a self-contained zip trailer: an ordinary zip reader handed these
/// bytes as if they were a whole file can enumerate every entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryImage(Bytes);

impl CentralDirectoryImage {
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Read an archive's central directory with two range requests.
///
/// The EOCD is assumed to be the last 22 bytes. Its CD offset and size must
/// place the CD directly in front of it; anything else is `MalformedArchive`.
pub async fn locate_central_directory(
    store: &dyn ObjectStore,
    name: &str,
) -> ZipResult<CentralDirectoryImage> {
    let size = store.head(name).await?.size();
    if size < EOCD_SIZE as u64 {
        return Err(malformed(format!(
            "`{}` is {} bytes, too small to hold an end of central directory record",
            name, size
        )));
    }

    let eocd_offset = size - EOCD_SIZE as u64;
    let eocd_bytes = fetch(store, name, eocd_offset, EOCD_SIZE as u64).await?;
    let eocd = EndOfCentralDirectory::from_bytes(&eocd_bytes)?;
    eocd.ensure_supported()?;

    let cd_start = u64::from(eocd.cd_offset);
    let cd_size = u64::from(eocd.cd_size);
    if cd_start + cd_size != eocd_offset {
        return Err(malformed(format!(
            "central directory at {}..{} does not end at the trailer offset {}",
            cd_start,
            cd_start + cd_size,
            eocd_offset
        )));
    }

    let cd = fetch(store, name, cd_start, cd_size).await?;
    debug!(
        "located central directory of {}: {} entries, {} bytes at offset {}",
        name, eocd.total_entries, cd_size, cd_start
    );

    let mut image = BytesMut::with_capacity(cd.len() + eocd_bytes.len());
    image.extend_from_slice(&cd);
    image.extend_from_slice(&eocd_bytes);
    Ok(CentralDirectoryImage::new(image.freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        storage::{StorageError, memory::MemoryObjectStore},
        zip::{ZipError, fixtures},
    };
    use futures::{StreamExt, stream};

    async fn stored(data: Vec<u8>) -> MemoryObjectStore {
        let store = MemoryObjectStore::new();
        store
            .put("a.zip", stream::iter(vec![Ok(Bytes::from(data))]).boxed(), None)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn image_equals_the_archive_tail() {
        let archive = fixtures::archive(&[("a.txt", "alpha"), ("dir/", ""), ("dir/b.txt", "beta")]);
        let store = stored(archive.clone()).await;

        let image = locate_central_directory(&store, "a.zip").await.unwrap();

        let eocd = EndOfCentralDirectory::from_bytes(&archive[archive.len() - EOCD_SIZE..]).unwrap();
        assert_eq!(image.as_bytes(), &archive[eocd.cd_offset as usize..]);
        assert_eq!(image.as_bytes().len(), eocd.cd_size as usize + EOCD_SIZE);
    }

    #[tokio::test]
    async fn empty_archive_is_just_the_trailer() {
        let archive = fixtures::archive(&[]);
        assert_eq!(archive.len(), EOCD_SIZE);
        let store = stored(archive.clone()).await;

        let image = locate_central_directory(&store, "a.zip").await.unwrap();
        assert_eq!(image.as_bytes(), &archive[..]);
    }

    #[tokio::test]
    async fn non_zip_blob_is_malformed() {
        let store = stored(b"this is definitely not a zip!!".to_vec()).await;
        assert!(matches!(
            locate_central_directory(&store, "a.zip").await,
            Err(ZipError::MalformedArchive(_))
        ));
    }

    #[tokio::test]
    async fn tiny_object_is_malformed() {
        let store = stored(vec![0x50, 0x4b]).await;
        assert!(matches!(
            locate_central_directory(&store, "a.zip").await,
            Err(ZipError::MalformedArchive(_))
        ));
    }

    #[tokio::test]
    async fn commented_archive_is_malformed() {
        let archive = fixtures::with_comment(fixtures::archive(&[("a.txt", "alpha")]), b"hi");
        let store = stored(archive).await;
        assert!(matches!(
            locate_central_directory(&store, "a.zip").await,
            Err(ZipError::MalformedArchive(_))
        ));
    }

    #[tokio::test]
    async fn misplaced_central_directory_is_malformed() {
        let mut archive = fixtures::archive(&[("a.txt", "alpha")]);
        let len = archive.len();
        let cd_offset = u32::from_le_bytes(archive[len - 6..len - 2].try_into().unwrap());
        archive[len - 6..len - 2].copy_from_slice(&(cd_offset - 1).to_le_bytes());
        let store = stored(archive).await;

        assert!(matches!(
            locate_central_directory(&store, "a.zip").await,
            Err(ZipError::MalformedArchive(_))
        ));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            locate_central_directory(&store, "a.zip").await,
            Err(ZipError::Storage(StorageError::ObjectNotFound(_)))
        ));
    }
}
