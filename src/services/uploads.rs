//! Upload orchestration: store plain files under fresh names, and store zip
//! archives then list their entries through range reads.

use crate::services::{
    storage::{ByteStream, ObjectStore, StorageResult},
    zip::{self, ZipResult},
};
use tracing::{debug, info};
use uuid::Uuid;

/// Extension of an uploaded file name: everything from the last `.`
/// (inclusive), or nothing when the name has no `.`.
pub fn extension_of(file_name: &str) -> &str {
    file_name.rfind('.').map_or("", |idx| &file_name[idx..])
}

/// Collision-resistant stored name: a v4 UUID plus `extension`.
pub fn unique_name(extension: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension)
}

/// Store a plain file, keeping the extension of its original name.
pub async fn upload_file(
    store: &dyn ObjectStore,
    body: ByteStream<'_>,
    original_name: Option<&str>,
    content_type: Option<String>,
) -> StorageResult<String> {
    let stored_name = unique_name(original_name.map(extension_of).unwrap_or(""));
    let object = store.put(&stored_name, body, content_type).await?;
    info!("uploaded {} ({} bytes)", stored_name, object.size_bytes);
    Ok(stored_name)
}

/// Store a zip archive and list its entries.
///
/// Returns the stored name and the manifest `[stored_name, entries...]`.
/// A listing failure leaves the uploaded archive in place.
pub async fn upload_and_list(
    store: &dyn ObjectStore,
    body: ByteStream<'_>,
    content_type: Option<String>,
) -> ZipResult<(String, Vec<String>)> {
    let stored_name = unique_name(".zip");
    let object = store.put(&stored_name, body, content_type).await?;
    info!("uploaded archive {} ({} bytes)", stored_name, object.size_bytes);

    let image = zip::locate_central_directory(store, &stored_name).await?;
    let entries = zip::list_entries(image.as_bytes())?;
    debug!("archive {} lists {} entries", stored_name, entries.len());

    let mut manifest = Vec::with_capacity(entries.len() + 1);
    manifest.push(stored_name.clone());
    manifest.extend(entries);
    Ok((stored_name, manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        storage::memory::MemoryObjectStore,
        zip::{ZipError, fixtures},
    };
    use bytes::Bytes;
    use futures::{StreamExt, stream};

    fn body(data: Vec<u8>) -> ByteStream<'static> {
        // Split in two chunks so the store sees a real stream.
        let mid = data.len() / 2;
        let data = Bytes::from(data);
        stream::iter(vec![Ok(data.slice(..mid)), Ok(data.slice(mid..))]).boxed()
    }

    #[test]
    fn extensions_come_from_the_last_dot() {
        assert_eq!(extension_of("report.pdf"), ".pdf");
        assert_eq!(extension_of("bundle.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".env"), ".env");
    }

    #[tokio::test]
    async fn plain_upload_keeps_the_extension() {
        let store = MemoryObjectStore::new();
        let name = upload_file(&store, body(b"%PDF-1.7".to_vec()), Some("report.pdf"), None)
            .await
            .unwrap();

        assert!(name.ends_with(".pdf"));
        assert!(Uuid::parse_str(name.trim_end_matches(".pdf")).is_ok());
        assert_eq!(store.payload(&name).unwrap(), Bytes::from_static(b"%PDF-1.7"));
    }

    #[tokio::test]
    async fn archive_manifest_starts_with_the_stored_name() {
        let store = MemoryObjectStore::new();
        let archive = fixtures::archive(&[("report.pdf", "%PDF-1.7 quarterly report"), ("images/", "")]);

        let (stored_name, manifest) =
            upload_and_list(&store, body(archive), Some("application/zip".into()))
                .await
                .unwrap();

        assert!(stored_name.ends_with(".zip"));
        assert_eq!(manifest, vec![stored_name.clone(), "report.pdf".into(), "images".into()]);
        assert_eq!(
            store.head(&stored_name).await.unwrap().content_type.as_deref(),
            Some("application/zip")
        );
    }

    #[tokio::test]
    async fn empty_archive_lists_only_itself() {
        let store = MemoryObjectStore::new();
        let (stored_name, manifest) = upload_and_list(&store, body(fixtures::archive(&[])), None)
            .await
            .unwrap();
        assert_eq!(manifest, vec![stored_name]);
    }

    #[tokio::test]
    async fn malformed_archive_stays_stored() {
        let store = MemoryObjectStore::new();
        let err = upload_and_list(&store, body(vec![0xAB; 30]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ZipError::MalformedArchive(_)));
        assert_eq!(store.len(), 1);
    }
}
