//! Zip central-directory listing over range reads.
//!
//! A zip archive ends with an End of Central Directory (EOCD) record that
//! points at the Central Directory (CD), which names every entry. Listing an
//! archive therefore only needs two range reads against the store:
//!
//! 1. the fixed 22-byte EOCD at the very end of the object,
//! 2. the CD it points at.
//!
//! [`locator`] performs those reads and assembles `CD + EOCD` into a
//! [`locator::CentralDirectoryImage`]; [`lister`] parses that image into entry names.
//!
//! Archive comments, Zip64 and multi-disk archives are rejected as malformed.

pub mod decoder;
pub mod lister;
pub mod locator;
pub mod range;
pub mod structures;

pub use decoder::decode_uint;
pub use lister::list_entries;
pub use locator::locate_central_directory;
pub use range::fetch;

use crate::services::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZipError {
    #[error("expected at least 2 bytes to decode an integer, got {0}")]
    InvalidLength(usize),
    #[error("malformed archive: {0}")]
    MalformedArchive(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type ZipResult<T> = Result<T, ZipError>;

pub(crate) fn malformed(reason: impl Into<String>) -> ZipError {
    ZipError::MalformedArchive(reason.into())
}
