//! Fixed-layout zip records used while listing.

use super::{ZipResult, decode_uint, malformed};

/// End of Central Directory signature (`PK\x05\x06`).
pub const EOCD_SIGNATURE: &[u8; 4] = b"PK\x05\x06";

/// Size of an EOCD record without a trailing comment.
pub const EOCD_SIZE: usize = 22;

/// Central Directory File Header signature (`PK\x01\x02`).
pub const CDFH_SIGNATURE: &[u8; 4] = b"PK\x01\x02";

/// Fixed portion of a Central Directory File Header.
pub const CDFH_MIN_SIZE: usize = 46;

/// End of Central Directory record, without its comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// Parse the 22-byte record. Fails on short input or a bad signature.
    pub fn from_bytes(data: &[u8]) -> ZipResult<Self> {
        if data.len() < EOCD_SIZE {
            return Err(malformed(format!(
                "end of central directory needs {} bytes, got {}",
                EOCD_SIZE,
                data.len()
            )));
        }
        if &data[0..4] != EOCD_SIGNATURE {
            return Err(malformed("end of central directory signature not found"));
        }

        Ok(Self {
            disk_number: decode_uint(&data[4..6])? as u16,
            disk_with_cd: decode_uint(&data[6..8])? as u16,
            disk_entries: decode_uint(&data[8..10])? as u16,
            total_entries: decode_uint(&data[10..12])? as u16,
            cd_size: decode_uint(&data[12..16])?,
            cd_offset: decode_uint(&data[16..20])?,
            comment_len: decode_uint(&data[20..22])? as u16,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }

    /// Reject layouts the fixed-tail listing cannot handle.
    pub fn ensure_supported(&self) -> ZipResult<()> {
        if self.comment_len != 0 {
            return Err(malformed("archive comments are not supported"));
        }
        if self.is_zip64() {
            return Err(malformed("zip64 archives are not supported"));
        }
        if self.disk_number != 0 || self.disk_with_cd != 0 {
            return Err(malformed("multi-disk archives are not supported"));
        }
        if self.disk_entries != self.total_entries {
            return Err(malformed(format!(
                "entry counts disagree ({} on disk, {} total)",
                self.disk_entries, self.total_entries
            )));
        }
        Ok(())
    }
}

/// One central directory entry as named in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Raw entry name; directories keep their trailing `/`.
    pub name: String,
    pub is_directory: bool,
}

impl EntryRecord {
    pub fn new(name: String) -> Self {
        let is_directory = name.ends_with('/');
        Self { name, is_directory }
    }

    /// Name with a directory's trailing `/` removed.
    pub fn normalized_name(&self) -> &str {
        if self.is_directory {
            self.name.strip_suffix('/').unwrap_or(&self.name)
        } else {
            &self.name
        }
    }
}
