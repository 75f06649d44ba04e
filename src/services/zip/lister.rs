//! Parse a central directory image into entry names.

use super::{
    ZipResult, decode_uint, malformed,
    structures::{CDFH_MIN_SIZE, CDFH_SIGNATURE, EOCD_SIZE, EndOfCentralDirectory, EntryRecord},
};
use std::io::{self, Cursor, ErrorKind, Read};

/// Entry names in central-directory order, with the trailing `/` of directory
/// entries stripped. Duplicates are kept.
pub fn list_entries(image: &[u8]) -> ZipResult<Vec<String>> {
    Ok(parse_entries(image)?
        .iter()
        .map(|entry| entry.normalized_name().to_string())
        .collect())
}

/// Raw entry records of a `CD + EOCD` image.
///
/// The image must hold exactly the number of headers the EOCD announces and
/// nothing after them.
pub fn parse_entries(image: &[u8]) -> ZipResult<Vec<EntryRecord>> {
    if image.len() < EOCD_SIZE {
        return Err(malformed(format!(
            "central directory image is {} bytes, shorter than its trailer",
            image.len()
        )));
    }

    let (cd, trailer) = image.split_at(image.len() - EOCD_SIZE);
    let eocd = EndOfCentralDirectory::from_bytes(trailer)?;
    eocd.ensure_supported()?;
    if eocd.cd_size as usize != cd.len() {
        return Err(malformed(format!(
            "trailer declares a {} byte central directory, image holds {}",
            eocd.cd_size,
            cd.len()
        )));
    }

    let mut cursor = Cursor::new(cd);
    let mut entries = Vec::with_capacity(eocd.total_entries as usize);
    for index in 0..eocd.total_entries {
        let entry = parse_header(&mut cursor)
            .map_err(|err| malformed(format!("central directory entry {}: {}", index, err)))?;
        entries.push(entry);
    }

    if cursor.position() as usize != cd.len() {
        return Err(malformed(format!(
            "{} unexpected bytes after {} central directory entries",
            cd.len() - cursor.position() as usize,
            eocd.total_entries
        )));
    }

    Ok(entries)
}

/// Read one Central Directory File Header and skip its extra field and
/// comment.
fn parse_header(cursor: &mut Cursor<&[u8]>) -> io::Result<EntryRecord> {
    let mut header = [0u8; CDFH_MIN_SIZE];
    cursor.read_exact(&mut header)?;
    if &header[0..4] != CDFH_SIGNATURE {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "missing central directory header signature",
        ));
    }

    let field = |range: std::ops::Range<usize>| {
        decode_uint(&header[range]).map(|v| v as u64).map_err(|err| {
            io::Error::new(ErrorKind::InvalidData, err.to_string())
        })
    };
    let name_len = field(28..30)?;
    let extra_len = field(30..32)?;
    let comment_len = field(32..34)?;

    let mut name = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name)?;

    let next = cursor.position() + extra_len + comment_len;
    if next > cursor.get_ref().len() as u64 {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            "extra field or comment runs past the central directory",
        ));
    }
    cursor.set_position(next);

    // Non-UTF-8 (CP437) names are decoded lossily.
    Ok(EntryRecord::new(String::from_utf8_lossy(&name).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::zip::{ZipError, fixtures};

    /// `CD + EOCD` sliced straight out of a whole archive.
    fn tail_image(archive: &[u8]) -> &[u8] {
        let eocd = EndOfCentralDirectory::from_bytes(&archive[archive.len() - EOCD_SIZE..]).unwrap();
        &archive[eocd.cd_offset as usize..]
    }

    #[test]
    fn lists_files_and_directories_in_order() {
        let archive = fixtures::archive(&[("a.txt", "alpha"), ("dir/", ""), ("dir/b.txt", "beta")]);

        let records = parse_entries(tail_image(&archive)).unwrap();
        assert_eq!(
            records,
            vec![
                EntryRecord::new("a.txt".into()),
                EntryRecord::new("dir/".into()),
                EntryRecord::new("dir/b.txt".into()),
            ]
        );
        assert!(records[1].is_directory);

        assert_eq!(
            list_entries(tail_image(&archive)).unwrap(),
            vec!["a.txt", "dir", "dir/b.txt"]
        );
    }

    #[test]
    fn empty_archive_has_no_entries() {
        let archive = fixtures::archive(&[]);
        assert!(list_entries(&archive).unwrap().is_empty());
    }

    #[test]
    fn duplicate_names_are_kept() {
        let archive = fixtures::archive(&[("x.txt", "1")]);
        let image = tail_image(&archive).to_vec();

        // Two copies of the single header followed by a patched trailer.
        let cd_len = image.len() - EOCD_SIZE;
        let mut doubled = image[..cd_len].to_vec();
        doubled.extend_from_slice(&image[..cd_len]);
        let mut trailer = image[cd_len..].to_vec();
        trailer[8..10].copy_from_slice(&2u16.to_le_bytes());
        trailer[10..12].copy_from_slice(&2u16.to_le_bytes());
        trailer[12..16].copy_from_slice(&((cd_len * 2) as u32).to_le_bytes());
        doubled.extend_from_slice(&trailer);

        assert_eq!(list_entries(&doubled).unwrap(), vec!["x.txt", "x.txt"]);
    }

    #[test]
    fn short_or_unsigned_images_are_malformed() {
        assert!(matches!(
            list_entries(&[0u8; 10]),
            Err(ZipError::MalformedArchive(_))
        ));
        assert!(matches!(
            list_entries(&[0u8; 30]),
            Err(ZipError::MalformedArchive(_))
        ));
    }

    #[test]
    fn corrupted_header_signature_is_malformed() {
        let archive = fixtures::archive(&[("a.txt", "alpha")]);
        let mut image = tail_image(&archive).to_vec();
        image[0] = b'X';
        assert!(matches!(
            list_entries(&image),
            Err(ZipError::MalformedArchive(_))
        ));
    }

    #[test]
    fn entry_count_must_match_the_headers() {
        let archive = fixtures::archive(&[("a.txt", "alpha"), ("b.txt", "beta")]);
        let mut image = tail_image(&archive).to_vec();
        let trailer = image.len() - EOCD_SIZE;

        // One fewer entry than present leaves trailing bytes.
        image[trailer + 8..trailer + 10].copy_from_slice(&1u16.to_le_bytes());
        image[trailer + 10..trailer + 12].copy_from_slice(&1u16.to_le_bytes());
        assert!(list_entries(&image).is_err());

        // One more than present runs out of bytes.
        image[trailer + 8..trailer + 10].copy_from_slice(&3u16.to_le_bytes());
        image[trailer + 10..trailer + 12].copy_from_slice(&3u16.to_le_bytes());
        assert!(list_entries(&image).is_err());
    }

    #[test]
    fn declared_size_must_match_the_image() {
        let archive = fixtures::archive(&[("a.txt", "alpha")]);
        let image = tail_image(&archive);
        let mut padded = image[..image.len() - EOCD_SIZE].to_vec();
        padded.push(0);
        padded.extend_from_slice(&image[image.len() - EOCD_SIZE..]);
        assert!(matches!(
            list_entries(&padded),
            Err(ZipError::MalformedArchive(_))
        ));
    }
}
