//! Integration tests for loading containers into the part store

use folio_archive::{Archive, ArchiveError, ArchiveFormat, ByteStream};
use proptest::prelude::*;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[test]
fn test_zip_from_bytes() {
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("OEBPS/content.opf", b"<package/>"),
    ]);
    let archive = Archive::from_bytes(&bytes).unwrap();
    assert_eq!(archive.format(), ArchiveFormat::Zip);
    assert_eq!(archive.len(), 2);
    assert_eq!(
        archive.part_data("mimetype"),
        Some(&b"application/epub+zip"[..])
    );
    assert_eq!(
        archive.get_part("OEBPS/content.opf").unwrap().content_type(),
        "application/oebps-package+xml"
    );
}

#[test]
fn test_zip_from_file_and_stream() {
    let bytes = build_zip(&[("a.png", b"png")]);
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&bytes).unwrap();
    tmp.flush().unwrap();

    let from_path = Archive::open(tmp.path()).unwrap();
    let mut stream = ByteStream::open(tmp.path()).unwrap();
    let from_stream = Archive::from_stream(&mut stream, folio_archive::MAX_PART_SIZE).unwrap();
    assert_eq!(from_path, from_stream);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Archive::open(std::path::Path::new("/nonexistent/book.cbz")).unwrap_err();
    assert!(matches!(err, ArchiveError::Io(_)));
}

#[test]
fn test_limit_skips_large_parts() {
    let big = vec![0u8; 1024];
    let bytes = build_zip(&[("big.bin", &big), ("small.bin", b"s")]);
    let archive = Archive::from_bytes_with_limit(&bytes, 100).unwrap();
    assert!(!archive.has_part("big.bin"));
    assert!(archive.has_part("small.bin"));
}

// ============================================================================
// Archive Properties
// ============================================================================

/// Property: every inserted valid path reads back its bytes; duplicates fail
/// and leave the first value in place
#[test]
fn proptest_insert_then_get() {
    proptest!(|(segments in prop::collection::vec("[a-zA-Z0-9_]{1,8}", 1..4),
                data in prop::collection::vec(any::<u8>(), 0..64))| {
        let path = segments.join("/");
        let mut archive = Archive::new();
        archive.add_part(&path, data.clone(), "").unwrap();
        prop_assert!(archive.has_part(&path));
        prop_assert_eq!(archive.part_data(&path), Some(data.as_slice()));

        let dup = archive.add_part(&path, vec![0xAA], "");
        prop_assert!(matches!(dup, Err(ArchiveError::DuplicatePart(_))));
        prop_assert_eq!(archive.part_data(&path), Some(data.as_slice()));
    });
}

/// Property: normalization is idempotent
#[test]
fn proptest_normalize_idempotent() {
    proptest!(|(raw in "[a-z./]{0,24}")| {
        if let Ok(once) = folio_archive::normalize_path(&raw) {
            let twice = folio_archive::normalize_path(&once).unwrap();
            prop_assert_eq!(once, twice);
        }
    });
}
