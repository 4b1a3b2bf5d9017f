//! Opening comic archives built in memory

use folio_archive::{Archive, ByteStream};
use folio_cbz::{natural_cmp, CbzDocument, CbzError, CbzFormat, ImageFormat, Manga};
use folio_core::{IRect, Matrix};
use folio_render::{Command, DisplayList, DrawDevice, Pixmap};
use proptest::prelude::*;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

/// Minimal PNG header declaring `w`x`h`.
fn png(w: u32, h: u32) -> Vec<u8> {
    let mut v = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    v.extend_from_slice(&[0, 0, 0, 0x0D]);
    v.extend_from_slice(b"IHDR");
    v.extend_from_slice(&w.to_be_bytes());
    v.extend_from_slice(&h.to_be_bytes());
    v.extend_from_slice(&[8, 6, 0, 0, 0]);
    v
}

fn build_zip(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

const COMIC_INFO: &str = r#"<?xml version="1.0"?>
<ComicInfo>
  <Title>Opening Move</Title>
  <Series>Gambit</Series>
  <Number>1</Number>
  <Manga>No</Manga>
  <Pages>
    <Page Image="1" DoublePage="true" ImageWidth="1600" ImageHeight="1200"/>
  </Pages>
</ComicInfo>"#;

fn sample() -> Vec<u8> {
    build_zip(&[
        ("comic/page10.png", png(10, 20)),
        ("comic/page2.png", png(30, 40)),
        ("comic/page1.png", png(50, 60)),
        ("comic/.DS_Store.png", png(1, 1)),
        ("__MACOSX/comic/._page1.png", vec![0; 4]),
        ("ComicInfo.xml", COMIC_INFO.as_bytes().to_vec()),
        ("notes.txt", b"hello".to_vec()),
    ])
}

#[test]
fn test_open_zip_orders_pages_naturally() {
    let doc = CbzDocument::from_archive(Archive::from_bytes(&sample()).unwrap()).unwrap();
    assert_eq!(doc.format(), CbzFormat::Cbz);
    assert_eq!(doc.page_count(), 3);
    assert_eq!(doc.page_filename(0).unwrap(), "comic/page1.png");
    assert_eq!(doc.page_filename(1).unwrap(), "comic/page2.png");
    assert_eq!(doc.page_filename(2).unwrap(), "comic/page10.png");
    assert_eq!(doc.page_format(2).unwrap(), ImageFormat::Png);
}

#[test]
fn test_sizes_from_headers_and_comic_info() {
    let doc = CbzDocument::from_archive(Archive::from_bytes(&sample()).unwrap()).unwrap();
    assert_eq!(doc.page_size(0).unwrap(), (50, 60));
    // ComicInfo overrides page 1
    assert_eq!(doc.page_size(1).unwrap(), (1600, 1200));
    assert!(doc.is_double(1).unwrap());
    assert!(!doc.is_double(0).unwrap());
    assert_eq!(doc.title(), Some("Opening Move"));
    assert_eq!(doc.manga(), Manga::No);
    assert_eq!(doc.writer(), None);
}

#[test]
fn test_open_from_file_and_stream() {
    let bytes = sample();
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&bytes).unwrap();
    tmp.flush().unwrap();

    let from_path = CbzDocument::open(tmp.path()).unwrap();
    let mut stream = ByteStream::from_memory(bytes);
    let from_stream = CbzDocument::open_stream(&mut stream).unwrap();
    assert_eq!(from_path.pages(), from_stream.pages());
}

#[test]
fn test_malformed_comic_info_fails_open() {
    let bytes = build_zip(&[
        ("1.png", png(1, 1)),
        ("ComicInfo.xml", b"<ComicInfo><Title>".to_vec()),
    ]);
    let err = CbzDocument::from_archive(Archive::from_bytes(&bytes).unwrap()).unwrap_err();
    assert!(matches!(err, CbzError::ComicInfo(_)));
}

#[test]
fn test_add_page_then_render() {
    let mut doc = CbzDocument::new();
    doc.add_page("001.png", png(200, 300)).unwrap();
    assert!(doc.add_page("001.png", png(1, 1)).is_err());
    assert_eq!(doc.page_count(), 1);

    let list = DisplayList::record(&doc, 0).unwrap();
    assert_eq!(list.len(), 1);
    let item = &list.items()[0];
    assert!(matches!(item.command, Command::FillImage { .. }));
    assert_eq!(item.ctm, Matrix::scale(200.0, 300.0));

    let mut dev = DrawDevice::new(Pixmap::new(IRect::new(0, 0, 200, 300)).unwrap());
    list.render_page(&mut dev, &Matrix::IDENTITY, None).unwrap();
    assert_eq!(dev.trace().len(), 1);
}

// ============================================================================
// Natural Sort Properties
// ============================================================================

/// Property: sorting is idempotent and order-independent
#[test]
fn proptest_sort_idempotent() {
    proptest!(|(names in prop::collection::vec("[a-zA-Z]{0,3}[0-9]{1,3}\\.jpg", 1..12))| {
        let mut doc = CbzDocument::new();
        for n in &names {
            doc.add_entry(n).unwrap();
        }
        doc.sort_pages().unwrap();
        let once: Vec<String> = doc.pages().iter().map(|p| p.name.clone()).collect();
        doc.sort_pages().unwrap();
        let twice: Vec<String> = doc.pages().iter().map(|p| p.name.clone()).collect();
        prop_assert_eq!(&once, &twice);

        let mut reversed = CbzDocument::new();
        for n in names.iter().rev() {
            reversed.add_entry(n).unwrap();
        }
        reversed.sort_pages().unwrap();
        let other: Vec<String> = reversed.pages().iter().map(|p| p.name.clone()).collect();
        prop_assert_eq!(once, other);
    });
}

/// Property: natural comparison is antisymmetric
#[test]
fn proptest_natural_cmp_antisymmetric() {
    proptest!(|(a in "[a-cA-C0-9]{0,6}", b in "[a-cA-C0-9]{0,6}")| {
        prop_assert_eq!(natural_cmp(&a, &b), natural_cmp(&b, &a).reverse());
    });
}
