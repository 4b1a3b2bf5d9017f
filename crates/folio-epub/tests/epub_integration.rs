//! Opening EPUB containers built in memory

use folio_archive::{Archive, ByteStream};
use folio_core::Matrix;
use folio_epub::{Direction, EpubDocument, EpubError, EpubLayout};
use folio_render::{DisplayList, SvgDevice, SvgDeviceOptions};
use proptest::prelude::*;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:0f1e2d3c</dc:identifier>
    <dc:title>Field Notes</dc:title>
    <dc:creator>R. Walker</dc:creator>
    <dc:language>en</dc:language>
    <dc:publisher>Small Press</dc:publisher>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="notes" href="text/notes.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
  <spine page-progression-direction="ltr">
    <itemref idref="ch1"/>
    <itemref idref="notes" linear="no"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

const NAV: &str = r#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body><nav epub:type="toc"><ol>
  <li><a href="text/ch1.xhtml">Departure</a></li>
  <li><a href="text/ch2.xhtml#arrival">Arrival</a></li>
</ol></nav></body></html>"#;

const CH1: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><h1>Departure</h1><p>We left at dawn.</p></body></html>"#;
const NOTES: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p>A note.</p></body></html>"#;
const CH2: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><h1 id="arrival">Arrival</h1></body></html>"#;

fn sample_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("mimetype", "application/epub+zip"),
        ("META-INF/container.xml", CONTAINER),
        ("OEBPS/content.opf", OPF),
        ("OEBPS/nav.xhtml", NAV),
        ("OEBPS/text/ch1.xhtml", CH1),
        ("OEBPS/text/notes.xhtml", NOTES),
        ("OEBPS/text/ch2.xhtml", CH2),
        ("OEBPS/style.css", ""),
    ]
}

fn open(files: &[(&str, &str)]) -> Result<EpubDocument, EpubError> {
    EpubDocument::from_archive(Archive::from_bytes(&build_zip(files)).unwrap())
}

#[test]
fn test_open_package() {
    let doc = open(&sample_files()).unwrap();
    assert_eq!(doc.version(), 3);
    assert_eq!(doc.direction(), Direction::Ltr);
    assert_eq!(doc.title(), Some("Field Notes"));
    assert_eq!(doc.creators(), ["R. Walker"]);
    assert_eq!(doc.identifier(), Some("urn:uuid:0f1e2d3c"));
    assert_eq!(doc.publisher(), Some("Small Press"));
    assert_eq!(doc.date(), None);
    assert_eq!(doc.manifest_count(), 5);
}

#[test]
fn test_linear_spine_and_lookup() {
    let doc = open(&sample_files()).unwrap();
    assert_eq!(doc.linear_reading_order(), ["ch1", "ch2"]);
    let notes = doc.spine_item("notes").unwrap();
    assert_eq!(notes.path, "OEBPS/text/notes.xhtml");
    assert_eq!(doc.file_data(&notes.path), Some(NOTES.as_bytes()));
    // One page per linear chapter
    assert_eq!(doc.page_count(), 2);
}

#[test]
fn test_nav_toc() {
    let doc = open(&sample_files()).unwrap();
    assert_eq!(doc.toc_count(), 2);
    assert_eq!(doc.toc_label(1).unwrap(), "Arrival");
    assert_eq!(doc.toc_content(1).unwrap(), "OEBPS/text/ch2.xhtml#arrival");
}

#[test]
fn test_ncx_fallback_without_container() {
    let opf = OPF
        .replace("version=\"3.0\"", "version=\"2.0\"")
        .replace(" properties=\"nav\"", "")
        .replace(
            "<item id=\"css\"",
            "<item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/><item id=\"css\"",
        )
        .replace("<spine ", "<spine toc=\"ncx\" ");
    let ncx = r#"<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/"><navMap>
      <navPoint id="n1"><navLabel><text>Only</text></navLabel><content src="text/ch1.xhtml"/></navPoint>
    </navMap></ncx>"#;
    let mut files: Vec<(&str, &str)> = sample_files()
        .into_iter()
        .filter(|(name, _)| !name.starts_with("META-INF"))
        .filter(|(name, _)| *name != "OEBPS/content.opf")
        .collect();
    files.push(("OEBPS/content.opf", opf.as_str()));
    files.push(("OEBPS/toc.ncx", ncx));

    let doc = open(&files).unwrap();
    assert_eq!(doc.version(), 2);
    assert_eq!(doc.toc_count(), 1);
    assert_eq!(doc.toc_content(0).unwrap(), "OEBPS/text/ch1.xhtml");
}

#[test]
fn test_dangling_spine_fails_open() {
    let files: Vec<(&str, &str)> = sample_files()
        .into_iter()
        .filter(|(name, _)| *name != "OEBPS/text/ch2.xhtml")
        .collect();
    assert!(matches!(
        open(&files),
        Err(EpubError::UnresolvedSpine { ref idref, .. }) if idref == "ch2"
    ));
}

#[test]
fn test_missing_package_fails_open() {
    assert!(matches!(
        open(&[("mimetype", "application/epub+zip")]),
        Err(EpubError::MissingPackage)
    ));
    let files = [("META-INF/container.xml", CONTAINER)];
    assert!(matches!(open(&files), Err(EpubError::MissingFile(_))));
}

#[test]
fn test_open_from_file_and_stream() {
    let bytes = build_zip(&sample_files());
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&bytes).unwrap();
    tmp.flush().unwrap();

    let from_path = EpubDocument::open(tmp.path()).unwrap();
    let mut stream = ByteStream::from_memory(bytes);
    let from_stream = EpubDocument::open_stream(&mut stream).unwrap();
    assert_eq!(from_path.package(), from_stream.package());
    assert_eq!(from_path.toc(), from_stream.toc());
}

#[test]
fn test_render_to_svg() {
    let doc = open(&sample_files()).unwrap();
    let list = DisplayList::record(&doc, 0).unwrap();
    assert_eq!(list.len(), 2);

    let mut dev = SvgDevice::new(Vec::new(), SvgDeviceOptions::default()).unwrap();
    list.render_page(&mut dev, &Matrix::IDENTITY, None).unwrap();
    let svg = String::from_utf8(dev.into_inner()).unwrap();
    assert!(svg.contains("We left at dawn."));
    assert!(svg.contains("width=\"450pt\""));
}

// ============================================================================
// Reflow Properties
// ============================================================================

/// Property: every linear chapter gets at least one page, and more text
/// never means fewer pages
#[test]
fn proptest_page_count_monotonic() {
    proptest!(|(words in 0usize..600, extra in 1usize..600)| {
        let make = |n: usize| {
            let body = vec!["lorem"; n].join(" ");
            let mut doc = EpubDocument::new();
            doc.add_file(
                "OEBPS/c.xhtml",
                format!("<html><body><p>{body}</p></body></html>").into_bytes(),
            )
            .unwrap();
            doc.add_manifest_item("c", "c.xhtml", "application/xhtml+xml").unwrap();
            doc.add_spine_item("c", true).unwrap();
            doc.set_layout(EpubLayout { width: 200.0, height: 200.0, em: 10.0 }).unwrap();
            doc.page_count()
        };
        let small = make(words);
        let large = make(words + extra);
        prop_assert!(small >= 1);
        prop_assert!(large >= small);
    });
}
