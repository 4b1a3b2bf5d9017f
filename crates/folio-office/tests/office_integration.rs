//! Opening office packages built in memory

use folio_archive::{Archive, ByteStream};
use folio_core::{Cookie, ErrorKind, FolioError, Matrix};
use folio_office::{
    Alignment, CellValue, ContentNode, OfficeDocument, OfficeError, OfficeType, MAX_COLS, MAX_ROWS,
};
use folio_render::{DisplayList, PageSource, RunStatus, SvgDevice, SvgDeviceOptions};
use proptest::prelude::*;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn open(files: &[(&str, &[u8])]) -> OfficeDocument {
    init_logging();
    let archive = Archive::from_bytes(&build_zip(files)).unwrap();
    OfficeDocument::from_archive(archive).unwrap()
}

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const CORE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
    xmlns:dc="http://purl.org/dc/elements/1.1/">
  <dc:title>Design Review</dc:title>
  <dc:creator>Platform Team</dc:creator>
</cp:coreProperties>"#;

// ========================================================================
// DOCX
// ========================================================================

const DOCX_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const DOCX_DOC_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/report" TargetMode="External"/>
  <Relationship Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/diagram.png"/>
</Relationships>"#;

const DOCX_STYLES: &str = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
</w:styles>"#;

const DOCX_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
    xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
    xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
    xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Overview</w:t></w:r></w:p>
    <w:p><w:pPr><w:jc w:val="center"/></w:pPr>
      <w:r><w:t xml:space="preserve">The cache is </w:t></w:r>
      <w:r><w:rPr><w:b/></w:rPr><w:t>write-through</w:t></w:r>
      <w:r><w:t>.</w:t></w:r>
    </w:p>
    <w:p><w:hyperlink r:id="rId5"><w:r><w:t>Full report</w:t></w:r></w:hyperlink></w:p>
    <w:tbl>
      <w:tr><w:tc><w:p><w:r><w:t>Layer</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Latency</w:t></w:r></w:p></w:tc></w:tr>
      <w:tr><w:tc><w:p><w:r><w:t>L1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>1ns</w:t></w:r></w:p></w:tc></w:tr>
    </w:tbl>
    <w:p><w:r><w:t>Before</w:t></w:r><w:r><w:br w:type="page"/><w:t>After</w:t></w:r></w:p>
    <w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1"/>
      <a:graphic><a:graphicData><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">
        <pic:blipFill><a:blip r:embed="rId6"/></pic:blipFill></pic:pic></a:graphicData></a:graphic>
    </wp:inline></w:drawing></w:r></w:p>
    <w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Details</w:t></w:r></w:p>
    <w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>
  </w:body>
</w:document>"#;

fn docx_files() -> Vec<(&'static str, &'static [u8])> {
    vec![
        ("[Content_Types].xml", DOCX_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("docProps/core.xml", CORE.as_bytes()),
        ("word/document.xml", DOCX_DOCUMENT.as_bytes()),
        ("word/_rels/document.xml.rels", DOCX_DOC_RELS.as_bytes()),
        ("word/styles.xml", DOCX_STYLES.as_bytes()),
        ("word/media/diagram.png", b"\x89PNG\r\n\x1a\n"),
    ]
}

#[test]
fn test_open_docx() {
    let doc = open(&docx_files());
    assert_eq!(doc.office_type(), OfficeType::Docx);
    assert_eq!(doc.title(), Some("Design Review"));
    assert_eq!(doc.creator(), Some("Platform Team"));

    let (w, h) = doc.page_size();
    assert!((w - 595.3).abs() < 1e-3);
    assert!((h - 841.9).abs() < 1e-3);

    let nodes = doc.nodes();
    assert_eq!(
        nodes[0],
        ContentNode::Heading {
            level: 1,
            text: "Overview".into()
        }
    );
    let ContentNode::Paragraph { runs, alignment } = &nodes[1] else {
        panic!("expected paragraph, got {:?}", nodes[1]);
    };
    assert_eq!(*alignment, Alignment::Center);
    assert_eq!(runs.len(), 3);
    assert!(runs[1].bold);
    assert_eq!(nodes[1].text(), "The cache is write-through.");
    assert_eq!(
        nodes[2],
        ContentNode::Hyperlink {
            text: "Full report".into(),
            target: "https://example.com/report".into()
        }
    );
    assert_eq!(
        nodes[3],
        ContentNode::Table {
            rows: vec![
                vec!["Layer".into(), "Latency".into()],
                vec!["L1".into(), "1ns".into()]
            ]
        }
    );
    assert_eq!(nodes[4].text(), "Before");
    assert_eq!(nodes[5], ContentNode::PageBreak);
    assert_eq!(nodes[6].text(), "After");
    assert_eq!(
        nodes[7],
        ContentNode::Image {
            source: "word/media/diagram.png".into()
        }
    );
    assert_eq!(
        nodes[8],
        ContentNode::Heading {
            level: 2,
            text: "Details".into()
        }
    );
    assert_eq!(doc.content_count(), 9);
    assert_eq!(doc.page_count(), 2);
    assert!(doc.page_text(0).unwrap().starts_with("Overview\n"));
    assert!(doc.page_text(1).unwrap().starts_with("After"));
}

#[test]
fn test_docx_edit_and_render() {
    let mut doc = open(&docx_files());
    let index = doc.add_paragraph("Appendix").unwrap();
    assert_eq!(index, 9);
    assert_eq!(doc.page_text(1).unwrap().lines().last(), Some("Appendix"));

    let bounds = doc.page_bounds(0).unwrap();
    assert!((bounds.width() - 595.3).abs() < 1e-3);
    let list = DisplayList::record(&doc, 0).unwrap();
    assert!(!list.items().is_empty());

    let mut svg = SvgDevice::new(Vec::new(), SvgDeviceOptions::default()).unwrap();
    let cookie = Cookie::new();
    let status = list
        .render_page(&mut svg, &Matrix::IDENTITY, Some(&cookie))
        .unwrap();
    assert_eq!(status, RunStatus::Completed);
    let out = String::from_utf8(svg.into_inner()).unwrap();
    assert!(out.contains("Overview"));
    assert_eq!(cookie.progress().progress, list.items().len() as u64);

    let err: FolioError = doc.page_bounds(5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
}

// ========================================================================
// XLSX
// ========================================================================

const XLSX_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

const XLSX_WORKBOOK: &str = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
    xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Summary" sheetId="1" r:id="rId2"/>
    <sheet name="Raw" sheetId="2" r:id="rId1"/>
  </sheets>
</workbook>"#;

const XLSX_WORKBOOK_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const XLSX_SHARED: &str = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
  <si><t>Region</t></si><si><t>North</t></si>
</sst>"#;

const XLSX_STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#;

const XLSX_SHEET1: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
  <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="str"><v>Total</v></c></row>
  <row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><f>SUM(Raw!A1:A3)</f><v>60</v></c><c r="C2" s="1"><v>45383</v></c></row>
</sheetData></worksheet>"#;

const XLSX_SHEET2: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
  <row r="1"><c r="A1"><v>10</v></c></row>
  <row r="2"><c r="A2"><v>20</v></c></row>
  <row r="3"><c r="A3"><v>30</v></c><c r="B3" t="e"><v>#N/A</v></c></row>
</sheetData></worksheet>"#;

const XLSX_PACKAGE_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

#[test]
fn test_open_xlsx() {
    let mut doc = open(&[
        ("[Content_Types].xml", XLSX_TYPES.as_bytes()),
        ("_rels/.rels", XLSX_PACKAGE_RELS.as_bytes()),
        ("xl/workbook.xml", XLSX_WORKBOOK.as_bytes()),
        ("xl/_rels/workbook.xml.rels", XLSX_WORKBOOK_RELS.as_bytes()),
        ("xl/sharedStrings.xml", XLSX_SHARED.as_bytes()),
        ("xl/styles.xml", XLSX_STYLES.as_bytes()),
        ("xl/worksheets/sheet1.xml", XLSX_SHEET1.as_bytes()),
        ("xl/worksheets/sheet2.xml", XLSX_SHEET2.as_bytes()),
    ]);
    assert_eq!(doc.office_type(), OfficeType::Xlsx);
    assert_eq!(doc.title(), None);
    assert_eq!(doc.sheet_count(), 2);
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.sheet_name(0).unwrap(), "Summary");
    assert_eq!(doc.sheet_name(1).unwrap(), "Raw");

    assert_eq!(doc.cell(0, 0, 0).unwrap(), &CellValue::String("Region".into()));
    assert_eq!(doc.cell_string(0, 1, 0).unwrap(), "North");
    assert_eq!(doc.cell_string(0, 0, 1).unwrap(), "Total");
    assert_eq!(
        doc.cell(0, 1, 1).unwrap(),
        &CellValue::Formula {
            formula: "SUM(Raw!A1:A3)".into(),
            cached: Some("60".into())
        }
    );
    assert_eq!(doc.cell_string(0, 1, 2).unwrap(), "2024-04-01");
    assert_eq!(doc.cell(1, 2, 0).unwrap(), &CellValue::Number(30.0));
    assert_eq!(doc.cell(1, 2, 1).unwrap(), &CellValue::Error("#N/A".into()));

    assert!(matches!(doc.add_sheet("raw"), Err(OfficeError::DuplicateSheet(_))));
    assert_eq!(doc.add_sheet("Notes").unwrap(), 2);
    assert_eq!(doc.page_count(), 3);

    let text = doc.page_text(0).unwrap();
    assert!(text.contains("Region"));
    assert!(text.contains("2024-04-01"));
}

// ========================================================================
// PPTX
// ========================================================================

const PPTX_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#;

const PPTX_PRESENTATION: &str = r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
    xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:sldIdLst><p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId2"/></p:sldIdLst>
  <p:sldSz cx="12192000" cy="6858000"/>
</p:presentation>"#;

const PPTX_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
</Relationships>"#;

fn pptx_slide(title: &str, body: &str) -> String {
    format!(
        r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
    xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree>
  <p:sp><p:nvSpPr><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr>
    <p:txBody><a:p><a:r><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp>
  <p:sp><p:txBody><a:p><a:r><a:t>{body}</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#
    )
}

#[test]
fn test_open_pptx() {
    let slide1 = pptx_slide("Launch plan", "Beta in May");
    let slide2 = pptx_slide("Risks", "Supply chain");
    let mut doc = open(&[
        ("[Content_Types].xml", PPTX_TYPES.as_bytes()),
        ("ppt/presentation.xml", PPTX_PRESENTATION.as_bytes()),
        ("ppt/_rels/presentation.xml.rels", PPTX_RELS.as_bytes()),
        ("ppt/slides/slide1.xml", slide1.as_bytes()),
        ("ppt/slides/slide2.xml", slide2.as_bytes()),
    ]);
    assert_eq!(doc.office_type(), OfficeType::Pptx);
    assert_eq!(doc.page_size(), (960.0, 540.0));
    assert_eq!(doc.slide_count(), 2);
    assert_eq!(doc.slide_title(0).unwrap(), Some("Launch plan"));
    assert_eq!(doc.slide_title(1).unwrap(), Some("Risks"));
    assert_eq!(doc.slide(1).unwrap().body[0].text(), "Supply chain");
    assert_eq!(doc.page_text(0).unwrap(), "Launch plan\nBeta in May");

    doc.set_slide_title(0, "Launch").unwrap();
    assert_eq!(doc.slide_title(0).unwrap(), Some("Launch"));
    assert!(matches!(
        doc.slide_title(2),
        Err(OfficeError::OutOfRange { index: 2, len: 2, .. })
    ));
}

// ========================================================================
// OpenDocument
// ========================================================================

const ODT_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"
    xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"
    xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0"
    xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0">
  <office:automatic-styles>
    <style:style style:name="P1" style:family="paragraph"><style:paragraph-properties fo:break-before="page"/></style:style>
  </office:automatic-styles>
  <office:body><office:text>
    <text:h text:outline-level="1">Release notes</text:h>
    <text:p>Fixed a crash on startup.</text:p>
    <text:p text:style-name="P1">Known issues</text:p>
  </office:text></office:body>
</office:document-content>"#;

const ODT_META: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-meta xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:meta="urn:oasis:names:tc:opendocument:xmlns:meta:1.0">
  <office:meta><dc:title>Notes 2.1</dc:title><meta:initial-creator>Release Eng</meta:initial-creator></office:meta>
</office:document-meta>"#;

const ODF_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"
    xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0"
    xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0">
  <office:automatic-styles>
    <style:page-layout style:name="pm1"><style:page-layout-properties fo:page-width="210mm" fo:page-height="297mm"/></style:page-layout>
  </office:automatic-styles>
  <office:master-styles><style:master-page style:name="Standard" style:page-layout-name="pm1"/></office:master-styles>
</office:document-styles>"#;

#[test]
fn test_open_odt() {
    let doc = open(&[
        ("mimetype", b"application/vnd.oasis.opendocument.text"),
        ("content.xml", ODT_CONTENT.as_bytes()),
        ("styles.xml", ODF_STYLES.as_bytes()),
        ("meta.xml", ODT_META.as_bytes()),
    ]);
    assert_eq!(doc.office_type(), OfficeType::Odt);
    assert_eq!(doc.title(), Some("Notes 2.1"));
    assert_eq!(doc.creator(), Some("Release Eng"));
    let (w, h) = doc.page_size();
    assert!((w - 595.28).abs() < 0.01);
    assert!((h - 841.89).abs() < 0.01);
    assert_eq!(doc.content_count(), 4);
    assert_eq!(doc.content(2).unwrap(), &ContentNode::PageBreak);
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.page_text(1).unwrap(), "Known issues");
}

const ODS_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"
    xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0"
    xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0">
  <office:body><office:spreadsheet>
    <table:table table:name="Inventory">
      <table:table-row>
        <table:table-cell office:value-type="string"><text:p>Widgets</text:p></table:table-cell>
        <table:table-cell office:value-type="float" office:value="42"><text:p>42</text:p></table:table-cell>
      </table:table-row>
      <table:table-row table:number-rows-repeated="1048575"><table:table-cell table:number-columns-repeated="16384"/></table:table-row>
    </table:table>
  </office:spreadsheet></office:body>
</office:document-content>"#;

#[test]
fn test_open_ods() {
    let doc = open(&[
        ("mimetype", b"application/vnd.oasis.opendocument.spreadsheet"),
        ("content.xml", ODS_CONTENT.as_bytes()),
    ]);
    assert_eq!(doc.office_type(), OfficeType::Ods);
    assert_eq!(doc.sheet_count(), 1);
    assert_eq!(doc.sheet_name(0).unwrap(), "Inventory");
    assert_eq!(doc.cell(0, 0, 1).unwrap(), &CellValue::Number(42.0));
    assert_eq!(doc.sheet(0).unwrap().cell_count(), 2);
    assert_eq!(doc.creator(), None);
}

#[test]
fn test_open_from_file_and_stream() {
    init_logging();
    let bytes = build_zip(&docx_files());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("review.docx");
    std::fs::write(&path, &bytes).unwrap();

    let from_file = OfficeDocument::open(&path).unwrap();
    assert_eq!(from_file.content_count(), 9);

    let mut stream = ByteStream::from_memory(bytes);
    let from_stream = OfficeDocument::open_stream(&mut stream).unwrap();
    assert_eq!(from_stream.title(), Some("Design Review"));
}

#[test]
fn test_missing_main_part() {
    init_logging();
    let archive = Archive::from_bytes(&build_zip(&[
        ("[Content_Types].xml", DOCX_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
    ]))
    .unwrap();
    let err = OfficeDocument::from_archive(archive).unwrap_err();
    assert!(matches!(err, OfficeError::MissingFile(ref p) if p == "word/document.xml"));
    assert_eq!(FolioError::from(err).kind(), ErrorKind::Format);
}

#[test]
fn proptest_cell_positions_are_range_checked() {
    proptest!(|(row in 0u32..2_000_000, col in 0u32..20_000, value in -1e9f64..1e9)| {
        let mut doc = OfficeDocument::new(OfficeType::Xlsx);
        doc.add_sheet("S").unwrap();
        let result = doc.set_cell_number(0, row, col, value);
        if row < MAX_ROWS && col < MAX_COLS {
            prop_assert!(result.is_ok());
            prop_assert_eq!(doc.cell(0, row, col).unwrap(), &CellValue::Number(value));
        } else {
            let err = FolioError::from(result.unwrap_err());
            prop_assert_eq!(err.kind(), ErrorKind::Argument);
            prop_assert_eq!(doc.sheet(0).unwrap().cell_count(), 0);
        }
    });
}

#[test]
fn proptest_text_pages_never_empty() {
    proptest!(|(words in prop::collection::vec("[a-z]{1,12}", 1..400), w in 300f32..900.0, h in 300f32..900.0)| {
        let mut doc = OfficeDocument::new(OfficeType::Docx);
        doc.set_page_size(w, h).unwrap();
        doc.add_paragraph(&words.join(" ")).unwrap();
        prop_assert!(doc.page_count() >= 1);
        let joined: Vec<String> = (0..doc.page_count())
            .map(|p| doc.page_text(p).unwrap())
            .filter(|t| !t.is_empty())
            .collect();
        let rejoined = joined.join("\n").split_whitespace().collect::<Vec<_>>().join(" ");
        prop_assert_eq!(rejoined, words.join(" "));
    });
}
