//! XPS package structure parser
//!
//! Walks `_rels/.rels` → FixedDocumentSequence → FixedDocument → PageContent.
//! Every referenced part must exist in the archive.

use crate::content::{REL_FIXED_REPRESENTATION, REL_OXPS_FIXED_REPRESENTATION};
use crate::error::{Result, XpsError};
use crate::metadata::XpsMetadata;
use crate::page::XpsPage;
use crate::{XPS_DEFAULT_PAGE_HEIGHT, XPS_DEFAULT_PAGE_WIDTH};
use folio_archive::opc::{parse_relationships, part_text, PACKAGE_RELS_PART, REL_CORE_PROPERTIES};
use folio_archive::{resolve, Archive};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// Default location of the core properties part.
pub const DEFAULT_CORE_PROPERTIES_PART: &str = "docProps/core.xml";

/// One FixedDocument of the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDocumentRef {
    /// Part name of the `.fdoc`
    pub name: String,
    /// Index of its first page in the flattened page list
    pub first_page: usize,
    /// Number of pages it contributes
    pub page_count: usize,
}

/// Result of walking the package structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XpsStructure {
    pub sequence: String,
    pub documents: Vec<FixedDocumentRef>,
    pub pages: Vec<XpsPage>,
    /// `(name, page index)` of every `LinkTarget`
    pub targets: Vec<(String, usize)>,
    pub metadata: XpsMetadata,
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.trim().to_string())
}

fn required_text<'a>(archive: &'a Archive, path: &str) -> Result<&'a str> {
    let data = archive
        .part_data(path)
        .ok_or_else(|| XpsError::MissingFile(path.to_string()))?;
    Ok(part_text(path, data)?)
}

/// Find the FixedDocumentSequence: the package `FixedRepresentation`
/// relationship, else the first `.fdseq` part in archive order.
///
/// # Errors
///
/// Returns [`XpsError::InvalidStructure`] if neither exists.
pub fn find_sequence(archive: &Archive) -> Result<String> {
    if let Some(data) = archive.part_data(PACKAGE_RELS_PART) {
        let rels = parse_relationships(part_text(PACKAGE_RELS_PART, data)?, "")?;
        if let Some(rel) = rels.iter().find(|r| {
            !r.external
                && (r.rel_type == REL_FIXED_REPRESENTATION
                    || r.rel_type == REL_OXPS_FIXED_REPRESENTATION)
        }) {
            return Ok(rel.target.clone());
        }
    }
    log::warn!("No FixedRepresentation relationship, searching for a .fdseq part");
    archive
        .paths()
        .find(|p| folio_archive::path::extension(p) == "fdseq")
        .map(str::to_string)
        .ok_or_else(|| {
            XpsError::InvalidStructure("No FixedDocumentSequence found in XPS archive".to_string())
        })
}

/// `Source` of every `DocumentReference`, resolved against the sequence.
///
/// # Errors
///
/// Returns an error for malformed XML or a source escaping the container.
pub fn parse_sequence(xml: &str, path: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut docs = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"DocumentReference" {
                    match attribute(&e, b"Source") {
                        Some(src) if !src.is_empty() => docs.push(resolve(path, &src)?),
                        _ => log::warn!("DocumentReference without Source in {path}"),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(docs)
}

/// One `PageContent` entry of a FixedDocument.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub source: String,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub link_targets: Vec<String>,
}

fn dimension(e: &BytesStart<'_>, key: &[u8]) -> Option<f32> {
    attribute(e, key)
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Returns whether an entry was added.
fn push_page_content(pages: &mut Vec<PageContent>, e: &BytesStart<'_>, path: &str) -> Result<bool> {
    let Some(src) = attribute(e, b"Source").filter(|s| !s.is_empty()) else {
        log::warn!("PageContent without Source in {path}");
        return Ok(false);
    };
    pages.push(PageContent {
        source: resolve(path, &src)?,
        width: dimension(e, b"Width"),
        height: dimension(e, b"Height"),
        link_targets: Vec::new(),
    });
    Ok(true)
}

/// `PageContent` entries of a FixedDocument, sources resolved against it.
///
/// # Errors
///
/// Returns an error for malformed XML or a source escaping the container.
pub fn parse_fixed_document(xml: &str, path: &str) -> Result<Vec<PageContent>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut pages: Vec<PageContent> = Vec::new();
    let mut in_page = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"PageContent" => {
                in_page = push_page_content(&mut pages, &e, path)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"PageContent" => {
                push_page_content(&mut pages, &e, path)?;
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"LinkTarget" => {
                if let (true, Some(page), Some(name)) = (in_page, pages.last_mut(), attribute(&e, b"Name")) {
                    page.link_targets.push(name);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"PageContent" => in_page = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(pages)
}

/// Page size declared on the FixedPage root, if any.
fn fixed_page_size(xml: &str) -> Option<(Option<f32>, Option<f32>)> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return (e.local_name().as_ref() == b"FixedPage")
                    .then(|| (dimension(&e, b"Width"), dimension(&e, b"Height")));
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

fn load_metadata(archive: &Archive) -> Result<XpsMetadata> {
    let mut path = DEFAULT_CORE_PROPERTIES_PART.to_string();
    if let Some(data) = archive.part_data(PACKAGE_RELS_PART) {
        let rels = parse_relationships(part_text(PACKAGE_RELS_PART, data)?, "")?;
        if let Some(rel) = rels.iter().find(|r| r.rel_type == REL_CORE_PROPERTIES && !r.external) {
            path.clone_from(&rel.target);
        }
    }
    match archive.part_data(&path) {
        Some(data) => match XpsMetadata::parse(part_text(&path, data)?) {
            Ok(meta) => Ok(meta),
            Err(e) => {
                log::warn!("Ignoring malformed core properties {path}: {e}");
                Ok(XpsMetadata::new())
            }
        },
        None => Ok(XpsMetadata::new()),
    }
}

/// Walk the package structure of an XPS archive.
///
/// Page sizes come from the `PageContent` entry, then the FixedPage root,
/// then US Letter.
///
/// # Errors
///
/// - [`XpsError::InvalidStructure`] without a document sequence or pages
/// - [`XpsError::MissingFile`] for a referenced document or page part that
///   is absent
/// - [`XpsError::Xml`] for malformed structure XML
pub fn parse_structure(archive: &Archive) -> Result<XpsStructure> {
    let sequence = find_sequence(archive)?;
    let doc_paths = parse_sequence(required_text(archive, &sequence)?, &sequence)?;
    if doc_paths.is_empty() {
        return Err(XpsError::InvalidStructure(format!(
            "{sequence} references no FixedDocument"
        )));
    }

    let mut structure = XpsStructure {
        sequence,
        metadata: load_metadata(archive)?,
        ..XpsStructure::default()
    };

    for doc_path in doc_paths {
        let contents = parse_fixed_document(required_text(archive, &doc_path)?, &doc_path)?;
        let first_page = structure.pages.len();
        for content in contents {
            let xml = required_text(archive, &content.source)?;
            let (page_w, page_h) = fixed_page_size(xml).unwrap_or((None, None));
            let index = structure.pages.len();
            for name in content.link_targets {
                structure.targets.push((name, index));
            }
            structure.pages.push(XpsPage {
                number: index + 1,
                name: content.source,
                document: structure.documents.len(),
                width: content.width.or(page_w).unwrap_or(XPS_DEFAULT_PAGE_WIDTH),
                height: content.height.or(page_h).unwrap_or(XPS_DEFAULT_PAGE_HEIGHT),
            });
        }
        structure.documents.push(FixedDocumentRef {
            name: doc_path,
            first_page,
            page_count: structure.pages.len() - first_page,
        });
    }
    log::debug!(
        "XPS structure: {} documents, {} pages",
        structure.documents.len(),
        structure.pages.len()
    );
    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence() {
        let xml = r#"<FixedDocumentSequence xmlns="http://schemas.microsoft.com/xps/2005/06">
            <DocumentReference Source="Documents/1/FixedDoc.fdoc"/>
            <DocumentReference/>
            <DocumentReference Source="/Documents/2/FixedDoc.fdoc"/>
        </FixedDocumentSequence>"#;
        let docs = parse_sequence(xml, "FixedDocSeq.fdseq").unwrap();
        assert_eq!(docs, ["Documents/1/FixedDoc.fdoc", "Documents/2/FixedDoc.fdoc"]);
    }

    #[test]
    fn test_parse_fixed_document() {
        let xml = r#"<FixedDocument xmlns="http://schemas.microsoft.com/xps/2005/06">
            <PageContent Source="Pages/1.fpage" Width="816" Height="1056">
                <PageContent.LinkTargets>
                    <LinkTarget Name="intro"/>
                </PageContent.LinkTargets>
            </PageContent>
            <PageContent Source="Pages/2.fpage" Width="-3"/>
        </FixedDocument>"#;
        let pages = parse_fixed_document(xml, "Documents/1/FixedDoc.fdoc").unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].source, "Documents/1/Pages/1.fpage");
        assert_eq!(pages[0].width, Some(816.0));
        assert_eq!(pages[0].link_targets, ["intro"]);
        assert_eq!(pages[1].width, None);
        assert!(pages[1].link_targets.is_empty());
    }

    #[test]
    fn test_fixed_page_size() {
        assert_eq!(
            fixed_page_size(r#"<?xml version="1.0"?><FixedPage Width="793.7" Height="1122.5"/>"#),
            Some((Some(793.7), Some(1122.5)))
        );
        assert_eq!(fixed_page_size("<Canvas/>"), None);
    }
}
