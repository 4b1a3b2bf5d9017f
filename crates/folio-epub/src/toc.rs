//! Table of contents from an EPUB 3 nav document or an EPUB 2 NCX.
//!
//! Both sources nest entries; the model is flat, so nested points are
//! emitted in document order (parent before children).

use crate::error::Result;
use folio_archive::path::is_external;
use folio_archive::resolve;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

const OPS_NS: &str = "http://www.idpf.org/2007/ops";

/// One entry of the flattened table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub label: String,
    /// Archive path of the target, fragment kept
    pub href: String,
}

fn resolve_target(doc_path: &str, href: &str) -> Option<String> {
    if is_external(href) {
        return Some(href.to_string());
    }
    match resolve(doc_path, href) {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("Dropping TOC target '{href}': {e}");
            None
        }
    }
}

fn content_src(e: &BytesStart<'_>, doc_path: &str) -> Option<String> {
    let attr = e
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"src")?;
    let value = attr.unescape_value().ok()?;
    resolve_target(doc_path, value.trim())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the `navMap` of an NCX document stored at `doc_path`.
///
/// Malformed XML yields the entries read so far and a warning.
#[must_use = "returns the parsed entries"]
pub fn parse_ncx(xml: &str, doc_path: &str) -> Vec<TocEntry> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut entries: Vec<TocEntry> = Vec::new();
    // Indices into `entries` of the open navPoints
    let mut open: Vec<usize> = Vec::new();
    let mut in_nav_map = false;
    let mut in_label = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"navMap" => in_nav_map = true,
                b"navPoint" if in_nav_map => {
                    let id = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"id")
                        .and_then(|a| a.unescape_value().ok())
                        .map_or_else(|| format!("navpoint-{}", entries.len() + 1), |v| v.to_string());
                    open.push(entries.len());
                    entries.push(TocEntry {
                        id,
                        label: String::new(),
                        href: String::new(),
                    });
                }
                b"navLabel" if !open.is_empty() => in_label = true,
                b"content" => {
                    if let (Some(&idx), Some(href)) = (open.last(), content_src(&e, doc_path)) {
                        entries[idx].href = href;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"content" {
                    if let (Some(&idx), Some(href)) = (open.last(), content_src(&e, doc_path)) {
                        entries[idx].href = href;
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_label {
                    if let (Some(&idx), Ok(text)) = (open.last(), e.unescape()) {
                        let label = &mut entries[idx].label;
                        if !label.is_empty() {
                            label.push(' ');
                        }
                        label.push_str(&collapse(&text));
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"navMap" => in_nav_map = false,
                b"navLabel" => in_label = false,
                b"navPoint" => {
                    // Children occupy later indices and are already final
                    if let Some(idx) = open.pop() {
                        if entries[idx].href.is_empty() {
                            log::warn!("NCX navPoint '{}' has no content", entries[idx].id);
                            entries.remove(idx);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("Failed to parse NCX {doc_path}: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    entries
}

/// Parse the `<nav epub:type="toc">` of an XHTML nav document.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML.
pub fn parse_nav(xml: &str, doc_path: &str) -> Result<Vec<TocEntry>> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, opts)?;
    let Some(nav) = doc.descendants().find(|n| {
        n.tag_name().name() == "nav"
            && n.attribute((OPS_NS, "type"))
                .is_some_and(|t| t.split_whitespace().any(|v| v == "toc"))
    }) else {
        log::debug!("No toc nav in {doc_path}");
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    for anchor in nav.descendants().filter(|n| n.tag_name().name() == "a") {
        let Some(href) = anchor.attribute("href") else {
            continue;
        };
        let Some(href) = resolve_target(doc_path, href.trim()) else {
            continue;
        };
        let label = collapse(
            &anchor
                .descendants()
                .filter(roxmltree::Node::is_text)
                .filter_map(|n| n.text())
                .collect::<String>(),
        );
        let id = anchor
            .attribute("id")
            .or_else(|| anchor.parent_element().and_then(|li| li.attribute("id")))
            .map_or_else(|| format!("toc-{}", entries.len() + 1), str::to_string);
        entries.push(TocEntry { id, label, href });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ncx_flattens_nested_points() {
        let ncx = r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <navMap>
    <navPoint id="p1" playOrder="1">
      <navLabel><text>Part One</text></navLabel>
      <content src="text/part1.xhtml"/>
      <navPoint id="p1c1" playOrder="2">
        <navLabel><text>Chapter   1</text></navLabel>
        <content src="text/ch1.xhtml#start"/>
      </navPoint>
    </navPoint>
    <navPoint id="empty"><navLabel><text>No target</text></navLabel></navPoint>
    <navPoint id="p2"><navLabel><text>Part Two</text></navLabel><content src="../p2.xhtml"/></navPoint>
  </navMap>
</ncx>"#;
        let toc = parse_ncx(ncx, "OEBPS/toc.ncx");
        let labels: Vec<&str> = toc.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Part One", "Chapter 1", "Part Two"]);
        assert_eq!(toc[1].id, "p1c1");
        assert_eq!(toc[1].href, "OEBPS/text/ch1.xhtml#start");
        assert_eq!(toc[2].href, "p2.xhtml");
    }

    #[test]
    fn test_parse_ncx_truncated() {
        let toc = parse_ncx(
            "<ncx><navMap><navPoint id=\"a\"><navLabel><text>A</text></navLabel><content src=\"a.xhtml\"/></navPoint><navPoint",
            "toc.ncx",
        );
        assert_eq!(toc.len(), 1);
    }

    #[test]
    fn test_parse_nav() {
        let nav = r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body>
  <nav epub:type="landmarks"><ol><li><a href="cover.xhtml">Cover</a></li></ol></nav>
  <nav epub:type="toc" id="toc">
    <ol>
      <li id="n1"><a href="ch1.xhtml">One</a>
        <ol><li><a href="ch1.xhtml#s2"><span>Section</span> two</a></li></ol>
      </li>
      <li><span>Heading only</span></li>
    </ol>
  </nav>
</body></html>"#;
        let toc = parse_nav(nav, "EPUB/nav.xhtml").unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].id, "n1");
        assert_eq!(toc[0].href, "EPUB/ch1.xhtml");
        assert_eq!(toc[1].label, "Section two");
        assert_eq!(toc[1].id, "toc-2");
    }
}
