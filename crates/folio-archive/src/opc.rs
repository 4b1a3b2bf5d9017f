//! Open Packaging Conventions helpers shared by the XPS and Office families.
//!
//! - `[Content_Types].xml`: `Default` entries map extensions to MIME types,
//!   `Override` entries map individual part names.
//! - `_rels/*.rels`: relationships from a source part (or the package) to
//!   target parts, with targets resolved relative to the source part.

use crate::error::{ArchiveError, Result};
use crate::path::{directory_of, extension, file_name, is_external, normalize_path, resolve};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Package-level relationships part.
pub const PACKAGE_RELS_PART: &str = "_rels/.rels";

/// Relationship type of the core properties part.
pub const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

pub(crate) fn parse_xml(xml: &str) -> Result<roxmltree::Document<'_>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    Ok(roxmltree::Document::parse_with_options(xml, options)?)
}

/// Decode part bytes as UTF-8 XML, tolerating a byte-order mark.
///
/// # Errors
///
/// Returns [`ArchiveError::Unsupported`] naming `path` when the bytes are not
/// valid UTF-8.
pub fn part_text<'a>(path: &str, data: &'a [u8]) -> Result<&'a str> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    std::str::from_utf8(data)
        .map_err(|e| ArchiveError::Unsupported(format!("{path} is not UTF-8 XML: {e}")))
}

/// Parsed `[Content_Types].xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypes {
    /// Lowercased extension → content type
    pub defaults: HashMap<String, String>,
    /// Normalized part path → content type
    pub overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse `[Content_Types].xml`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Xml`] if the document is not well-formed.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = parse_xml(xml)?;
        let mut types = Self::default();
        for node in doc.root_element().children().filter(|n| n.is_element()) {
            let Some(content_type) = node.attribute("ContentType") else {
                continue;
            };
            match node.tag_name().name() {
                "Default" => {
                    if let Some(ext) = node.attribute("Extension") {
                        types
                            .defaults
                            .insert(ext.to_ascii_lowercase(), content_type.to_string());
                    }
                }
                "Override" => {
                    let Some(name) = node.attribute("PartName") else {
                        continue;
                    };
                    match normalize_path(name) {
                        Ok(path) => {
                            types.overrides.insert(path, content_type.to_string());
                        }
                        Err(e) => log::warn!("Ignoring content type override '{name}': {e}"),
                    }
                }
                _ => {}
            }
        }
        Ok(types)
    }

    /// Declared content type for a normalized part path.
    #[must_use = "returns the declared content type"]
    pub fn content_type_for(&self, path: &str) -> Option<&str> {
        self.overrides
            .get(path)
            .or_else(|| self.defaults.get(&extension(path)))
            .map(String::as_str)
    }
}

/// One `<Relationship>` from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Resolved part path for internal targets, the raw URI for external ones
    pub target: String,
    pub external: bool,
}

/// `.rels` part describing the relationships of `source`. An empty source
/// names the package itself.
#[must_use = "returns the relationships part path"]
pub fn rels_path_for(source: &str) -> String {
    if source.is_empty() {
        return PACKAGE_RELS_PART.to_string();
    }
    format!("{}_rels/{}.rels", directory_of(source), file_name(source))
}

/// Parse a `.rels` part belonging to `source` (empty for the package).
///
/// Internal targets are resolved against `source` and normalized; targets
/// that fail to resolve are skipped with a warning.
///
/// # Errors
///
/// Returns [`ArchiveError::Xml`] if the document is not well-formed.
pub fn parse_relationships(xml: &str, source: &str) -> Result<Vec<Relationship>> {
    let doc = parse_xml(xml)?;
    let mut rels = Vec::new();
    for node in doc
        .root_element()
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
    {
        let (Some(id), Some(rel_type), Some(target)) = (
            node.attribute("Id"),
            node.attribute("Type"),
            node.attribute("Target"),
        ) else {
            continue;
        };
        let external =
            node.attribute("TargetMode") == Some("External") || is_external(target);
        let target = if external {
            target.to_string()
        } else {
            let resolved = if source.is_empty() {
                normalize_path(target)
            } else {
                resolve(source, target)
            };
            match resolved {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("Skipping relationship {id} -> '{target}': {e}");
                    continue;
                }
            }
        };
        rels.push(Relationship {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target,
            external,
        });
    }
    Ok(rels)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="XML" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

    #[test]
    fn test_content_types_lookup() {
        let ct = ContentTypes::parse(CONTENT_TYPES).unwrap();
        assert_eq!(
            ct.content_type_for("word/document.xml"),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml")
        );
        assert_eq!(ct.content_type_for("word/styles.xml"), Some("application/xml"));
        assert_eq!(ct.content_type_for("media/a.png"), None);
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for(""), "_rels/.rels");
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_path_for("FixedDocSeq.fdseq"), "_rels/FixedDocSeq.fdseq.rels");
    }

    #[test]
    fn test_parse_relationships_resolves_targets() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
  <Relationship Id="rId3" Type="x" Target="../customXml/item1.xml"/>
</Relationships>"#;
        let rels = parse_relationships(xml, "word/document.xml").unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(rels[0].target, "word/media/image1.png");
        assert!(!rels[0].external);
        assert_eq!(rels[1].target, "https://example.com");
        assert!(rels[1].external);
        assert_eq!(rels[2].target, "customXml/item1.xml");
    }

    #[test]
    fn test_package_relationships_resolve_from_root() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="R1" Type="t" Target="/FixedDocSeq.fdseq"/>
  <Relationship Id="R2" Type="t" Target="docProps/core.xml"/>
</Relationships>"#;
        let rels = parse_relationships(xml, "").unwrap();
        assert_eq!(rels[0].target, "FixedDocSeq.fdseq");
        assert_eq!(rels[1].target, "docProps/core.xml");
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(matches!(
            ContentTypes::parse("<Types><Default"),
            Err(ArchiveError::Xml(_))
        ));
    }

    #[test]
    fn test_part_text_strips_bom() {
        assert_eq!(part_text("a.xml", b"\xEF\xBB\xBF<a/>").unwrap(), "<a/>");
        assert!(part_text("a.xml", &[0xff, 0xfe, 0x00]).is_err());
    }
}
