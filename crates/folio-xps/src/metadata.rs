//! XPS document metadata

use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// XPS document metadata (from the core properties part)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XpsMetadata {
    /// Document title
    pub title: Option<String>,

    /// Document author(s)
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Last modifying user or application (`cp:lastModifiedBy`)
    pub creator: Option<String>,

    /// Document keywords
    pub keywords: Option<String>,

    /// Document description
    pub description: Option<String>,

    /// Creation date (ISO 8601)
    pub created: Option<String>,

    /// Last modified date (ISO 8601)
    pub modified: Option<String>,
}

impl XpsMetadata {
    /// Create empty metadata
    #[inline]
    #[must_use = "creates empty metadata"]
    pub const fn new() -> Self {
        Self {
            title: None,
            author: None,
            subject: None,
            creator: None,
            keywords: None,
            description: None,
            created: None,
            modified: None,
        }
    }

    fn slot(&mut self, local_name: &[u8]) -> Option<&mut Option<String>> {
        Some(match local_name {
            b"title" => &mut self.title,
            b"creator" => &mut self.author,
            b"subject" => &mut self.subject,
            b"lastModifiedBy" => &mut self.creator,
            b"keywords" => &mut self.keywords,
            b"description" => &mut self.description,
            b"created" => &mut self.created,
            b"modified" => &mut self.modified,
            _ => return None,
        })
    }

    /// Parse a core properties part. Elements are matched by local name, so
    /// any namespace prefix works. An element that is present but empty
    /// yields `Some("")`.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is malformed.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut metadata = Self::new();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut current: Option<Vec<u8>> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.local_name().as_ref().to_vec();
                    if let Some(slot) = metadata.slot(&name) {
                        slot.get_or_insert_with(String::new);
                        current = Some(name);
                    } else {
                        current = None;
                    }
                }
                Event::Empty(e) => {
                    if let Some(slot) = metadata.slot(e.local_name().as_ref()) {
                        slot.get_or_insert_with(String::new);
                    }
                }
                Event::Text(e) => {
                    if let Some(name) = &current {
                        let text = e.unescape()?;
                        if let Some(Some(value)) = metadata.slot(name) {
                            value.push_str(&text);
                        }
                    }
                }
                Event::End(_) => current = None,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_core_properties() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
    xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">
  <dc:title>Quarterly &amp; Annual</dc:title>
  <dc:creator>Test Author</dc:creator>
  <cp:keywords/>
  <cp:lastModifiedBy>Printer</cp:lastModifiedBy>
  <dcterms:created>2024-01-02T03:04:05Z</dcterms:created>
</cp:coreProperties>"#;
        let meta = XpsMetadata::parse(xml).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Quarterly & Annual"));
        assert_eq!(meta.author.as_deref(), Some("Test Author"));
        assert_eq!(meta.creator.as_deref(), Some("Printer"));
        assert_eq!(meta.keywords.as_deref(), Some(""));
        assert_eq!(meta.created.as_deref(), Some("2024-01-02T03:04:05Z"));
        assert_eq!(meta.subject, None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(XpsMetadata::parse("<a><b></a>").is_err());
    }
}
