//! Package helpers shared by the OOXML and ODF readers: part lookup,
//! relationships, attribute access and core properties.

use crate::error::{OfficeError, Result};
use folio_archive::opc::{parse_relationships, part_text, rels_path_for, PACKAGE_RELS_PART};
use folio_archive::{Archive, Relationship};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// OOXML core properties part.
pub const CORE_PART: &str = "docProps/core.xml";

/// ODF content, meta and styles parts.
pub const ODF_CONTENT_PART: &str = "content.xml";
pub const ODF_META_PART: &str = "meta.xml";
pub const ODF_STYLES_PART: &str = "styles.xml";

/// EMUs (English Metric Units) per point.
pub const EMU_PER_POINT: f32 = 12_700.0;

/// Twips (twentieths of a point) per point.
pub const TWIPS_PER_POINT: f32 = 20.0;

/// Text of a part that must exist.
///
/// # Errors
///
/// Returns [`OfficeError::MissingFile`] if the part is absent and an
/// archive error if it is not UTF-8.
pub fn required_text<'a>(archive: &'a Archive, path: &str) -> Result<&'a str> {
    let data = archive
        .part_data(path)
        .ok_or_else(|| OfficeError::MissingFile(path.to_string()))?;
    Ok(part_text(path, data)?)
}

/// Text of an optional part. Undecodable parts are logged and skipped.
#[must_use = "returns the part text"]
pub fn optional_text<'a>(archive: &'a Archive, path: &str) -> Option<&'a str> {
    let data = archive.part_data(path)?;
    match part_text(path, data) {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("Skipping unreadable part {path}: {e}");
            None
        }
    }
}

/// Relationships of a part (empty for the package), or none if the `.rels`
/// part is absent.
///
/// # Errors
///
/// Returns an error if the `.rels` part is malformed.
pub fn part_rels(archive: &Archive, source: &str) -> Result<Vec<Relationship>> {
    let rels_path = rels_path_for(source);
    match optional_text(archive, &rels_path) {
        Some(xml) => Ok(parse_relationships(xml, source)?),
        None => Ok(Vec::new()),
    }
}

/// First internal relationship whose type ends with `/{suffix}`. Matching
/// the suffix covers both transitional and strict namespaces.
#[must_use = "returns the matching relationship"]
pub fn rel_by_type<'a>(rels: &'a [Relationship], suffix: &str) -> Option<&'a Relationship> {
    rels.iter().find(|r| !r.external && type_matches(&r.rel_type, suffix))
}

#[must_use = "returns whether the relationship type matches"]
pub fn type_matches(rel_type: &str, suffix: &str) -> bool {
    rel_type
        .rsplit_once('/')
        .is_some_and(|(_, last)| last == suffix)
}

/// Main document part: the package `officeDocument` relationship, else
/// `default`.
///
/// # Errors
///
/// Returns an error if `_rels/.rels` is malformed.
pub fn main_part(archive: &Archive, default: &str) -> Result<String> {
    if archive.has_part(PACKAGE_RELS_PART) {
        let rels = part_rels(archive, "")?;
        if let Some(rel) = rel_by_type(&rels, "officeDocument") {
            return Ok(rel.target.clone());
        }
    }
    Ok(default.to_string())
}

/// Attribute by qualified name (`w:val`), unescaped.
#[must_use = "returns the attribute value"]
pub fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(std::borrow::Cow::into_owned)
}

/// Attribute by local name, ignoring any prefix.
#[must_use = "returns the attribute value"]
pub fn local_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(std::borrow::Cow::into_owned)
}

/// `w:val="0"` or `"false"` switches a toggle property off.
#[must_use = "returns whether the toggle is off"]
pub fn toggle_off(e: &BytesStart<'_>) -> bool {
    matches!(attr(e, b"w:val").as_deref(), Some("0" | "false" | "off"))
}

/// Title and creator of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfficeMetadata {
    pub title: Option<String>,
    pub creator: Option<String>,
}

impl OfficeMetadata {
    /// Parse OOXML `docProps/core.xml` or ODF `meta.xml`. Elements are
    /// matched by local name; `meta:initial-creator` wins over `dc:creator`.
    /// An element that is present but empty yields `Some("")`.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is malformed.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut meta = Self::default();
        let mut initial_creator: Option<String> = None;
        let mut current: Option<&'static str> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    current = match e.local_name().as_ref() {
                        b"title" => Some("title"),
                        b"creator" => Some("creator"),
                        b"initial-creator" => Some("initial-creator"),
                        _ => None,
                    };
                    let slot = match current {
                        Some("title") => Some(&mut meta.title),
                        Some("creator") => Some(&mut meta.creator),
                        Some(_) => Some(&mut initial_creator),
                        None => None,
                    };
                    if let Some(slot) = slot {
                        slot.get_or_insert_with(String::new);
                    }
                }
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"title" => {
                        meta.title.get_or_insert_with(String::new);
                    }
                    b"creator" => {
                        meta.creator.get_or_insert_with(String::new);
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    let slot = match current {
                        Some("title") => meta.title.as_mut(),
                        Some("creator") => meta.creator.as_mut(),
                        Some(_) => initial_creator.as_mut(),
                        None => None,
                    };
                    if let Some(value) = slot {
                        value.push_str(&e.unescape()?);
                    }
                }
                Event::End(_) => current = None,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        if initial_creator.is_some() {
            meta.creator = initial_creator;
        }
        Ok(meta)
    }
}

/// Parse a length such as `21cm`, `8.5in`, `612pt` or `210mm` into points.
#[must_use = "returns the length in points"]
pub fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let n: f32 = number.trim().parse().ok()?;
    let points = match unit {
        "pt" | "" => n,
        "in" => n * 72.0,
        "cm" => n * 72.0 / 2.54,
        "mm" => n * 72.0 / 25.4,
        "pc" => n * 12.0,
        "px" => n * 0.75,
        _ => return None,
    };
    (points.is_finite() && points > 0.0).then_some(points)
}
