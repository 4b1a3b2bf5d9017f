//! Container and package (OPF) documents.

use crate::error::{EpubError, Result};
use crate::media::{MediaType, OPF};
use folio_archive::path::{directory_of, is_external};
use folio_archive::resolve;
use serde::{Deserialize, Serialize};

pub const CONTAINER_PART: &str = "META-INF/container.xml";

const OPF_NS: &str = "http://www.idpf.org/2007/opf";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// Package version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpubVersion {
    V2,
    #[default]
    V3,
}

impl EpubVersion {
    #[must_use = "returns the major version"]
    pub const fn number(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    #[must_use = "returns the version"]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            _ => None,
        }
    }
}

/// `page-progression-direction` of the spine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Ltr,
    Rtl,
    #[default]
    Default,
}

impl Direction {
    fn parse(s: &str) -> Self {
        match s.trim() {
            "ltr" => Self::Ltr,
            "rtl" => Self::Rtl,
            _ => Self::Default,
        }
    }
}

/// Dublin Core metadata. `None` means the element was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpubMetadata {
    pub title: Option<String>,
    pub creators: Vec<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

/// One `<item>` of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    pub id: String,
    /// `href` as declared
    pub href: String,
    /// Archive path the href resolves to (empty for external resources)
    pub path: String,
    pub media_type: String,
    pub properties: Vec<String>,
}

impl ManifestItem {
    #[must_use = "returns the media classification"]
    pub fn kind(&self) -> MediaType {
        MediaType::classify(&self.media_type)
    }

    #[must_use = "returns whether the item has the property"]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }

    #[must_use = "returns whether the item is outside the container"]
    pub fn is_external(&self) -> bool {
        self.path.is_empty()
    }
}

/// One `<itemref>` of the spine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpineItem {
    pub idref: String,
    pub linear: bool,
}

/// Parsed package document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Archive path of the OPF
    pub path: String,
    pub version: EpubVersion,
    pub direction: Direction,
    pub metadata: EpubMetadata,
    pub manifest: Vec<ManifestItem>,
    pub spine: Vec<SpineItem>,
    /// Manifest id named by the spine's `toc` attribute (EPUB 2)
    pub toc_id: Option<String>,
}

impl Package {
    /// Directory hrefs are resolved against.
    #[must_use = "returns the package directory"]
    pub fn base(&self) -> &str {
        directory_of(&self.path)
    }

    #[must_use = "returns the manifest item"]
    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|i| i.id == id)
    }

    /// Manifest item for an href resolved against the package directory.
    pub(crate) fn make_item(
        &self,
        id: &str,
        href: &str,
        media_type: &str,
        properties: Vec<String>,
    ) -> Result<ManifestItem> {
        let path = if is_external(href) {
            String::new()
        } else {
            let resolved = resolve(&self.path, href)?;
            folio_archive::split_fragment(&resolved).0.to_string()
        };
        Ok(ManifestItem {
            id: id.to_string(),
            href: href.to_string(),
            path,
            media_type: media_type.to_string(),
            properties,
        })
    }
}

fn parse_xml(xml: &str) -> Result<roxmltree::Document<'_>> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    Ok(roxmltree::Document::parse_with_options(xml, opts)?)
}

/// Rootfile path from `META-INF/container.xml`, preferring the OPF media type.
///
/// # Errors
///
/// Returns an error if the XML is malformed or names no rootfile.
pub fn parse_container(xml: &str) -> Result<String> {
    let doc = parse_xml(xml)?;
    let rootfiles: Vec<_> = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "rootfile")
        .filter_map(|n| Some((n.attribute("full-path")?, n.attribute("media-type"))))
        .collect();
    rootfiles
        .iter()
        .find(|(_, mt)| *mt == Some(OPF))
        .or_else(|| rootfiles.first())
        .map(|(path, _)| (*path).to_string())
        .ok_or(EpubError::MissingPackage)
}

fn element_text(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(roxmltree::Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the package document stored at `path`.
///
/// Manifest hrefs are resolved to archive paths. Existence of the parts is
/// checked by the caller, which owns the archive.
///
/// # Errors
///
/// Returns an error for malformed XML or an href that escapes the container.
pub fn parse_package(xml: &str, path: &str) -> Result<Package> {
    let doc = parse_xml(xml)?;
    let root = doc.root_element();
    let mut pkg = Package {
        path: path.to_string(),
        version: match root.attribute("version") {
            Some(v) if v.trim_start().starts_with('2') => EpubVersion::V2,
            _ => EpubVersion::V3,
        },
        ..Package::default()
    };
    let unique_id = root.attribute("unique-identifier");

    for section in root.children().filter(roxmltree::Node::is_element) {
        match section.tag_name().name() {
            "metadata" => parse_metadata(section, unique_id, &mut pkg.metadata),
            "manifest" => {
                for item in section.children().filter(|n| n.has_tag_name("item")) {
                    let (Some(id), Some(href)) = (item.attribute("id"), item.attribute("href"))
                    else {
                        log::warn!("Skipping manifest item without id or href");
                        continue;
                    };
                    if pkg.item(id).is_some() {
                        log::warn!("Duplicate manifest id '{id}', keeping the first");
                        continue;
                    }
                    let properties = item
                        .attribute("properties")
                        .map(|p| p.split_whitespace().map(str::to_string).collect())
                        .unwrap_or_default();
                    let media_type = item.attribute("media-type").unwrap_or_default();
                    let entry = pkg.make_item(id, href, media_type, properties)?;
                    pkg.manifest.push(entry);
                }
            }
            "spine" => {
                pkg.toc_id = section.attribute("toc").map(str::to_string);
                pkg.direction = section
                    .attribute("page-progression-direction")
                    .map_or(Direction::Default, Direction::parse);
                for itemref in section.children().filter(|n| n.has_tag_name("itemref")) {
                    let Some(idref) = itemref.attribute("idref") else {
                        continue;
                    };
                    pkg.spine.push(SpineItem {
                        idref: idref.to_string(),
                        linear: itemref.attribute("linear") != Some("no"),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(pkg)
}

fn parse_metadata(node: roxmltree::Node<'_, '_>, unique_id: Option<&str>, md: &mut EpubMetadata) {
    let mut identifiers = Vec::new();
    for el in node.descendants().filter(roxmltree::Node::is_element) {
        let ns = el.tag_name().namespace();
        if ns != Some(DC_NS) && ns != Some(OPF_NS) && ns.is_some() {
            continue;
        }
        let text = element_text(el);
        match el.tag_name().name() {
            "title" if md.title.is_none() => md.title = Some(text),
            "creator" => md.creators.push(text),
            "language" if md.language.is_none() => md.language = Some(text),
            "publisher" if md.publisher.is_none() => md.publisher = Some(text),
            "date" if md.date.is_none() => md.date = Some(text),
            "description" if md.description.is_none() => md.description = Some(text),
            "identifier" => identifiers.push((el.attribute("id").map(str::to_string), text)),
            _ => {}
        }
    }
    md.identifier = identifiers
        .iter()
        .find(|(id, _)| id.is_some() && id.as_deref() == unique_id)
        .or_else(|| identifiers.first())
        .map(|(_, text)| text.clone());
}
