//! `ComicInfo.xml` metadata (the ComicRack schema).

use crate::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Conventional part name.
pub const COMIC_INFO_PART: &str = "ComicInfo.xml";

/// Page turn direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// The `<Manga>` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Manga {
    #[default]
    Unknown,
    Yes,
    No,
    YesAndRightToLeft,
}

impl Manga {
    /// Parse the schema value; unrecognized text maps to `Unknown`.
    #[must_use = "returns the parsed value"]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Yes" => Self::Yes,
            "No" => Self::No,
            "YesAndRightToLeft" => Self::YesAndRightToLeft,
            _ => Self::Unknown,
        }
    }

    #[must_use = "returns the schema value"]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Yes => "Yes",
            Self::No => "No",
            Self::YesAndRightToLeft => "YesAndRightToLeft",
        }
    }

    /// Only `YesAndRightToLeft` flips the reading direction.
    #[must_use = "returns the reading direction"]
    pub const fn reading_direction(self) -> ReadingDirection {
        match self {
            Self::YesAndRightToLeft => ReadingDirection::RightToLeft,
            _ => ReadingDirection::LeftToRight,
        }
    }
}

/// Per-page entry from `<Pages>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicPageInfo {
    /// Zero-based page number (`Image` attribute)
    pub image: usize,
    pub double_page: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `Type` attribute such as `FrontCover`
    pub kind: Option<String>,
}

/// Comic metadata. Every field is optional; `None` means the element was
/// absent, `Some("")` means it was present and empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicInfo {
    pub title: Option<String>,
    pub series: Option<String>,
    pub number: Option<String>,
    pub writer: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub manga: Manga,
    pub summary: Option<String>,
    pub pages: Vec<ComicPageInfo>,
}

impl ComicInfo {
    /// Parse `ComicInfo.xml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is malformed. Unknown elements and
    /// out-of-range values are skipped.
    pub fn parse(xml: &str) -> Result<Self> {
        let opts = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(xml, opts)?;
        let mut info = Self::default();

        for node in doc.root_element().children().filter(roxmltree::Node::is_element) {
            let text = || node.text().unwrap_or("").trim().to_string();
            match node.tag_name().name() {
                "Title" => info.title = Some(text()),
                "Series" => info.series = Some(text()),
                "Number" => info.number = Some(text()),
                "Writer" => info.writer = Some(text()),
                "Publisher" => info.publisher = Some(text()),
                "Summary" => info.summary = Some(text()),
                "Year" => match text().parse::<i32>() {
                    Ok(y) if (1..=9999).contains(&y) => info.year = Some(y),
                    _ => log::warn!("Ignoring invalid ComicInfo year '{}'", text()),
                },
                "Manga" => info.manga = Manga::parse(&text()),
                "Pages" => info.pages = parse_pages(node),
                _ => {}
            }
        }
        Ok(info)
    }

    /// Page entry for zero-based page `image`.
    #[must_use = "returns the page entry"]
    pub fn page(&self, image: usize) -> Option<&ComicPageInfo> {
        self.pages.iter().find(|p| p.image == image)
    }

    /// Serialize back to `ComicInfo.xml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML writer fails.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new("ComicInfo");
        root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
        root.push_attribute(("xmlns:xsd", "http://www.w3.org/2001/XMLSchema"));
        writer.write_event(Event::Start(root))?;

        let year = self.year.map(|y| y.to_string());
        let fields = [
            ("Title", self.title.as_deref()),
            ("Series", self.series.as_deref()),
            ("Number", self.number.as_deref()),
            ("Summary", self.summary.as_deref()),
            ("Year", year.as_deref()),
            ("Writer", self.writer.as_deref()),
            ("Publisher", self.publisher.as_deref()),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                write_element(&mut writer, name, value)?;
            }
        }
        if self.manga != Manga::Unknown {
            write_element(&mut writer, "Manga", self.manga.as_str())?;
        }

        if !self.pages.is_empty() {
            writer.write_event(Event::Start(BytesStart::new("Pages")))?;
            for page in &self.pages {
                let mut el = BytesStart::new("Page");
                el.push_attribute(("Image", page.image.to_string().as_str()));
                if let Some(kind) = &page.kind {
                    el.push_attribute(("Type", kind.as_str()));
                }
                if page.double_page {
                    el.push_attribute(("DoublePage", "true"));
                }
                if let Some(w) = page.width {
                    el.push_attribute(("ImageWidth", w.to_string().as_str()));
                }
                if let Some(h) = page.height {
                    el.push_attribute(("ImageHeight", h.to_string().as_str()));
                }
                writer.write_event(Event::Empty(el))?;
            }
            writer.write_event(Event::End(BytesEnd::new("Pages")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("ComicInfo")))?;
        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn parse_pages(node: roxmltree::Node<'_, '_>) -> Vec<ComicPageInfo> {
    node.children()
        .filter(|n| n.has_tag_name("Page"))
        .filter_map(|n| {
            let image = n.attribute("Image")?.trim().parse().ok()?;
            let dim = |name: &str| n.attribute(name).and_then(|v| v.trim().parse().ok());
            Some(ComicPageInfo {
                image,
                double_page: n
                    .attribute("DoublePage")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true")),
                width: dim("ImageWidth"),
                height: dim("ImageHeight"),
                kind: n.attribute("Type").map(str::to_string),
            })
        })
        .collect()
}
