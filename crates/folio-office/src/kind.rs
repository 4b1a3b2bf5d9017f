//! Office document types and container detection.

use folio_archive::opc::{part_text, CONTENT_TYPES_PART};
use folio_archive::Archive;
use serde::{Deserialize, Serialize};

/// ODF package `mimetype` part.
pub const MIMETYPE_PART: &str = "mimetype";

pub const ODT_MIME: &str = "application/vnd.oasis.opendocument.text";
pub const ODS_MIME: &str = "application/vnd.oasis.opendocument.spreadsheet";
pub const ODP_MIME: &str = "application/vnd.oasis.opendocument.presentation";

/// The six supported office formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfficeType {
    /// Microsoft Word (.docx)
    Docx,
    /// Microsoft Excel (.xlsx)
    Xlsx,
    /// Microsoft PowerPoint (.pptx)
    Pptx,
    /// `OpenDocument` Text (.odt)
    Odt,
    /// `OpenDocument` Spreadsheet (.ods)
    Ods,
    /// `OpenDocument` Presentation (.odp)
    Odp,
}

impl OfficeType {
    pub const ALL: [Self; 6] = [
        Self::Docx,
        Self::Xlsx,
        Self::Pptx,
        Self::Odt,
        Self::Ods,
        Self::Odp,
    ];

    /// Stable numeric code (0..=5).
    #[inline]
    #[must_use = "returns the type code"]
    pub const fn code(self) -> i32 {
        match self {
            Self::Docx => 0,
            Self::Xlsx => 1,
            Self::Pptx => 2,
            Self::Odt => 3,
            Self::Ods => 4,
            Self::Odp => 5,
        }
    }

    #[must_use = "returns the type for the code"]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Human-readable name
    #[inline]
    #[must_use = "returns the type name"]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Docx => "Microsoft Word",
            Self::Xlsx => "Microsoft Excel",
            Self::Pptx => "Microsoft PowerPoint",
            Self::Odt => "OpenDocument Text",
            Self::Ods => "OpenDocument Spreadsheet",
            Self::Odp => "OpenDocument Presentation",
        }
    }

    /// File extension without the dot
    #[inline]
    #[must_use = "returns file extension for type"]
    pub const fn type_extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Odt => "odt",
            Self::Ods => "ods",
            Self::Odp => "odp",
        }
    }

    /// Detect type from file extension
    #[must_use = "detects type from file extension"]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.type_extension() == ext)
    }

    #[inline]
    #[must_use = "returns whether the type is a word processor format"]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Docx | Self::Odt)
    }

    #[inline]
    #[must_use = "returns whether the type is a spreadsheet format"]
    pub const fn is_spreadsheet(self) -> bool {
        matches!(self, Self::Xlsx | Self::Ods)
    }

    #[inline]
    #[must_use = "returns whether the type is a presentation format"]
    pub const fn is_presentation(self) -> bool {
        matches!(self, Self::Pptx | Self::Odp)
    }

    #[inline]
    #[must_use = "returns whether the type is an OpenDocument format"]
    pub const fn is_odf(self) -> bool {
        matches!(self, Self::Odt | Self::Ods | Self::Odp)
    }

    /// Detect the type of a loaded container.
    ///
    /// ODF packages are identified by their `mimetype` part, OOXML packages
    /// by the main part content type in `[Content_Types].xml`. Without
    /// either, the presence of the conventional main part decides.
    #[must_use = "returns the detected type"]
    pub fn detect(archive: &Archive) -> Option<Self> {
        if let Some(mime) = archive
            .part_data(MIMETYPE_PART)
            .and_then(|d| std::str::from_utf8(d).ok())
        {
            match mime.trim() {
                ODT_MIME => return Some(Self::Odt),
                ODS_MIME => return Some(Self::Ods),
                ODP_MIME => return Some(Self::Odp),
                other => log::debug!("Ignoring mimetype '{other}'"),
            }
        }

        if let Some(types) = archive
            .part_data(CONTENT_TYPES_PART)
            .and_then(|d| part_text(CONTENT_TYPES_PART, d).ok())
        {
            if types.contains("wordprocessingml.document.main") {
                return Some(Self::Docx);
            }
            if types.contains("spreadsheetml.sheet.main") {
                return Some(Self::Xlsx);
            }
            if types.contains("presentationml.presentation.main")
                || types.contains("presentationml.slideshow.main")
            {
                return Some(Self::Pptx);
            }
        }

        if archive.has_part("word/document.xml") {
            Some(Self::Docx)
        } else if archive.has_part("xl/workbook.xml") {
            Some(Self::Xlsx)
        } else if archive.has_part("ppt/presentation.xml") {
            Some(Self::Pptx)
        } else if let Some(content) = archive
            .part_data("content.xml")
            .and_then(|d| std::str::from_utf8(d).ok())
        {
            if content.contains("<office:text") {
                Some(Self::Odt)
            } else if content.contains("<office:spreadsheet") {
                Some(Self::Ods)
            } else if content.contains("<office:presentation") {
                Some(Self::Odp)
            } else {
                None
            }
        } else {
            None
        }
    }
}

impl std::fmt::Display for OfficeType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_extension())
    }
}

impl std::str::FromStr for OfficeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| {
            format!("unknown office type: '{s}' (expected docx, xlsx, pptx, odt, ods or odp)")
        })
    }
}
