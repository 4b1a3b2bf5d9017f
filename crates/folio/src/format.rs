//! Document formats and container sniffing.

use folio_archive::Archive;
use folio_cbz::is_image_file;
use folio_epub::package::CONTAINER_PART;
use folio_office::OfficeType;
use folio_xps::content::{REL_FIXED_REPRESENTATION, REL_OXPS_FIXED_REPRESENTATION};
use serde::{Deserialize, Serialize};
use std::fmt;

const EPUB_MIME: &str = "application/epub+zip";
const PACKAGE_RELS_PART: &str = "_rels/.rels";

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentFormat {
    /// Comic archive (.cbz, .cbt, .cb7)
    Cbz,
    /// E-book (.epub)
    Epub,
    /// Fixed-layout XPS or OpenXPS (.xps, .oxps)
    Xps,
    /// Microsoft Word (.docx)
    Docx,
    /// Microsoft Excel (.xlsx)
    Xlsx,
    /// Microsoft `PowerPoint` (.pptx)
    Pptx,
    /// `OpenDocument` Text (.odt)
    Odt,
    /// `OpenDocument` Spreadsheet (.ods)
    Ods,
    /// `OpenDocument` Presentation (.odp)
    Odp,
}

impl DocumentFormat {
    pub const ALL: [Self; 9] = [
        Self::Cbz,
        Self::Epub,
        Self::Xps,
        Self::Docx,
        Self::Xlsx,
        Self::Pptx,
        Self::Odt,
        Self::Ods,
        Self::Odp,
    ];

    /// Detect format from file extension
    #[must_use = "detects format from file extension"]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "cbz" | "cbt" | "cb7" | "cbr" => Some(Self::Cbz),
            "epub" => Some(Self::Epub),
            "xps" | "oxps" => Some(Self::Xps),
            "docx" => Some(Self::Docx),
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "pptx" => Some(Self::Pptx),
            "odt" => Some(Self::Odt),
            "ods" => Some(Self::Ods),
            "odp" => Some(Self::Odp),
            _ => None,
        }
    }

    /// Identify the family of a loaded container from its parts.
    ///
    /// Checked in order: EPUB container or mimetype, XPS document sequence,
    /// office main part, then any image entry for a comic.
    #[must_use = "returns the detected format"]
    pub fn detect(archive: &Archive) -> Option<Self> {
        let mimetype = archive
            .part_data("mimetype")
            .and_then(|d| std::str::from_utf8(d).ok())
            .map(str::trim);
        if archive.has_part(CONTAINER_PART) || mimetype == Some(EPUB_MIME) {
            return Some(Self::Epub);
        }
        if is_xps(archive) {
            return Some(Self::Xps);
        }
        if let Some(office) = OfficeType::detect(archive) {
            return Some(office.into());
        }
        if archive.paths().any(is_image_file) {
            return Some(Self::Cbz);
        }
        None
    }

    /// The office type for the six office formats.
    #[must_use = "returns the office type"]
    pub const fn office_type(self) -> Option<OfficeType> {
        match self {
            Self::Docx => Some(OfficeType::Docx),
            Self::Xlsx => Some(OfficeType::Xlsx),
            Self::Pptx => Some(OfficeType::Pptx),
            Self::Odt => Some(OfficeType::Odt),
            Self::Ods => Some(OfficeType::Ods),
            Self::Odp => Some(OfficeType::Odp),
            Self::Cbz | Self::Epub | Self::Xps => None,
        }
    }

    #[must_use = "returns the format name"]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cbz => "CBZ",
            Self::Epub => "EPUB",
            Self::Xps => "XPS",
            Self::Docx => "DOCX",
            Self::Xlsx => "XLSX",
            Self::Pptx => "PPTX",
            Self::Odt => "ODT",
            Self::Ods => "ODS",
            Self::Odp => "ODP",
        }
    }
}

impl From<OfficeType> for DocumentFormat {
    fn from(office: OfficeType) -> Self {
        match office {
            OfficeType::Docx => Self::Docx,
            OfficeType::Xlsx => Self::Xlsx,
            OfficeType::Pptx => Self::Pptx,
            OfficeType::Odt => Self::Odt,
            OfficeType::Ods => Self::Ods,
            OfficeType::Odp => Self::Odp,
        }
    }
}

impl fmt::Display for DocumentFormat {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_xps(archive: &Archive) -> bool {
    if archive.paths().any(|p| p.to_ascii_lowercase().ends_with(".fdseq")) {
        return true;
    }
    archive
        .part_data(PACKAGE_RELS_PART)
        .and_then(|d| std::str::from_utf8(d).ok())
        .is_some_and(|rels| {
            rels.contains(REL_FIXED_REPRESENTATION) || rels.contains(REL_OXPS_FIXED_REPRESENTATION)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(parts: &[(&str, &str)]) -> Archive {
        let mut archive = Archive::new();
        for (path, data) in parts {
            archive.add_part(path, data.as_bytes().to_vec(), "").unwrap();
        }
        archive
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(DocumentFormat::from_extension("CBZ"), Some(DocumentFormat::Cbz));
        assert_eq!(DocumentFormat::from_extension("cb7"), Some(DocumentFormat::Cbz));
        assert_eq!(DocumentFormat::from_extension("oxps"), Some(DocumentFormat::Xps));
        assert_eq!(DocumentFormat::from_extension("Odp"), Some(DocumentFormat::Odp));
        assert_eq!(DocumentFormat::from_extension("pdf"), None);
    }

    #[test]
    fn test_detect() {
        let epub = archive(&[("mimetype", "application/epub+zip\n")]);
        assert_eq!(DocumentFormat::detect(&epub), Some(DocumentFormat::Epub));

        let xps = archive(&[("FixedDocSeq.fdseq", "<FixedDocumentSequence/>")]);
        assert_eq!(DocumentFormat::detect(&xps), Some(DocumentFormat::Xps));

        let odt = archive(&[
            ("mimetype", "application/vnd.oasis.opendocument.text"),
            ("content.xml", "<office:document-content/>"),
        ]);
        assert_eq!(DocumentFormat::detect(&odt), Some(DocumentFormat::Odt));

        let comic = archive(&[("notes.txt", ""), ("p1.jpg", "")]);
        assert_eq!(DocumentFormat::detect(&comic), Some(DocumentFormat::Cbz));

        assert_eq!(DocumentFormat::detect(&archive(&[("readme.txt", "")])), None);
    }

    #[test]
    fn test_office_round_trip() {
        for t in OfficeType::ALL {
            assert_eq!(DocumentFormat::from(t).office_type(), Some(t));
        }
        assert_eq!(DocumentFormat::Epub.office_type(), None);
        assert_eq!(DocumentFormat::Pptx.to_string(), "PPTX");
    }
}
