//! Well-known XPS content types and relationship types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `FixedRepresentation` relationship (MS XPS).
pub const REL_FIXED_REPRESENTATION: &str =
    "http://schemas.microsoft.com/xps/2005/06/fixedrepresentation";

/// `FixedRepresentation` relationship (OpenXPS, ECMA-388).
pub const REL_OXPS_FIXED_REPRESENTATION: &str =
    "http://schemas.openxps.org/oxps/v1.0/fixedrepresentation";

/// Part content types defined by the XPS package format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XpsContentType {
    FixedDocumentSequence,
    FixedDocument,
    FixedPage,
    Font,
    Image,
    IccProfile,
    ResourceDictionary,
    PrintTicket,
    Thumbnail,
}

impl XpsContentType {
    pub const ALL: [Self; 9] = [
        Self::FixedDocumentSequence,
        Self::FixedDocument,
        Self::FixedPage,
        Self::Font,
        Self::Image,
        Self::IccProfile,
        Self::ResourceDictionary,
        Self::PrintTicket,
        Self::Thumbnail,
    ];

    /// MIME string. Images and thumbnails may also be JPEG, TIFF or JPEG XR;
    /// PNG is reported as the representative type.
    #[must_use = "returns the MIME type"]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::FixedDocumentSequence => {
                "application/vnd.ms-package.xps-fixeddocumentsequence+xml"
            }
            Self::FixedDocument => "application/vnd.ms-package.xps-fixeddocument+xml",
            Self::FixedPage => "application/vnd.ms-package.xps-fixedpage+xml",
            Self::Font => "application/vnd.ms-opentype",
            Self::Image | Self::Thumbnail => "image/png",
            Self::IccProfile => "application/vnd.ms-color.iccprofile",
            Self::ResourceDictionary => "application/vnd.ms-package.xps-resourcedictionary+xml",
            Self::PrintTicket => "application/vnd.ms-printing.printticket+xml",
        }
    }

    /// Content type for a MIME string. Unambiguous only for the XPS-specific
    /// types; image MIME types map to [`XpsContentType::Image`].
    #[must_use = "returns the content type"]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/vnd.ms-package.obfuscated-opentype" | "application/x-font-ttf" => {
                Some(Self::Font)
            }
            m if m.starts_with("image/") => Some(Self::Image),
            m => Self::ALL
                .into_iter()
                .find(|t| t.mime_type() == m && *t != Self::Thumbnail),
        }
    }
}

impl fmt::Display for XpsContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Package relationship types used by XPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XpsRelationship {
    CoreProperties,
    DigitalSignature,
    Thumbnail,
    PrintTicket,
    RestrictedFont,
    RequiredResource,
}

impl XpsRelationship {
    #[must_use = "returns the relationship URI"]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::CoreProperties => folio_archive::opc::REL_CORE_PROPERTIES,
            Self::DigitalSignature => {
                "http://schemas.openxmlformats.org/package/2006/relationships/digital-signature/origin"
            }
            Self::Thumbnail => {
                "http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail"
            }
            Self::PrintTicket => "http://schemas.microsoft.com/xps/2005/06/printticket",
            Self::RestrictedFont => "http://schemas.microsoft.com/xps/2005/06/restricted-font",
            Self::RequiredResource => "http://schemas.microsoft.com/xps/2005/06/required-resource",
        }
    }
}

impl fmt::Display for XpsRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_round_trip_for_package_types() {
        for t in [
            XpsContentType::FixedDocumentSequence,
            XpsContentType::FixedDocument,
            XpsContentType::FixedPage,
            XpsContentType::ResourceDictionary,
        ] {
            assert_eq!(XpsContentType::from_mime(t.mime_type()), Some(t));
        }
        assert_eq!(
            XpsContentType::from_mime("image/jpeg"),
            Some(XpsContentType::Image)
        );
        assert_eq!(XpsContentType::from_mime("text/plain"), None);
    }

    #[test]
    fn test_relationship_uris() {
        assert!(XpsRelationship::CoreProperties.uri().ends_with("core-properties"));
        assert_eq!(
            XpsRelationship::RequiredResource.to_string(),
            "http://schemas.microsoft.com/xps/2005/06/required-resource"
        );
    }
}
