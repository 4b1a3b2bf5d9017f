//! Manifest media type classification.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const XHTML: &str = "application/xhtml+xml";
pub const NCX: &str = "application/x-dtbncx+xml";
pub const OPF: &str = "application/oebps-package+xml";

/// Coarse media type of a manifest item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Xhtml,
    Css,
    Image,
    Font,
    Audio,
    Video,
    Ncx,
    Svg,
    Js,
    Smil,
    Other,
}

impl MediaType {
    /// Classify a MIME type string (parameters ignored).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use folio_epub::MediaType;
    ///
    /// assert_eq!(MediaType::classify("application/xhtml+xml"), MediaType::Xhtml);
    /// assert_eq!(MediaType::classify("image/svg+xml"), MediaType::Svg);
    /// assert_eq!(MediaType::classify("font/woff2"), MediaType::Font);
    /// ```
    #[must_use = "returns the classification"]
    pub fn classify(mime: &str) -> Self {
        let mime = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            XHTML | "text/html" | "application/x-dtbook+xml" => Self::Xhtml,
            "text/css" => Self::Css,
            NCX => Self::Ncx,
            "image/svg+xml" => Self::Svg,
            "application/javascript" | "text/javascript" | "application/ecmascript" => Self::Js,
            "application/smil+xml" => Self::Smil,
            "application/vnd.ms-opentype"
            | "application/font-woff"
            | "application/x-font-ttf"
            | "application/x-font-otf" => Self::Font,
            m if m.starts_with("image/") => Self::Image,
            m if m.starts_with("font/") => Self::Font,
            m if m.starts_with("audio/") => Self::Audio,
            m if m.starts_with("video/") => Self::Video,
            _ => Self::Other,
        }
    }

    /// Canonical MIME type for the class.
    #[must_use = "returns the MIME type"]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Xhtml => XHTML,
            Self::Css => "text/css",
            Self::Image => "image/*",
            Self::Font => "font/*",
            Self::Audio => "audio/*",
            Self::Video => "video/*",
            Self::Ncx => NCX,
            Self::Svg => "image/svg+xml",
            Self::Js => "application/javascript",
            Self::Smil => "application/smil+xml",
            Self::Other => folio_archive::mime::OCTET_STREAM,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}
