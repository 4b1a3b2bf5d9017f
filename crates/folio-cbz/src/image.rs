//! Page image format detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image encodings found in comic archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Jp2,
    #[default]
    Unknown,
}

const JP2_SIGNATURE: &[u8] = &[0x00, 0x00, 0x00, 0x0C, b'j', b'P', b' ', b' '];
const J2K_CODESTREAM: &[u8] = &[0xFF, 0x4F, 0xFF, 0x51];

impl ImageFormat {
    /// Format implied by a file name's extension.
    #[must_use = "returns the detected format"]
    pub fn from_name(name: &str) -> Self {
        match folio_archive::path::extension(name).as_str() {
            "jpg" | "jpeg" | "jfif" | "jpe" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            "bmp" => Self::Bmp,
            "tif" | "tiff" => Self::Tiff,
            "webp" => Self::Webp,
            "jp2" | "j2k" | "jpx" | "jpf" => Self::Jp2,
            _ => Self::Unknown,
        }
    }

    /// Format identified from the leading bytes.
    #[must_use = "returns the detected format"]
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(JP2_SIGNATURE) || data.starts_with(J2K_CODESTREAM) {
            return Self::Jp2;
        }
        match imagesize::image_type(data) {
            Ok(imagesize::ImageType::Jpeg) => Self::Jpeg,
            Ok(imagesize::ImageType::Png) => Self::Png,
            Ok(imagesize::ImageType::Gif) => Self::Gif,
            Ok(imagesize::ImageType::Bmp) => Self::Bmp,
            Ok(imagesize::ImageType::Tiff) => Self::Tiff,
            Ok(imagesize::ImageType::Webp) => Self::Webp,
            _ => Self::Unknown,
        }
    }

    /// Extension first, header bytes as fallback.
    #[must_use = "returns the detected format"]
    pub fn detect(name: &str, data: Option<&[u8]>) -> Self {
        match Self::from_name(name) {
            Self::Unknown => data.map_or(Self::Unknown, Self::sniff),
            known => known,
        }
    }

    #[must_use = "returns the format name"]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
            Self::Tiff => "TIFF",
            Self::Webp => "WebP",
            Self::Jp2 => "JPEG 2000",
            Self::Unknown => "Unknown",
        }
    }

    #[must_use = "returns the MIME type"]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Webp => "image/webp",
            Self::Jp2 => "image/jp2",
            Self::Unknown => folio_archive::mime::OCTET_STREAM,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `name` looks like a page image by extension.
#[must_use = "returns whether the name is an image"]
pub fn is_image_file(name: &str) -> bool {
    ImageFormat::from_name(name) != ImageFormat::Unknown
}

/// Pixel size from the image header, if it can be read.
#[must_use = "returns the image size"]
pub fn image_size(data: &[u8]) -> Option<(u32, u32)> {
    let size = imagesize::blob_size(data).ok()?;
    Some((
        u32::try_from(size.width).ok()?,
        u32::try_from(size.height).ok()?,
    ))
}
