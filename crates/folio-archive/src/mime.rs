//! Content-type guessing for parts of containers that do not declare them.

use crate::path::extension;

/// Fallback for unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess a MIME type from the path's extension.
#[must_use = "returns the guessed content type"]
pub fn guess_content_type(path: &str) -> &'static str {
    match extension(path).as_str() {
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "jp2" | "j2k" | "jpx" => "image/jp2",
        "svg" => "image/svg+xml",
        "xhtml" | "xht" => "application/xhtml+xml",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "xml" => "application/xml",
        "ncx" => "application/x-dtbncx+xml",
        "opf" => "application/oebps-package+xml",
        "smil" => "application/smil+xml",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "odttf" => "application/vnd.ms-package.obfuscated-opentype",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "txt" => "text/plain",
        "rels" => "application/vnd.openxmlformats-package.relationships+xml",
        "fdseq" => "application/vnd.ms-package.xps-fixeddocumentsequence+xml",
        "fdoc" => "application/vnd.ms-package.xps-fixeddocument+xml",
        "fpage" => "application/vnd.ms-package.xps-fixedpage+xml",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_common_types() {
        assert_eq!(guess_content_type("p/001.JPG"), "image/jpeg");
        assert_eq!(guess_content_type("OEBPS/ch1.xhtml"), "application/xhtml+xml");
        assert_eq!(guess_content_type("Documents/1/Pages/1.fpage"), "application/vnd.ms-package.xps-fixedpage+xml");
        assert_eq!(guess_content_type("README"), OCTET_STREAM);
    }
}
