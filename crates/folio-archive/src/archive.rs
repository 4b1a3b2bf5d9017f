//! The part store: normalized path → bytes + content type.

use crate::error::{ArchiveError, Result};
use crate::loader::RawEntry;
use crate::mime::guess_content_type;
use crate::opc::{part_text, ContentTypes, CONTENT_TYPES_PART};
use crate::path::normalize_path;
use crate::sevenz::{read_7z_entries, SEVENZ_MAGIC};
use crate::stream::ByteStream;
use crate::tar::{is_tar, read_tar_entries, GZIP_MAGIC};
use crate::zip::read_zip_entries;
use crate::MAX_PART_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

/// RAR 1.5+ signature prefix
const RAR_MAGIC: &[u8] = b"Rar!\x1A\x07";

/// Container format an archive was loaded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Built in memory
    #[default]
    Memory,
    Zip,
    Tar,
    SevenZ,
    Rar,
}

impl ArchiveFormat {
    /// Identify a container by its leading bytes.
    #[must_use = "returns the detected format"]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if bytes.starts_with(&SEVENZ_MAGIC) {
            Some(Self::SevenZ)
        } else if bytes.starts_with(RAR_MAGIC) {
            Some(Self::Rar)
        } else if bytes.starts_with(&GZIP_MAGIC) || is_tar(bytes) {
            Some(Self::Tar)
        } else {
            None
        }
    }

    #[must_use = "returns the format name"]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::SevenZ => "7z",
            Self::Rar => "rar",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named byte payload with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    path: String,
    data: Vec<u8>,
    content_type: String,
}

impl Part {
    /// Normalized path within the archive
    #[inline]
    #[must_use = "returns the part path"]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    #[must_use = "returns the part bytes"]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    #[must_use = "returns the content type"]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    #[must_use = "returns the payload length"]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use = "returns whether the payload is empty"]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Append-only virtual filesystem.
///
/// Paths are unique and looked up by exact, case-sensitive match on their
/// normalized form. Parts keep the order they were added in ("archive
/// order"), which is independent of any reading order a document imposes.
///
/// # Examples
///
/// ```rust
/// use folio_archive::Archive;
///
/// let mut archive = Archive::new();
/// archive.add_part("OEBPS/ch1.xhtml", b"<html/>".to_vec(), "application/xhtml+xml")?;
/// assert!(archive.has_part("/OEBPS/./ch1.xhtml"));
/// assert!(archive.add_part("OEBPS/ch1.xhtml", Vec::new(), "").is_err());
/// # Ok::<(), folio_archive::ArchiveError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    format: ArchiveFormat,
    parts: Vec<Part>,
    index: HashMap<String, usize>,
}

impl Archive {
    /// Empty in-memory archive.
    #[must_use = "creates a new Archive"]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use = "returns the container format"]
    pub const fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Number of parts.
    #[inline]
    #[must_use = "returns the part count"]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    #[must_use = "returns whether the archive has no parts"]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Whether a part exists at `path` (normalized before lookup).
    #[must_use = "returns whether the part exists"]
    pub fn has_part(&self, path: &str) -> bool {
        self.get_part(path).is_some()
    }

    /// Part at `path` (normalized before lookup). Invalid paths are simply
    /// not found.
    #[must_use = "returns the part if present"]
    pub fn get_part(&self, path: &str) -> Option<&Part> {
        let key = normalize_path(path).ok()?;
        self.index.get(&key).map(|&i| &self.parts[i])
    }

    /// Bytes of the part at `path`. `None` means not found; a present
    /// zero-length part returns `Some(&[])`.
    #[must_use = "returns the part data if present"]
    pub fn part_data(&self, path: &str) -> Option<&[u8]> {
        self.get_part(path).map(Part::data)
    }

    /// Insert a new part. An empty `content_type` is guessed from the
    /// extension.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::InvalidPath`] / [`ArchiveError::PathEscapesRoot`]
    ///   if `path` does not normalize
    /// - [`ArchiveError::DuplicatePart`] if the normalized path exists; the
    ///   existing part is left untouched
    pub fn add_part(&mut self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let path = normalize_path(path)?;
        if self.index.contains_key(&path) {
            return Err(ArchiveError::DuplicatePart(path));
        }
        let content_type = if content_type.is_empty() {
            guess_content_type(&path).to_string()
        } else {
            content_type.to_string()
        };
        self.index.insert(path.clone(), self.parts.len());
        self.parts.push(Part {
            path,
            data,
            content_type,
        });
        Ok(())
    }

    /// Parts in archive order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> + '_ {
        self.parts.iter()
    }

    /// Part paths in archive order.
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.parts.iter().map(Part::path)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load a container from memory, detecting the format from its magic
    /// bytes. Parts larger than [`MAX_PART_SIZE`] are skipped.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::Unrecognized`] for unknown bytes
    /// - [`ArchiveError::Unsupported`] for RAR
    /// - any loader error for a corrupt container
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with_limit(bytes, MAX_PART_SIZE)
    }

    /// [`Archive::from_bytes`] with an explicit per-part size limit.
    ///
    /// # Errors
    ///
    /// See [`Archive::from_bytes`].
    pub fn from_bytes_with_limit(bytes: &[u8], max_part_size: u64) -> Result<Self> {
        let format = ArchiveFormat::sniff(bytes).ok_or(ArchiveError::Unrecognized)?;
        let entries = match format {
            ArchiveFormat::Zip => read_zip_entries(Cursor::new(bytes), max_part_size)?,
            ArchiveFormat::Tar => read_tar_entries(bytes, max_part_size)?,
            ArchiveFormat::SevenZ => read_7z_entries(bytes, max_part_size)?,
            ArchiveFormat::Rar | ArchiveFormat::Memory => {
                return Err(ArchiveError::Unsupported(format.name().to_string()))
            }
        };
        log::debug!("Loaded {} {} entries", entries.len(), format);
        Ok(Self::from_entries(format, entries))
    }

    /// Load a container from a file.
    ///
    /// # Errors
    ///
    /// I/O errors reading the file, then see [`Archive::from_bytes`].
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Load a container from the remainder of a byte stream.
    ///
    /// # Errors
    ///
    /// I/O errors reading the stream, then see [`Archive::from_bytes`].
    pub fn from_stream(stream: &mut ByteStream, max_part_size: u64) -> Result<Self> {
        let bytes = stream.read_all()?;
        Self::from_bytes_with_limit(&bytes, max_part_size)
    }

    /// Assemble an archive from loaded entries. Content types come from an
    /// OPC `[Content_Types].xml` part when present, else from extensions.
    /// Later duplicates of a name are dropped with a warning.
    #[must_use = "returns the assembled archive"]
    pub fn from_entries(format: ArchiveFormat, entries: Vec<RawEntry>) -> Self {
        let declared = entries
            .iter()
            .find(|e| e.name == CONTENT_TYPES_PART)
            .and_then(|e| {
                let text = part_text(&e.name, &e.data).ok()?;
                ContentTypes::parse(text)
                    .map_err(|err| log::warn!("Ignoring malformed {CONTENT_TYPES_PART}: {err}"))
                    .ok()
            });

        let mut archive = Self {
            format,
            ..Self::default()
        };
        for RawEntry { name, data } in entries {
            if archive.index.contains_key(&name) {
                log::warn!("Duplicate entry {name} in {format} archive, keeping the first");
                continue;
            }
            let content_type = declared
                .as_ref()
                .and_then(|ct| ct.content_type_for(&name))
                .unwrap_or_else(|| guess_content_type(&name))
                .to_string();
            archive.index.insert(name.clone(), archive.parts.len());
            archive.parts.push(Part {
                path: name,
                data,
                content_type,
            });
        }
        archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut a = Archive::new();
        a.add_part("x/y.txt", b"hello".to_vec(), "text/plain").unwrap();
        let part = a.get_part("x/y.txt").unwrap();
        assert_eq!(part.data(), b"hello");
        assert_eq!(part.content_type(), "text/plain");
        assert_eq!(part.path(), "x/y.txt");
        assert!(a.has_part("/x//y.txt"));
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let mut a = Archive::new();
        a.add_part("a.txt", b"first".to_vec(), "").unwrap();
        let err = a.add_part("./a.txt", b"second".to_vec(), "").unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicatePart(p) if p == "a.txt"));
        assert_eq!(a.part_data("a.txt"), Some(&b"first"[..]));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_invalid_path_rejected() {
        let mut a = Archive::new();
        assert!(a.add_part("../x", Vec::new(), "").is_err());
        assert!(a.add_part("", Vec::new(), "").is_err());
        assert!(a.is_empty());
    }

    #[test]
    fn test_case_sensitive_lookup() {
        let mut a = Archive::new();
        a.add_part("Page.PNG", Vec::new(), "").unwrap();
        assert!(a.has_part("Page.PNG"));
        assert!(!a.has_part("page.png"));
    }

    #[test]
    fn test_empty_part_distinct_from_missing() {
        let mut a = Archive::new();
        a.add_part("empty", Vec::new(), "").unwrap();
        assert_eq!(a.part_data("empty"), Some(&[][..]));
        assert_eq!(a.part_data("missing"), None);
    }

    #[test]
    fn test_content_type_guessed_when_blank() {
        let mut a = Archive::new();
        a.add_part("img/01.jpg", Vec::new(), "").unwrap();
        assert_eq!(a.get_part("img/01.jpg").unwrap().content_type(), "image/jpeg");
    }

    #[test]
    fn test_archive_order_preserved() {
        let mut a = Archive::new();
        for name in ["c", "a", "b"] {
            a.add_part(name, Vec::new(), "").unwrap();
        }
        assert_eq!(a.paths().collect::<Vec<_>>(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(ArchiveFormat::sniff(b"PK\x03\x04rest"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::sniff(b"Rar!\x1A\x07\x00"), Some(ArchiveFormat::Rar));
        assert_eq!(
            ArchiveFormat::sniff(&[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C, 0, 4]),
            Some(ArchiveFormat::SevenZ)
        );
        assert_eq!(ArchiveFormat::sniff(b"hello"), None);
    }

    #[test]
    fn test_rar_is_unsupported() {
        let err = Archive::from_bytes(b"Rar!\x1A\x07\x01\x00").unwrap_err();
        assert!(matches!(err, ArchiveError::Unsupported(_)));
        assert!(matches!(
            Archive::from_bytes(b"garbage").unwrap_err(),
            ArchiveError::Unrecognized
        ));
    }

    #[test]
    fn test_from_entries_uses_declared_content_types() {
        let entries = vec![
            RawEntry {
                name: CONTENT_TYPES_PART.to_string(),
                data: br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="bin" ContentType="application/x-custom"/></Types>"#.to_vec(),
            },
            RawEntry {
                name: "data/a.bin".to_string(),
                data: vec![1],
            },
            RawEntry {
                name: "data/a.bin".to_string(),
                data: vec![2],
            },
        ];
        let a = Archive::from_entries(ArchiveFormat::Zip, entries);
        assert_eq!(a.len(), 2);
        let part = a.get_part("data/a.bin").unwrap();
        assert_eq!(part.content_type(), "application/x-custom");
        assert_eq!(part.data(), &[1]);
        assert_eq!(a.format(), ArchiveFormat::Zip);
    }
}
