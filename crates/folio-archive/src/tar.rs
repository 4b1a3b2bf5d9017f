//! TAR container loading (plain or gzip-compressed)

use crate::error::Result;
use crate::loader::{read_limited, RawEntry};
use crate::path::normalize_path;
use flate2::read::GzDecoder;
use log::warn;
use std::io::Read;

/// Gzip magic bytes (RFC 1952)
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether `bytes` look like a POSIX/GNU tar header block.
#[must_use = "returns whether the bytes are a tar archive"]
pub fn is_tar(bytes: &[u8]) -> bool {
    bytes.get(257..262) == Some(b"ustar".as_slice())
}

/// Read every regular file of a TAR stream, decompressing gzip transparently
/// when `bytes` starts with the gzip magic.
///
/// # Errors
///
/// Returns [`ArchiveError::Io`](crate::ArchiveError::Io) when the stream is
/// truncated or not a tar archive.
pub fn read_tar_entries(bytes: &[u8], max_part_size: u64) -> Result<Vec<RawEntry>> {
    if bytes.starts_with(&GZIP_MAGIC) {
        read_tar_stream(GzDecoder::new(bytes), max_part_size)
    } else {
        read_tar_stream(bytes, max_part_size)
    }
}

fn read_tar_stream<R: Read>(reader: R, max_part_size: u64) -> Result<Vec<RawEntry>> {
    let mut archive = tar::Archive::new(reader);
    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let raw_name = entry.path()?.to_string_lossy().to_string();
        let name = match normalize_path(&raw_name) {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping TAR entry {raw_name}: {e}");
                continue;
            }
        };
        let size = entry.size();
        let Some(data) = read_limited(entry, &name, size, max_part_size)? else {
            continue;
        };
        entries.push(RawEntry { name, data });
    }

    Ok(entries)
}
