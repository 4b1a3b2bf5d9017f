//! ZIP container loading

use crate::error::{ArchiveError, Result};
use crate::loader::{read_limited, RawEntry};
use crate::path::normalize_path;
use log::warn;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Read every file entry of a ZIP archive into memory, in central directory
/// order.
///
/// Directories are skipped, as are entries whose names fail normalization
/// (traversal attempts) and entries larger than `max_part_size`.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidZip`] for a corrupt archive and
/// [`ArchiveError::PasswordProtected`] if any entry is encrypted.
pub fn read_zip_entries<R: Read + Seek>(reader: R, max_part_size: u64) -> Result<Vec<RawEntry>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let zip_file = archive.by_index(i)?;

        if zip_file.is_dir() {
            continue;
        }
        if zip_file.encrypted() {
            return Err(ArchiveError::PasswordProtected);
        }

        let raw_name = zip_file.name().to_string();
        let name = match normalize_path(&raw_name) {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping ZIP entry {raw_name}: {e}");
                continue;
            }
        };

        let size = zip_file.size();
        let Some(data) = read_limited(zip_file, &name, size, max_part_size)? else {
            continue;
        };
        entries.push(RawEntry { name, data });
    }

    Ok(entries)
}
