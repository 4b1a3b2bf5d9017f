//! 7Z container loading

use crate::error::{ArchiveError, Result};
use crate::loader::{read_limited, RawEntry};
use crate::path::normalize_path;
use log::warn;
use sevenz_rust::{Password, SevenZReader};
use std::io::Cursor;

/// 7Z signature
pub const SEVENZ_MAGIC: [u8; 6] = [b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C];

fn map_sevenz_error(e: &sevenz_rust::Error) -> ArchiveError {
    let err_str = e.to_string();
    if err_str.contains("password") || err_str.contains("encrypted") {
        ArchiveError::PasswordProtected
    } else {
        ArchiveError::InvalidSevenZ(err_str)
    }
}

/// Read every file entry of a 7Z archive.
///
/// # Errors
///
/// Returns [`ArchiveError::PasswordProtected`] for encrypted archives and
/// [`ArchiveError::InvalidSevenZ`] for anything the decoder rejects.
pub fn read_7z_entries(bytes: &[u8], max_part_size: u64) -> Result<Vec<RawEntry>> {
    let len = bytes.len() as u64;
    let mut sz = SevenZReader::new(Cursor::new(bytes), len, Password::empty())
        .map_err(|e| map_sevenz_error(&e))?;

    let mut entries = Vec::new();
    let mut failure: Option<ArchiveError> = None;

    sz.for_each_entries(|entry, reader| {
        if entry.is_directory() {
            return Ok(true);
        }
        let raw_name = entry.name().to_string();
        let name = match normalize_path(&raw_name) {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping 7Z entry {raw_name}: {e}");
                return Ok(true);
            }
        };
        match read_limited(reader, &name, entry.size(), max_part_size) {
            Ok(Some(data)) => entries.push(RawEntry { name, data }),
            Ok(None) => {}
            Err(e) => {
                failure = Some(e);
                return Ok(false);
            }
        }
        Ok(true)
    })
    .map_err(|e| map_sevenz_error(&e))?;

    match failure {
        Some(e) => Err(e),
        None => Ok(entries),
    }
}
