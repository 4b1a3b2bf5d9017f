//! Shared plumbing for the container loaders.

use crate::error::Result;
use log::warn;
use std::io::Read;

/// One file read out of a container, name already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Read `reader` fully unless it is larger than `max`. `declared` is the size
/// the container claims; the actual byte count is checked too.
///
/// Returns `Ok(None)` (with a warning) for oversized entries.
pub(crate) fn read_limited(
    reader: impl Read,
    name: &str,
    declared: u64,
    max: u64,
) -> Result<Option<Vec<u8>>> {
    if declared > max {
        warn!("Skipping large file: {name} ({declared} bytes exceeds {max} bytes limit)");
        return Ok(None);
    }
    let mut data = Vec::new();
    data.try_reserve_exact(usize::try_from(declared).unwrap_or(0))?;
    reader.take(max.saturating_add(1)).read_to_end(&mut data)?;
    if data.len() as u64 > max {
        warn!("Skipping large file: {name} (more than {max} bytes)");
        return Ok(None);
    }
    Ok(Some(data))
}
