//! Part path normalization and relative reference resolution.
//!
//! Part paths are POSIX-style, `/`-separated, relative to the archive root
//! and never contain `.` or `..` segments once normalized. Hrefs are not
//! percent-decoded here.

use crate::error::{ArchiveError, Result};

/// Normalize a part path.
///
/// Splits on `/`, drops empty and `.` segments and resolves `..` against the
/// segments seen so far. A leading `/` is accepted and ignored.
///
/// # Errors
///
/// - [`ArchiveError::PathEscapesRoot`] if `..` would climb above the root
/// - [`ArchiveError::InvalidPath`] if nothing remains, or the path contains NUL
///
/// # Examples
///
/// ```rust
/// use folio_archive::normalize_path;
///
/// assert_eq!(normalize_path("/OEBPS/./text//../ch1.xhtml").unwrap(), "OEBPS/ch1.xhtml");
/// assert!(normalize_path("../etc/passwd").is_err());
/// ```
pub fn normalize_path(path: &str) -> Result<String> {
    if path.contains('\0') {
        return Err(ArchiveError::InvalidPath(path.escape_debug().to_string()));
    }
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return Err(ArchiveError::PathEscapesRoot(path.to_string()));
                }
            }
            s => stack.push(s),
        }
    }
    if stack.is_empty() {
        return Err(ArchiveError::InvalidPath(path.to_string()));
    }
    Ok(stack.join("/"))
}

/// Split `href` into its path and optional fragment (without the `#`).
#[must_use = "returns the split href"]
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((path, frag)) => (path, Some(frag)),
        None => (href, None),
    }
}

/// Directory part of a normalized path, including the trailing `/`, or the
/// empty string for root-level parts.
#[must_use = "returns the directory prefix"]
pub fn directory_of(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..=i])
}

/// File name of a path (after the last `/`).
#[must_use = "returns the file name"]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Lowercased extension without the dot, or the empty string.
#[must_use = "returns the extension"]
pub fn extension(path: &str) -> String {
    let name = file_name(path);
    match name.rfind('.') {
        Some(i) if i > 0 => name[i + 1..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Whether `href` carries a URI scheme (`http:`, `mailto:`, ...) and so
/// does not name a part.
#[must_use = "returns whether the href is external"]
pub fn is_external(href: &str) -> bool {
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolve `reference` against the part `base`.
///
/// Path-only RFC 3986 resolution: an absolute reference (`/x`) starts from
/// the root, a relative one is merged with the base's directory, an empty one
/// refers to the base itself. The result is normalized; a fragment on the
/// reference is preserved.
///
/// # Errors
///
/// Propagates [`normalize_path`] failures for the merged path.
///
/// # Examples
///
/// ```rust
/// use folio_archive::resolve;
///
/// let p = resolve("OEBPS/text/ch1.xhtml", "../images/cover.png").unwrap();
/// assert_eq!(p, "OEBPS/images/cover.png");
/// let p = resolve("OEBPS/toc.ncx", "text/ch2.xhtml#sec3").unwrap();
/// assert_eq!(p, "OEBPS/text/ch2.xhtml#sec3");
/// ```
pub fn resolve(base: &str, reference: &str) -> Result<String> {
    let (base_path, _) = split_fragment(base);
    let (ref_path, fragment) = split_fragment(reference);

    let merged = if ref_path.is_empty() {
        base_path.to_string()
    } else if ref_path.starts_with('/') {
        ref_path.to_string()
    } else {
        format!("{}{}", directory_of(base_path.trim_start_matches('/')), ref_path)
    };

    let mut resolved = normalize_path(&merged)?;
    if let Some(frag) = fragment {
        resolved.push('#');
        resolved.push_str(frag);
    }
    Ok(resolved)
}
