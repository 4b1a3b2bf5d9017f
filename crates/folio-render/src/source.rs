//! Page source seam implemented by each document family.

use crate::device::Device;
use folio_core::{Matrix, Rect};

/// Something that can describe and draw its pages.
///
/// `run_page` only emits drawing commands; the caller brackets them with
/// `begin_page`/`end_page`.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Media box of `page` in page space (points, origin top-left).
    ///
    /// # Errors
    ///
    /// Returns an Argument error for an out-of-range page.
    fn page_bounds(&self, page: usize) -> folio_core::Result<Rect>;

    /// Draw `page` into `device` through `ctm`.
    ///
    /// # Errors
    ///
    /// Returns an Argument error for an out-of-range page, a Format error if
    /// the page content cannot be parsed, or the device's error.
    fn run_page(&self, page: usize, device: &mut dyn Device, ctm: &Matrix)
        -> folio_core::Result<()>;
}
