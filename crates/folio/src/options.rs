//! Options for opening documents.

use crate::format::DocumentFormat;
use folio_archive::MAX_PART_SIZE;
use folio_epub::EpubLayout;

/// Options controlling how a document is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenOptions {
    /// Force a format instead of detecting it from the container
    pub format: Option<DocumentFormat>,

    /// Reflow box for EPUB; `None` keeps the built-in default
    pub layout: Option<EpubLayout>,

    /// Entries larger than this are skipped while loading
    pub max_part_size: u64,
}

impl Default for OpenOptions {
    #[inline]
    fn default() -> Self {
        Self {
            format: None,
            layout: None,
            max_part_size: MAX_PART_SIZE,
        }
    }
}

impl OpenOptions {
    #[inline]
    #[must_use = "returns updated options"]
    pub const fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = Some(format);
        self
    }

    #[inline]
    #[must_use = "returns updated options"]
    pub const fn with_layout(mut self, layout: EpubLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    #[inline]
    #[must_use = "returns updated options"]
    pub const fn with_max_part_size(mut self, max_part_size: u64) -> Self {
        self.max_part_size = max_part_size;
        self
    }
}
