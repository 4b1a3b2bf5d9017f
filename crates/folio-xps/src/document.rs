//! XPS document: package structure, parts, fonts and link targets.

use crate::error::{Result, XpsError};
use crate::metadata::XpsMetadata;
use crate::page::{extract_text, PageRenderer, XpsPage, XpsTextElement};
use crate::parser::{parse_structure, FixedDocumentRef};
use crate::XPS_POINTS_PER_UNIT;
use folio_archive::opc::{part_text, ContentTypes, CONTENT_TYPES_PART};
use folio_archive::{resolve, split_fragment, Archive, ByteStream, MAX_PART_SIZE};
use folio_core::{Matrix, Rect};
use folio_render::{Device, PageSource};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Resolve a URI found in `base` to a part path.
///
/// Relative references merge with the directory of `base`, `/`-rooted ones
/// start at the package root. External URIs (`http:`, `mailto:` ...) are
/// returned unchanged. A `#fragment` is kept.
///
/// # Errors
///
/// Returns [`XpsError::Archive`] if the reference escapes the package.
///
/// # Examples
///
/// ```rust
/// use folio_xps::resolve_url;
///
/// let p = resolve_url("Documents/1/Pages/1.fpage", "../Resources/a.odttf").unwrap();
/// assert_eq!(p, "Documents/1/Resources/a.odttf");
/// ```
pub fn resolve_url(base: &str, path: &str) -> Result<String> {
    if folio_archive::path::is_external(path) {
        return Ok(path.to_string());
    }
    Ok(resolve(base, path)?)
}

/// An opened XPS or OpenXPS package.
#[derive(Debug, Clone)]
pub struct XpsDocument {
    archive: Archive,
    content_types: Option<ContentTypes>,
    sequence: String,
    documents: Vec<FixedDocumentRef>,
    pages: Vec<XpsPage>,
    metadata: XpsMetadata,
    fonts: HashMap<String, Arc<[u8]>>,
    targets: HashMap<String, usize>,
}

impl XpsDocument {
    /// Open an XPS file.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read or the package
    /// structure is invalid.
    pub fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening XPS {}", path.display());
        Self::from_archive(Archive::open(path)?)
    }

    /// Open an XPS package from a byte stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read or the package
    /// structure is invalid.
    pub fn open_stream(stream: &mut ByteStream) -> Result<Self> {
        Self::from_archive(Archive::from_stream(stream, MAX_PART_SIZE)?)
    }

    /// Build the document on an already loaded archive.
    ///
    /// # Errors
    ///
    /// - [`XpsError::InvalidStructure`] without a document sequence or documents
    /// - [`XpsError::MissingFile`] for a referenced part that is absent
    /// - [`XpsError::Xml`] for malformed structure XML
    pub fn from_archive(archive: Archive) -> Result<Self> {
        let content_types = match archive.part_data(CONTENT_TYPES_PART) {
            Some(data) => match ContentTypes::parse(part_text(CONTENT_TYPES_PART, data)?) {
                Ok(types) => Some(types),
                Err(e) => {
                    log::warn!("Ignoring malformed {CONTENT_TYPES_PART}: {e}");
                    None
                }
            },
            None => None,
        };
        let structure = parse_structure(&archive)?;

        let mut targets = HashMap::new();
        for (name, page) in structure.targets {
            targets.entry(name).or_insert(page);
        }
        log::debug!(
            "XPS {} opened: {} documents, {} pages, {} link targets",
            structure.sequence,
            structure.documents.len(),
            structure.pages.len(),
            targets.len()
        );
        Ok(Self {
            archive,
            content_types,
            sequence: structure.sequence,
            documents: structure.documents,
            pages: structure.pages,
            metadata: structure.metadata,
            fonts: HashMap::new(),
            targets,
        })
    }

    #[must_use = "returns the underlying archive"]
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Part name of the FixedDocumentSequence.
    #[must_use = "returns the sequence part name"]
    pub fn sequence_name(&self) -> &str {
        &self.sequence
    }

    // ========================================================================
    // Pages and documents
    // ========================================================================

    #[must_use = "returns the number of pages"]
    pub fn count_pages(&self) -> usize {
        self.pages.len()
    }

    #[must_use = "returns the pages"]
    pub fn pages(&self) -> &[XpsPage] {
        &self.pages
    }

    fn page(&self, page: usize) -> Result<&XpsPage> {
        self.pages.get(page).ok_or(XpsError::OutOfRange {
            what: "page",
            index: page,
            len: self.pages.len(),
        })
    }

    /// Page size in XPS units (1/96 inch).
    ///
    /// # Errors
    ///
    /// Returns [`XpsError::OutOfRange`] past the last page.
    pub fn page_size(&self, page: usize) -> Result<(f32, f32)> {
        let p = self.page(page)?;
        Ok((p.width, p.height))
    }

    /// Part name of the page's `.fpage`.
    ///
    /// # Errors
    ///
    /// Returns [`XpsError::OutOfRange`] past the last page.
    pub fn page_name(&self, page: usize) -> Result<&str> {
        Ok(&self.page(page)?.name)
    }

    #[must_use = "returns the number of fixed documents"]
    pub fn count_documents(&self) -> usize {
        self.documents.len()
    }

    fn fixed_document(&self, index: usize) -> Result<&FixedDocumentRef> {
        self.documents.get(index).ok_or(XpsError::OutOfRange {
            what: "document",
            index,
            len: self.documents.len(),
        })
    }

    /// # Errors
    ///
    /// Returns [`XpsError::OutOfRange`] past the last document.
    pub fn document_name(&self, index: usize) -> Result<&str> {
        Ok(&self.fixed_document(index)?.name)
    }

    /// # Errors
    ///
    /// Returns [`XpsError::OutOfRange`] past the last document.
    pub fn count_pages_in_document(&self, index: usize) -> Result<usize> {
        Ok(self.fixed_document(index)?.page_count)
    }

    /// Text runs of a page in document order, in XPS units.
    ///
    /// # Errors
    ///
    /// Returns [`XpsError::OutOfRange`] past the last page and
    /// [`XpsError::Page`] for a malformed FixedPage.
    pub fn page_text(&self, page: usize) -> Result<Vec<XpsTextElement>> {
        let name = &self.page(page)?.name;
        extract_text(self.page_xml(name)?)
    }

    fn page_xml(&self, name: &str) -> Result<&str> {
        let data = self
            .archive
            .part_data(name)
            .ok_or_else(|| XpsError::MissingFile(name.to_string()))?;
        Ok(part_text(name, data)?)
    }

    // ========================================================================
    // Parts
    // ========================================================================

    #[must_use = "returns whether the part exists"]
    pub fn has_part(&self, name: &str) -> bool {
        self.archive.has_part(name)
    }

    /// Bytes of a part. `None` means absent; a zero-length part is `Some(&[])`.
    #[must_use = "returns the part data"]
    pub fn part_data(&self, name: &str) -> Option<&[u8]> {
        self.archive.part_data(name)
    }

    /// Declared content type: `[Content_Types].xml` override, then default by
    /// extension, then the type the part was stored with.
    #[must_use = "returns the part content type"]
    pub fn part_content_type(&self, name: &str) -> Option<&str> {
        let part = self.archive.get_part(name)?;
        self.content_types
            .as_ref()
            .and_then(|t| t.content_type_for(part.path()))
            .or(Some(part.content_type()))
    }

    /// Store a new part. An empty content type is guessed from the extension.
    ///
    /// # Errors
    ///
    /// Returns an archive error for an invalid or duplicate name.
    pub fn add_part(&mut self, name: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.archive.add_part(name, data, content_type)?;
        Ok(())
    }

    // ========================================================================
    // Fonts
    // ========================================================================

    /// Font data for a resolved font URI, loading it into the cache on first
    /// use. A `#face` fragment is ignored. Returns `None` when no such part
    /// exists.
    pub fn lookup_font(&mut self, uri: &str) -> Option<Arc<[u8]>> {
        let (path, _) = split_fragment(uri);
        if let Some(font) = self.fonts.get(path) {
            return Some(Arc::clone(font));
        }
        let data: Arc<[u8]> = Arc::from(self.archive.part_data(path)?);
        log::debug!("Loaded font {path} ({} bytes)", data.len());
        self.fonts.insert(path.to_string(), Arc::clone(&data));
        Some(data)
    }

    /// Number of fonts in the cache.
    #[must_use = "returns the number of cached fonts"]
    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    // ========================================================================
    // Link targets
    // ========================================================================

    /// Register a named destination. A later registration of the same name
    /// replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`XpsError::InvalidValue`] for an empty name or NUL, and
    /// [`XpsError::OutOfRange`] for a page past the end.
    pub fn add_target(&mut self, name: &str, page: usize) -> Result<()> {
        if name.is_empty() || name.contains('\0') {
            return Err(XpsError::InvalidValue {
                field: "target name",
                reason: "empty or contains NUL".to_string(),
            });
        }
        self.page(page)?;
        self.targets.insert(name.to_string(), page);
        Ok(())
    }

    /// Page index of a named destination. Accepts a bare name or a URI whose
    /// fragment is the name (`Doc.fdoc#intro`).
    #[must_use = "returns the target page"]
    pub fn lookup_target(&self, name: &str) -> Option<usize> {
        let key = match split_fragment(name) {
            (_, Some(fragment)) => fragment,
            (bare, None) => bare,
        };
        self.targets.get(key).copied()
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    #[must_use = "returns the core properties"]
    pub fn metadata(&self) -> &XpsMetadata {
        &self.metadata
    }

    #[must_use = "returns the title"]
    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    /// # Errors
    ///
    /// Returns [`XpsError::InvalidValue`] if the title contains NUL.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        if title.contains('\0') {
            return Err(XpsError::InvalidValue {
                field: "title",
                reason: "contains NUL".to_string(),
            });
        }
        self.metadata.title = Some(title.to_string());
        Ok(())
    }

    #[must_use = "returns the author"]
    pub fn author(&self) -> Option<&str> {
        self.metadata.author.as_deref()
    }
}

impl PageSource for XpsDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page box in points.
    fn page_bounds(&self, page: usize) -> folio_core::Result<Rect> {
        let (w, h) = self.page_size(page)?;
        Ok(Rect::from_size(w * XPS_POINTS_PER_UNIT, h * XPS_POINTS_PER_UNIT))
    }

    fn run_page(&self, page: usize, device: &mut dyn Device, ctm: &Matrix) -> folio_core::Result<()> {
        let name = &self.page(page)?.name;
        let xml = self.page_xml(name)?;
        let page_ctm = Matrix::scale(XPS_POINTS_PER_UNIT, XPS_POINTS_PER_UNIT).concat(ctm);
        log::trace!("Rendering XPS page {page} ({name})");
        PageRenderer {
            archive: &self.archive,
            page_path: name,
        }
        .render(xml, device, &page_ctm)
    }
}
