//! Handle arena tying documents, pages, display lists, devices, cookies and
//! overlay objects to one session.
//!
//! Every object is created in a [`Context`] and named by a generational
//! [`Handle`]. Releasing a handle twice, or using it after its owner went
//! away, is reported as an `Argument` error instead of touching another
//! object. Dropping a document releases its pages and every annotation or
//! widget handle issued for them.

use crate::document::Document;
use crate::options::OpenOptions;
use folio_annot::{AnnotId, AnnotType, Annotation, PageOverlay, Widget, WidgetType};
use folio_archive::{Archive, ByteStream};
use folio_core::{Cookie, FolioError, Handle, HandleStore, IRect, Matrix, Rect, Result};
use folio_render::{
    Device, DeviceState, DisplayList, DrawDevice, DrawOp, ListDevice, PageSource, Pixmap,
    RunStatus, SvgDevice, SvgDeviceOptions,
};
use std::cell::Cell;
use std::marker::PhantomData;
use std::path::Path;

pub type DocumentHandle = Handle<Document>;
pub type PageHandle = Handle<Page>;
pub type DisplayListHandle = Handle<DisplayList>;
pub type DeviceHandle = Handle<ContextDevice>;
pub type CookieHandle = Handle<Cookie>;
pub type AnnotHandle = Handle<AnnotRef>;
pub type WidgetHandle = Handle<WidgetRef>;

/// A loaded page: its document, index and annotation overlay.
#[derive(Debug, Clone)]
pub struct Page {
    document: DocumentHandle,
    index: usize,
    overlay: PageOverlay,
}

impl Page {
    #[must_use = "returns the owning document"]
    pub const fn document(&self) -> DocumentHandle {
        self.document
    }

    #[must_use = "returns the page index"]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use = "returns the overlay"]
    pub const fn overlay(&self) -> &PageOverlay {
        &self.overlay
    }
}

/// Annotation on a loaded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotRef {
    page: PageHandle,
    id: AnnotId,
}

/// Widget on a loaded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetRef {
    page: PageHandle,
    id: AnnotId,
}

/// Device owned by a context.
#[derive(Debug)]
pub enum ContextDevice {
    Draw(DrawDevice),
    /// Records into the display list `target`, written back on close
    List {
        device: ListDevice,
        target: DisplayListHandle,
    },
    Svg(SvgDevice<Vec<u8>>),
}

impl ContextDevice {
    fn as_device_mut(&mut self) -> &mut dyn Device {
        match self {
            Self::Draw(device) => device,
            Self::List { device, .. } => device,
            Self::Svg(device) => device,
        }
    }

    #[must_use = "returns the device state"]
    pub fn state(&self) -> DeviceState {
        match self {
            Self::Draw(device) => device.state(),
            Self::List { device, .. } => device.state(),
            Self::Svg(device) => device.state(),
        }
    }
}

fn lookup<'a, T>(store: &'a HandleStore<T>, handle: Handle<T>, what: &str) -> Result<&'a T> {
    store
        .get(handle)
        .ok_or_else(|| FolioError::invalid_handle(what))
}

fn lookup_mut<'a, T>(
    store: &'a mut HandleStore<T>,
    handle: Handle<T>,
    what: &str,
) -> Result<&'a mut T> {
    store
        .get_mut(handle)
        .ok_or_else(|| FolioError::invalid_handle(what))
}

fn release<T>(store: &mut HandleStore<T>, handle: Handle<T>, what: &str) -> Result<T> {
    store
        .remove(handle)
        .ok_or_else(|| FolioError::invalid_handle(what))
}

/// Session-scoped resource arena.
///
/// A context is not `Sync`; run one per thread. Only cookies cross threads,
/// through [`Cookie::share`].
#[derive(Debug, Default)]
pub struct Context {
    documents: HandleStore<Document>,
    pages: HandleStore<Page>,
    lists: HandleStore<DisplayList>,
    devices: HandleStore<ContextDevice>,
    cookies: HandleStore<Cookie>,
    annots: HandleStore<AnnotRef>,
    widgets: HandleStore<WidgetRef>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Context {
    #[must_use = "creates a new context"]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// # Errors
    ///
    /// Returns the error from [`Document::open`].
    pub fn open_document(&mut self, path: &Path, options: &OpenOptions) -> Result<DocumentHandle> {
        let doc = Document::open(path, options)?;
        Ok(self.documents.insert(doc))
    }

    /// # Errors
    ///
    /// Returns the error from [`Document::open_stream`].
    pub fn open_document_stream(
        &mut self,
        stream: &mut ByteStream,
        options: &OpenOptions,
    ) -> Result<DocumentHandle> {
        let doc = Document::open_stream(stream, options)?;
        Ok(self.documents.insert(doc))
    }

    /// Open a document on `archive`, which the document takes over.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Document::from_archive`].
    pub fn open_document_with_archive(
        &mut self,
        archive: Archive,
        options: &OpenOptions,
    ) -> Result<DocumentHandle> {
        let doc = Document::from_archive(archive, options)?;
        Ok(self.documents.insert(doc))
    }

    /// Register a document built in memory.
    pub fn insert_document(&mut self, document: Document) -> DocumentHandle {
        self.documents.insert(document)
    }

    #[must_use = "returns whether the handle is live"]
    pub fn is_document_valid(&self, document: DocumentHandle) -> bool {
        self.documents.contains(document)
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn document(&self, document: DocumentHandle) -> Result<&Document> {
        lookup(&self.documents, document, "document")
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn document_mut(&mut self, document: DocumentHandle) -> Result<&mut Document> {
        lookup_mut(&mut self.documents, document, "document")
    }

    /// Release a document with its pages and their overlay handles.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn drop_document(&mut self, document: DocumentHandle) -> Result<()> {
        release(&mut self.documents, document, "document")?;
        self.pages.retain(|_, page| page.document != document);
        self.prune_overlay_handles();
        log::debug!("Dropped document {document:?}");
        Ok(())
    }

    fn prune_overlay_handles(&mut self) {
        let pages = &self.pages;
        self.annots.retain(|_, a| pages.contains(a.page));
        self.widgets.retain(|_, w| pages.contains(w.page));
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or an index past the
    /// last page.
    pub fn load_page(&mut self, document: DocumentHandle, index: usize) -> Result<PageHandle> {
        let count = lookup(&self.documents, document, "document")?.page_count();
        if index >= count {
            return Err(FolioError::out_of_range("page", index, count));
        }
        Ok(self.pages.insert(Page {
            document,
            index,
            overlay: PageOverlay::new(),
        }))
    }

    #[must_use = "returns whether the handle is live"]
    pub fn is_page_valid(&self, page: PageHandle) -> bool {
        self.pages.contains(page)
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn page(&self, page: PageHandle) -> Result<&Page> {
        lookup(&self.pages, page, "page")
    }

    /// Page box in points.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn page_bounds(&self, page: PageHandle) -> Result<Rect> {
        let page = lookup(&self.pages, page, "page")?;
        lookup(&self.documents, page.document, "document")?.page_bounds(page.index)
    }

    /// Release a page and its overlay handles.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn drop_page(&mut self, page: PageHandle) -> Result<()> {
        release(&mut self.pages, page, "page")?;
        self.prune_overlay_handles();
        Ok(())
    }

    /// Regenerate every dirty appearance on the page. Returns the number
    /// that failed and stay dirty.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn update_page(&mut self, page: PageHandle) -> Result<usize> {
        Ok(lookup_mut(&mut self.pages, page, "page")?.overlay.update_dirty())
    }

    // ========================================================================
    // Display lists
    // ========================================================================

    pub fn new_display_list(&mut self, bounds: Rect) -> DisplayListHandle {
        self.lists.insert(DisplayList::new(bounds))
    }

    /// Record the page content, without annotations, into a new list.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, or the error from
    /// interpreting the page.
    pub fn record_page(&mut self, page: PageHandle) -> Result<DisplayListHandle> {
        let page = lookup(&self.pages, page, "page")?;
        let doc = lookup(&self.documents, page.document, "document")?;
        let list = DisplayList::record(doc, page.index)?;
        Ok(self.lists.insert(list))
    }

    /// Deep copy of a list under a new handle.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn clone_display_list(&mut self, list: DisplayListHandle) -> Result<DisplayListHandle> {
        let copy = lookup(&self.lists, list, "display list")?.clone();
        Ok(self.lists.insert(copy))
    }

    #[must_use = "returns whether the handle is live"]
    pub fn is_display_list_valid(&self, list: DisplayListHandle) -> bool {
        self.lists.contains(list)
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn display_list(&self, list: DisplayListHandle) -> Result<&DisplayList> {
        lookup(&self.lists, list, "display list")
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn drop_display_list(&mut self, list: DisplayListHandle) -> Result<()> {
        release(&mut self.lists, list, "display list").map(drop)
    }

    // ========================================================================
    // Cookies
    // ========================================================================

    pub fn new_cookie(&mut self) -> CookieHandle {
        self.cookies.insert(Cookie::new())
    }

    /// The cookie; call [`Cookie::share`] to hand it to another thread.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn cookie(&self, cookie: CookieHandle) -> Result<&Cookie> {
        lookup(&self.cookies, cookie, "cookie")
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn drop_cookie(&mut self, cookie: CookieHandle) -> Result<()> {
        release(&mut self.cookies, cookie, "cookie").map(drop)
    }

    // ========================================================================
    // Devices
    // ========================================================================

    /// Draw device over a pixel buffer of `bbox`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer cannot be allocated.
    pub fn new_draw_device(&mut self, bbox: IRect) -> Result<DeviceHandle> {
        let pixmap = Pixmap::new(bbox)?;
        Ok(self.devices.insert(ContextDevice::Draw(DrawDevice::new(pixmap))))
    }

    /// SVG device collecting output in memory. `options` is a comma
    /// separated list such as `text=text,reuse-images=no`.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed or unsupported options.
    pub fn new_svg_device(&mut self, options: &str) -> Result<DeviceHandle> {
        let options = SvgDeviceOptions::parse(options)?;
        let device = SvgDevice::new(Vec::new(), options)?;
        Ok(self.devices.insert(ContextDevice::Svg(device)))
    }

    /// List device recording for `list`. The recording is appended to the
    /// list when the device closes cleanly; until then the list keeps its
    /// current commands.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale list handle.
    pub fn new_list_device(&mut self, list: DisplayListHandle) -> Result<DeviceHandle> {
        lookup(&self.lists, list, "display list")?;
        Ok(self.devices.insert(ContextDevice::List {
            device: ListDevice::new(),
            target: list,
        }))
    }

    #[must_use = "returns whether the handle is live"]
    pub fn is_device_valid(&self, device: DeviceHandle) -> bool {
        self.devices.contains(device)
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn device_state(&self, device: DeviceHandle) -> Result<DeviceState> {
        Ok(lookup(&self.devices, device, "device")?.state())
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, or the device's
    /// protocol error.
    pub fn begin_page(&mut self, device: DeviceHandle, mediabox: &Rect) -> Result<()> {
        let device = lookup_mut(&mut self.devices, device, "device")?;
        Ok(device.as_device_mut().begin_page(mediabox)?)
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, or the device's
    /// protocol error.
    pub fn end_page(&mut self, device: DeviceHandle) -> Result<()> {
        let device = lookup_mut(&mut self.devices, device, "device")?;
        Ok(device.as_device_mut().end_page()?)
    }

    /// Close the device. A list device appends its recording to its target
    /// list; a device that fails to close leaves the target untouched.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, or the device's
    /// protocol error.
    pub fn close_device(&mut self, device: DeviceHandle) -> Result<()> {
        let entry = lookup_mut(&mut self.devices, device, "device")?;
        entry.as_device_mut().close()?;
        if let ContextDevice::List { device, target } = entry {
            let recorded = device.take_list();
            match self.lists.get_mut(*target) {
                Some(list) => list.append(recorded),
                None => log::warn!("Target list of {target:?} was dropped, discarding recording"),
            }
        }
        Ok(())
    }

    /// Commands received by a draw device.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or another device kind.
    pub fn draw_trace(&self, device: DeviceHandle) -> Result<&[DrawOp]> {
        match lookup(&self.devices, device, "device")? {
            ContextDevice::Draw(draw) => Ok(draw.trace()),
            _ => Err(FolioError::argument("not a draw device")),
        }
    }

    /// Release a closed SVG device and return the document it wrote.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, another device kind,
    /// or a device that is not closed yet.
    pub fn take_svg_output(&mut self, device: DeviceHandle) -> Result<Vec<u8>> {
        match lookup(&self.devices, device, "device")? {
            ContextDevice::Svg(svg) if svg.state() == DeviceState::Closed => {}
            ContextDevice::Svg(_) => return Err(FolioError::argument("SVG device is not closed")),
            _ => return Err(FolioError::argument("not an SVG device")),
        }
        match release(&mut self.devices, device, "device")? {
            ContextDevice::Svg(svg) => Ok(svg.into_inner()),
            _ => Err(FolioError::argument("not an SVG device")),
        }
    }

    /// Release a device. A list device that was not closed discards its
    /// recording and leaves its target list as it was.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn drop_device(&mut self, device: DeviceHandle) -> Result<()> {
        release(&mut self.devices, device, "device").map(drop)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Replay `list` onto an open page of `device`. Commands whose bounds
    /// miss `scissor` are skipped; the cookie is polled between commands.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, or the device error
    /// that left it unusable. An abort is reported in the status.
    pub fn run_display_list(
        &mut self,
        list: DisplayListHandle,
        device: DeviceHandle,
        ctm: &Matrix,
        scissor: &Rect,
        cookie: Option<CookieHandle>,
    ) -> Result<RunStatus> {
        let list = lookup(&self.lists, list, "display list")?;
        let cookie = cookie
            .map(|c| lookup(&self.cookies, c, "cookie"))
            .transpose()?;
        let device = lookup_mut(&mut self.devices, device, "device")?;
        Ok(list.run(device.as_device_mut(), ctm, scissor, cookie)?)
    }

    /// Render one page, content then annotations, as a complete device
    /// page. The cookie covers both: its progress counts content and
    /// appearance commands, and an abort position indexes them in that
    /// order. The page is ended either way.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, the error from
    /// interpreting the page, or a device protocol error.
    pub fn run_page(
        &mut self,
        page: PageHandle,
        device: DeviceHandle,
        ctm: &Matrix,
        cookie: Option<CookieHandle>,
    ) -> Result<RunStatus> {
        let page = lookup(&self.pages, page, "page")?;
        let doc = lookup(&self.documents, page.document, "document")?;
        let cookie = cookie
            .map(|c| lookup(&self.cookies, c, "cookie"))
            .transpose()?;
        let device = lookup_mut(&mut self.devices, device, "device")?.as_device_mut();

        let list = DisplayList::record(doc, page.index)?;
        if let Some(cookie) = cookie {
            let total = list.len() + page.overlay.appearance_len();
            let done = cookie.progress().progress;
            cookie.init_progress_max(done.saturating_add(total as u64));
        }
        device.begin_page(&list.bounds().transform(ctm))?;
        let mut status = list.run(device, ctm, &Rect::INFINITE, cookie)?;
        if !status.is_aborted() {
            status = match page.overlay.run(device, ctm, cookie)? {
                RunStatus::Aborted { at } => RunStatus::Aborted {
                    at: list.len() + at,
                },
                completed => completed,
            };
        }
        device.end_page()?;
        log::debug!("Rendered page {} of {:?}: {status:?}", page.index, page.document);
        Ok(status)
    }

    // ========================================================================
    // Annotations
    // ========================================================================

    fn annot_handle(&mut self, page: PageHandle, id: AnnotId) -> AnnotHandle {
        let target = AnnotRef { page, id };
        let existing = self
            .annots
            .iter()
            .find(|(_, a)| **a == target)
            .map(|(h, _)| h);
        match existing {
            Some(handle) => handle,
            None => self.annots.insert(target),
        }
    }

    fn annot_ref(&self, annot: AnnotHandle) -> Result<AnnotRef> {
        lookup(&self.annots, annot, "annotation").copied()
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale page handle and
    /// `Unsupported` for [`AnnotType::Widget`].
    pub fn create_annot(&mut self, page: PageHandle, kind: AnnotType, rect: Rect) -> Result<AnnotHandle> {
        let id = lookup_mut(&mut self.pages, page, "page")?
            .overlay
            .create_annot(kind, rect)?;
        Ok(self.annots.insert(AnnotRef { page, id }))
    }

    /// Whether the handle is live and its annotation still exists.
    #[must_use = "returns whether the handle is live"]
    pub fn is_annot_valid(&self, annot: AnnotHandle) -> bool {
        self.annots.get(annot).is_some_and(|a| {
            self.pages
                .get(a.page)
                .is_some_and(|p| p.overlay.annot(a.id).is_ok())
        })
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or a deleted
    /// annotation.
    pub fn annot(&self, annot: AnnotHandle) -> Result<&Annotation> {
        let r = self.annot_ref(annot)?;
        Ok(lookup(&self.pages, r.page, "page")?.overlay.annot(r.id)?)
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or a deleted
    /// annotation.
    pub fn annot_mut(&mut self, annot: AnnotHandle) -> Result<&mut Annotation> {
        let r = self.annot_ref(annot)?;
        Ok(lookup_mut(&mut self.pages, r.page, "page")?
            .overlay
            .annot_mut(r.id)?)
    }

    /// Regenerate the appearance if the annotation is dirty. Returns
    /// whether an update ran.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, or the update error;
    /// the annotation then stays dirty.
    pub fn update_annot(&mut self, annot: AnnotHandle) -> Result<bool> {
        let annot = self.annot_mut(annot)?;
        if !annot.is_dirty() {
            return Ok(false);
        }
        annot.update()?;
        Ok(true)
    }

    /// Copy an annotation onto `target`, the same or another page.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn clone_annot(&mut self, annot: AnnotHandle, target: PageHandle) -> Result<AnnotHandle> {
        let source = self.annot(annot)?.clone();
        let id = lookup_mut(&mut self.pages, target, "page")?
            .overlay
            .adopt_annot(&source)?;
        Ok(self.annots.insert(AnnotRef { page: target, id }))
    }

    /// Remove the annotation from its page and release the handle.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn delete_annot(&mut self, annot: AnnotHandle) -> Result<()> {
        let r = self.annot_ref(annot)?;
        lookup_mut(&mut self.pages, r.page, "page")?
            .overlay
            .delete_annot(r.id)?;
        self.annots.remove(annot);
        Ok(())
    }

    /// Release the handle; the annotation stays on its page.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn drop_annot(&mut self, annot: AnnotHandle) -> Result<()> {
        release(&mut self.annots, annot, "annotation").map(drop)
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale page handle.
    pub fn first_annot(&mut self, page: PageHandle) -> Result<Option<AnnotHandle>> {
        let first = lookup(&self.pages, page, "page")?.overlay.first_annot();
        Ok(first.map(|id| self.annot_handle(page, id)))
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or a deleted
    /// annotation.
    pub fn next_annot(&mut self, annot: AnnotHandle) -> Result<Option<AnnotHandle>> {
        let r = self.annot_ref(annot)?;
        let next = lookup(&self.pages, r.page, "page")?.overlay.next_annot(r.id)?;
        Ok(next.map(|id| self.annot_handle(r.page, id)))
    }

    // ========================================================================
    // Widgets
    // ========================================================================

    fn widget_handle(&mut self, page: PageHandle, id: AnnotId) -> WidgetHandle {
        let target = WidgetRef { page, id };
        let existing = self
            .widgets
            .iter()
            .find(|(_, w)| **w == target)
            .map(|(h, _)| h);
        match existing {
            Some(handle) => handle,
            None => self.widgets.insert(target),
        }
    }

    fn widget_ref(&self, widget: WidgetHandle) -> Result<WidgetRef> {
        lookup(&self.widgets, widget, "widget").copied()
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale page handle or an empty name.
    pub fn create_widget(
        &mut self,
        page: PageHandle,
        field_type: WidgetType,
        name: &str,
        rect: Rect,
    ) -> Result<WidgetHandle> {
        let id = lookup_mut(&mut self.pages, page, "page")?
            .overlay
            .create_widget(field_type, name, rect)?;
        Ok(self.widgets.insert(WidgetRef { page, id }))
    }

    /// Whether the handle is live and its widget still exists.
    #[must_use = "returns whether the handle is live"]
    pub fn is_widget_valid(&self, widget: WidgetHandle) -> bool {
        self.widgets.get(widget).is_some_and(|w| {
            self.pages
                .get(w.page)
                .is_some_and(|p| p.overlay.widget(w.id).is_ok())
        })
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or a deleted widget.
    pub fn widget(&self, widget: WidgetHandle) -> Result<&Widget> {
        let r = self.widget_ref(widget)?;
        Ok(lookup(&self.pages, r.page, "page")?.overlay.widget(r.id)?)
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or a deleted widget.
    pub fn widget_mut(&mut self, widget: WidgetHandle) -> Result<&mut Widget> {
        let r = self.widget_ref(widget)?;
        Ok(lookup_mut(&mut self.pages, r.page, "page")?
            .overlay
            .widget_mut(r.id)?)
    }

    /// Validate and store a field value.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or a value the field
    /// rejects, `Unsupported` for buttons and signatures.
    pub fn set_widget_value(&mut self, widget: WidgetHandle, value: &str) -> Result<()> {
        Ok(self.widget_mut(widget)?.set_value(value)?)
    }

    /// Regenerate the appearance if the widget is dirty. Returns whether an
    /// update ran.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle, or the update error;
    /// the widget then stays dirty.
    pub fn update_widget(&mut self, widget: WidgetHandle) -> Result<bool> {
        let widget = self.widget_mut(widget)?;
        if !widget.is_dirty() {
            return Ok(false);
        }
        widget.update()?;
        Ok(true)
    }

    /// Remove the widget from its page and release the handle.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn delete_widget(&mut self, widget: WidgetHandle) -> Result<()> {
        let r = self.widget_ref(widget)?;
        lookup_mut(&mut self.pages, r.page, "page")?
            .overlay
            .delete_widget(r.id)?;
        self.widgets.remove(widget);
        Ok(())
    }

    /// Release the handle; the widget stays on its page.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle.
    pub fn drop_widget(&mut self, widget: WidgetHandle) -> Result<()> {
        release(&mut self.widgets, widget, "widget").map(drop)
    }

    /// First widget in field order.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale page handle.
    pub fn first_widget(&mut self, page: PageHandle) -> Result<Option<WidgetHandle>> {
        let first = lookup(&self.pages, page, "page")?.overlay.first_widget();
        Ok(first.map(|id| self.widget_handle(page, id)))
    }

    /// Widget after `widget` in field order.
    ///
    /// # Errors
    ///
    /// Returns an `Argument` error for a stale handle or a deleted widget.
    pub fn next_widget(&mut self, widget: WidgetHandle) -> Result<Option<WidgetHandle>> {
        let r = self.widget_ref(widget)?;
        let next = lookup(&self.pages, r.page, "page")?.overlay.next_widget(r.id)?;
        Ok(next.map(|id| self.widget_handle(r.page, id)))
    }

    /// # Errors
    ///
    /// Returns an `Argument` error for a stale page handle.
    pub fn find_widget(&mut self, page: PageHandle, name: &str) -> Result<Option<WidgetHandle>> {
        let found = lookup(&self.pages, page, "page")?.overlay.find_widget(name);
        Ok(found.map(|id| self.widget_handle(page, id)))
    }
}
