//! Display lists: recorded command sequences replayed against devices.

use crate::command::Command;
use crate::device::{Device, DeviceState};
use crate::error::Result;
use crate::list_device::ListDevice;
use crate::source::PageSource;
use folio_core::{Cookie, Matrix, Rect};
use serde::{Deserialize, Serialize};

/// A recorded command with its transform and precomputed page-space bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub command: Command,
    pub ctm: Matrix,
    /// Local bounds transformed by `ctm`
    pub bbox: Rect,
}

/// Outcome of a replay. Aborting through the cookie is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    /// Stopped before item `at`
    Aborted { at: usize },
}

impl RunStatus {
    #[inline]
    #[must_use = "returns whether the replay was aborted"]
    pub const fn is_aborted(self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Append-only sequence of drawing commands.
///
/// # Examples
///
/// ```rust
/// use folio_core::{Matrix, Rect};
/// use folio_render::{Color, Command, DisplayList, DrawDevice, Path, Pixmap, RunStatus};
///
/// let page = Rect::from_size(100.0, 100.0);
/// let mut list = DisplayList::new(page);
/// list.push(
///     Command::FillPath { path: Path::rect(&Rect::new(10.0, 10.0, 20.0, 20.0)), even_odd: false, color: Color::BLACK },
///     Matrix::IDENTITY,
/// );
///
/// let mut dev = DrawDevice::new(Pixmap::new(folio_core::IRect::round_out(&page)).unwrap());
/// let status = list.render_page(&mut dev, &Matrix::IDENTITY, None).unwrap();
/// assert_eq!(status, RunStatus::Completed);
/// assert_eq!(dev.trace().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
    bounds: Rect,
    items: Vec<DisplayItem>,
}

impl Default for DisplayList {
    fn default() -> Self {
        Self::new(Rect::EMPTY)
    }
}

impl DisplayList {
    /// Empty list declaring `bounds` as its page rectangle.
    #[must_use = "creates a new DisplayList"]
    pub const fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            items: Vec::new(),
        }
    }

    /// Record `page` of `source` once through a list device.
    ///
    /// # Errors
    ///
    /// Propagates the source's page lookup and content errors.
    pub fn record(source: &dyn PageSource, page: usize) -> folio_core::Result<Self> {
        let bounds = source.page_bounds(page)?;
        let mut device = ListDevice::new();
        device.begin_page(&bounds)?;
        source.run_page(page, &mut device, &Matrix::IDENTITY)?;
        device.end_page()?;
        device.close()?;
        log::debug!("Recorded page {page}: {} commands", device.list().len());
        Ok(device.into_list())
    }

    #[inline]
    #[must_use = "returns the declared bounds"]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    pub(crate) fn include_bounds(&mut self, r: &Rect) {
        self.bounds = self.bounds.union(r);
    }

    #[inline]
    #[must_use = "returns the command count"]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use = "returns whether the list is empty"]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use = "returns the recorded items"]
    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    /// Append a command drawn through `ctm`.
    pub fn push(&mut self, command: Command, ctm: Matrix) {
        let bbox = command.local_bounds().transform(&ctm);
        self.items.push(DisplayItem { command, ctm, bbox });
    }

    /// Move the commands of `other` onto the end of this list and grow the
    /// bounds to cover it.
    pub fn append(&mut self, other: Self) {
        self.include_bounds(&other.bounds);
        self.items.extend(other.items);
    }

    /// Remove every command, keeping the bounds.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replay the commands into `device` through `ctm`.
    ///
    /// Drawing commands whose transformed bounds miss `scissor` are skipped;
    /// clip commands always pass so clip nesting stays balanced. The cookie,
    /// when given, is polled for abort before every command and advanced
    /// after it. If it has no `progress_max` yet, it is set to
    /// `progress + len()` before the first command.
    ///
    /// A device error is counted on the cookie and replay continues, unless
    /// the device is left `Failed` or `Closed`.
    ///
    /// # Errors
    ///
    /// Returns the device error that left it unusable.
    pub fn run(
        &self,
        device: &mut dyn Device,
        ctm: &Matrix,
        scissor: &Rect,
        cookie: Option<&Cookie>,
    ) -> Result<RunStatus> {
        if let Some(cookie) = cookie {
            let done = cookie.progress().progress;
            cookie.init_progress_max(done.saturating_add(self.items.len() as u64));
        }

        for (at, item) in self.items.iter().enumerate() {
            if cookie.is_some_and(Cookie::is_aborted) {
                log::debug!("Display list replay aborted at command {at}");
                return Ok(RunStatus::Aborted { at });
            }

            if item.command.is_clip() || touches(&item.bbox.transform(ctm), scissor) {
                let combined = item.ctm.concat(ctm);
                log::trace!("replay {} {}", item.command.name(), combined);
                if let Err(err) = device.draw(&item.command, &combined) {
                    if matches!(device.state(), DeviceState::Failed | DeviceState::Closed) {
                        return Err(err);
                    }
                    log::warn!("Command {at} ({}) failed: {err}", item.command.name());
                    if let Some(cookie) = cookie {
                        cookie.inc_errors();
                    }
                }
            }

            if let Some(cookie) = cookie {
                cookie.inc_progress();
            }
        }
        Ok(RunStatus::Completed)
    }

    /// Run the list as one page: `begin_page` with the transformed bounds,
    /// replay with no scissor, then `end_page`. The page is ended even when
    /// the cookie aborts the replay.
    ///
    /// # Errors
    ///
    /// Returns protocol errors from the device.
    pub fn render_page(
        &self,
        device: &mut dyn Device,
        ctm: &Matrix,
        cookie: Option<&Cookie>,
    ) -> Result<RunStatus> {
        device.begin_page(&self.bounds.transform(ctm))?;
        let status = self.run(device, ctm, &Rect::INFINITE, cookie)?;
        device.end_page()?;
        Ok(status)
    }
}

/// Overlap test that keeps zero-area bounds (horizontal or vertical
/// strokes) visible.
fn touches(bbox: &Rect, scissor: &Rect) -> bool {
    bbox.is_valid()
        && scissor.is_valid()
        && bbox.x0 <= scissor.x1
        && bbox.x1 >= scissor.x0
        && bbox.y0 <= scissor.y1
        && bbox.y1 >= scissor.y0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{DrawDevice, Pixmap};
    use crate::error::RenderError;
    use crate::path::{Color, Path};
    use folio_core::IRect;

    fn square(x: f32, y: f32) -> Command {
        Command::FillPath {
            path: Path::rect(&Rect::new(x, y, x + 10.0, y + 10.0)),
            even_odd: false,
            color: Color::BLACK,
        }
    }

    fn device() -> DrawDevice {
        DrawDevice::new(Pixmap::new(IRect::new(0, 0, 100, 100)).unwrap())
    }

    fn list_of(n: usize) -> DisplayList {
        let mut list = DisplayList::new(Rect::from_size(100.0, 100.0));
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            list.push(square(i as f32, 0.0), Matrix::IDENTITY);
        }
        list
    }

    #[test]
    fn test_push_precomputes_bbox() {
        let mut list = DisplayList::default();
        list.push(square(0.0, 0.0), Matrix::translate(5.0, 5.0));
        assert_eq!(list.items()[0].bbox, Rect::new(5.0, 5.0, 15.0, 15.0));
        assert_eq!(list.len(), 1);
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_clone_is_deep() {
        let list = list_of(3);
        let mut copy = list.clone();
        copy.push(square(50.0, 50.0), Matrix::IDENTITY);
        assert_eq!(list.len(), 3);
        assert_eq!(copy.len(), 4);
    }

    #[test]
    fn test_run_sets_progress_max_and_counts() {
        let list = list_of(4);
        let cookie = Cookie::new();
        let mut dev = device();
        let status = list
            .render_page(&mut dev, &Matrix::IDENTITY, Some(&cookie))
            .unwrap();
        assert_eq!(status, RunStatus::Completed);
        let p = cookie.progress();
        assert_eq!(p.progress, 4);
        assert_eq!(p.progress_max, Some(4));
        assert!(cookie.is_complete());
    }

    #[test]
    fn test_existing_progress_max_is_kept() {
        let list = list_of(2);
        let cookie = Cookie::new();
        cookie.set_progress_max(10);
        let mut dev = device();
        list.render_page(&mut dev, &Matrix::IDENTITY, Some(&cookie))
            .unwrap();
        assert_eq!(cookie.progress().progress_max, Some(10));
        assert_eq!(cookie.progress_percent(), 20);
    }

    #[test]
    fn test_abort_before_first_command() {
        let list = list_of(3);
        let cookie = Cookie::new();
        cookie.abort();
        let mut dev = device();
        let status = list
            .render_page(&mut dev, &Matrix::IDENTITY, Some(&cookie))
            .unwrap();
        assert_eq!(status, RunStatus::Aborted { at: 0 });
        assert!(dev.trace().is_empty());
        // the page was still closed
        assert_eq!(dev.state(), DeviceState::Ready);
        dev.close().unwrap();
    }

    #[test]
    fn test_scissor_culls_outside_commands() {
        let mut list = DisplayList::new(Rect::from_size(100.0, 100.0));
        list.push(square(0.0, 0.0), Matrix::IDENTITY);
        list.push(square(80.0, 80.0), Matrix::IDENTITY);
        let mut dev = device();
        dev.begin_page(&list.bounds()).unwrap();
        list.run(
            &mut dev,
            &Matrix::IDENTITY,
            &Rect::new(0.0, 0.0, 50.0, 50.0),
            None,
        )
        .unwrap();
        dev.end_page().unwrap();
        assert_eq!(dev.trace().len(), 1);
    }

    #[test]
    fn test_horizontal_line_not_culled() {
        let mut path = Path::new();
        path.move_to(0.0, 10.0);
        path.line_to(50.0, 10.0);
        let mut list = DisplayList::new(Rect::from_size(100.0, 100.0));
        list.push(
            Command::FillPath {
                path,
                even_odd: false,
                color: Color::BLACK,
            },
            Matrix::IDENTITY,
        );
        let mut dev = device();
        dev.begin_page(&list.bounds()).unwrap();
        list.run(&mut dev, &Matrix::IDENTITY, &Rect::from_size(100.0, 100.0), None)
            .unwrap();
        assert_eq!(dev.trace().len(), 1);
    }

    #[test]
    fn test_clip_underflow_counted_not_fatal() {
        let mut list = list_of(1);
        list.push(Command::PopClip, Matrix::IDENTITY);
        list.push(square(20.0, 20.0), Matrix::IDENTITY);
        let cookie = Cookie::new();
        let mut dev = device();
        let status = list
            .render_page(&mut dev, &Matrix::IDENTITY, Some(&cookie))
            .unwrap();
        assert_eq!(status, RunStatus::Completed);
        assert_eq!(cookie.progress().errors, 1);
        assert_eq!(dev.trace().len(), 2);
    }

    #[test]
    fn test_run_without_page_is_protocol_error() {
        let list = list_of(1);
        let mut dev = device();
        let err = list
            .run(&mut dev, &Matrix::IDENTITY, &Rect::INFINITE, None)
            .unwrap_err();
        assert!(matches!(err, RenderError::Protocol { .. }));
        assert_eq!(dev.state(), DeviceState::Failed);
    }

    #[test]
    fn test_run_applies_item_then_run_ctm() {
        let mut list = DisplayList::new(Rect::from_size(100.0, 100.0));
        list.push(square(0.0, 0.0), Matrix::scale(2.0, 2.0));
        let mut dev = device();
        list.render_page(&mut dev, &Matrix::translate(5.0, 0.0), None)
            .unwrap();
        let op = &dev.trace()[0];
        assert_eq!(op.ctm, Matrix::new(2.0, 0.0, 0.0, 2.0, 5.0, 0.0));
        assert_eq!(op.bbox, Rect::new(5.0, 0.0, 25.0, 20.0));
    }

    #[test]
    fn test_append_moves_items_and_grows_bounds() {
        let mut list = list_of(2);
        let mut more = DisplayList::new(Rect::new(0.0, 0.0, 300.0, 50.0));
        more.push(square(200.0, 10.0), Matrix::IDENTITY);
        let before = list.bounds();

        list.append(more);
        assert_eq!(list.len(), 3);
        assert_eq!(list.items()[2].bbox.x0, 200.0);
        assert_eq!(list.bounds(), before.union(&Rect::new(0.0, 0.0, 300.0, 50.0)));

        list.append(DisplayList::default());
        assert_eq!(list.len(), 3);
    }
}
