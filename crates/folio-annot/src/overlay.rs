//! Per-page overlay owning annotations and widgets.

use crate::annot::{AnnotId, Annotation};
use crate::error::{AnnotError, Result};
use crate::kind::AnnotType;
use crate::widget::{Widget, WidgetType};
use folio_core::{Cookie, Matrix, Rect};
use folio_render::{Device, DisplayList, RunStatus};

/// Annotations and form widgets of one page, in page order.
///
/// Annotations and widgets share one id space; ids are never reused, so a
/// deleted id stays invalid for the overlay's lifetime.
#[derive(Debug, Clone, Default)]
pub struct PageOverlay {
    annots: Vec<Annotation>,
    widgets: Vec<Widget>,
    last_id: u32,
}

impl PageOverlay {
    #[must_use = "creates an empty overlay"]
    pub const fn new() -> Self {
        Self {
            annots: Vec::new(),
            widgets: Vec::new(),
            last_id: 0,
        }
    }

    fn fresh_id(&mut self) -> Result<AnnotId> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| AnnotError::Unsupported("overlay id space exhausted".to_string()))?;
        Ok(AnnotId(self.last_id))
    }

    /// Whether `id` names a live annotation or widget.
    #[must_use = "returns whether the id is live"]
    pub fn is_valid(&self, id: AnnotId) -> bool {
        self.annot_position(id).is_some() || self.widget_position(id).is_some()
    }

    /// Whether any annotation or widget needs an update.
    #[must_use = "returns whether anything is dirty"]
    pub fn has_dirty(&self) -> bool {
        self.annots.iter().any(Annotation::is_dirty) || self.widgets.iter().any(Widget::is_dirty)
    }

    // ====================================================================
    // Annotations
    // ====================================================================

    /// Create an annotation at the end of page order.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::Unsupported`] for [`AnnotType::Widget`], which
    /// is created through [`PageOverlay::create_widget`].
    pub fn create_annot(&mut self, kind: AnnotType, rect: Rect) -> Result<AnnotId> {
        if kind == AnnotType::Widget {
            return Err(AnnotError::Unsupported(
                "widgets are created with create_widget".to_string(),
            ));
        }
        let id = self.fresh_id()?;
        self.annots.push(Annotation::new(id, kind, rect));
        log::debug!("Created {kind} annotation {id}");
        Ok(id)
    }

    fn annot_position(&self, id: AnnotId) -> Option<usize> {
        self.annots.iter().position(|a| a.id() == id)
    }

    fn missing_annot(id: AnnotId) -> AnnotError {
        AnnotError::NotFound {
            what: "annotation",
            id: id.get(),
        }
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn annot(&self, id: AnnotId) -> Result<&Annotation> {
        self.annots
            .iter()
            .find(|a| a.id() == id)
            .ok_or_else(|| Self::missing_annot(id))
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn annot_mut(&mut self, id: AnnotId) -> Result<&mut Annotation> {
        self.annots
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or_else(|| Self::missing_annot(id))
    }

    /// Remove an annotation and return it.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn delete_annot(&mut self, id: AnnotId) -> Result<Annotation> {
        let index = self.annot_position(id).ok_or_else(|| Self::missing_annot(id))?;
        log::debug!("Deleted annotation {id}");
        Ok(self.annots.remove(index))
    }

    #[must_use = "returns the annotation count"]
    pub fn annot_count(&self) -> usize {
        self.annots.len()
    }

    /// Annotations in page order.
    pub fn annots(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.annots.iter()
    }

    #[must_use = "returns the first annotation id"]
    pub fn first_annot(&self) -> Option<AnnotId> {
        self.annots.first().map(Annotation::id)
    }

    /// Annotation after `id` in page order.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn next_annot(&self, id: AnnotId) -> Result<Option<AnnotId>> {
        let index = self.annot_position(id).ok_or_else(|| Self::missing_annot(id))?;
        Ok(self.annots.get(index + 1).map(Annotation::id))
    }

    /// Duplicate an annotation on this overlay under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn clone_annot(&mut self, id: AnnotId) -> Result<AnnotId> {
        let copy = self.annot(id)?.clone();
        self.adopt_annot(&copy)
    }

    /// Duplicate an annotation of this overlay onto `target` under a fresh
    /// id of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn clone_annot_into(&self, id: AnnotId, target: &mut Self) -> Result<AnnotId> {
        target.adopt_annot(self.annot(id)?)
    }

    /// Add a copy of `source`, taken from any overlay, under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::Unsupported`] once the id space is exhausted.
    pub fn adopt_annot(&mut self, source: &Annotation) -> Result<AnnotId> {
        let id = self.fresh_id()?;
        self.annots.push(source.reidentified(id));
        log::debug!("Cloned annotation {} as {id}", source.id());
        Ok(id)
    }

    // ====================================================================
    // Widgets
    // ====================================================================

    /// Create a form field at the end of field order.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::InvalidValue`] for an empty field name.
    pub fn create_widget(&mut self, field_type: WidgetType, name: &str, rect: Rect) -> Result<AnnotId> {
        if name.is_empty() {
            return Err(AnnotError::invalid(name, "empty field name"));
        }
        let id = self.fresh_id()?;
        self.widgets.push(Widget::new(id, field_type, name, rect));
        log::debug!("Created {field_type:?} widget '{name}' ({id})");
        Ok(id)
    }

    /// Text field with an optional maximum length.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::InvalidValue`] for an empty field name or an
    /// inverted rectangle.
    pub fn create_text_field(
        &mut self,
        name: &str,
        rect: Rect,
        max_len: Option<usize>,
    ) -> Result<AnnotId> {
        if !rect.is_valid() {
            return Err(AnnotError::invalid(name, "inverted field rectangle"));
        }
        let id = self.create_widget(WidgetType::Text, name, rect)?;
        if let Some(widget) = self.widgets.last_mut() {
            widget.set_max_len(max_len);
        }
        Ok(id)
    }

    fn widget_position(&self, id: AnnotId) -> Option<usize> {
        self.widgets.iter().position(|w| w.id() == id)
    }

    fn missing_widget(id: AnnotId) -> AnnotError {
        AnnotError::NotFound {
            what: "widget",
            id: id.get(),
        }
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn widget(&self, id: AnnotId) -> Result<&Widget> {
        self.widgets
            .iter()
            .find(|w| w.id() == id)
            .ok_or_else(|| Self::missing_widget(id))
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn widget_mut(&mut self, id: AnnotId) -> Result<&mut Widget> {
        self.widgets
            .iter_mut()
            .find(|w| w.id() == id)
            .ok_or_else(|| Self::missing_widget(id))
    }

    /// First widget with the field name `name`.
    #[must_use = "returns the matching widget id"]
    pub fn find_widget(&self, name: &str) -> Option<AnnotId> {
        self.widgets.iter().find(|w| w.name() == name).map(Widget::id)
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn delete_widget(&mut self, id: AnnotId) -> Result<Widget> {
        let index = self.widget_position(id).ok_or_else(|| Self::missing_widget(id))?;
        Ok(self.widgets.remove(index))
    }

    /// Duplicate a widget under a fresh id, same field name.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn clone_widget(&mut self, id: AnnotId) -> Result<AnnotId> {
        let source = self.widget(id)?.clone();
        let new_id = self.fresh_id()?;
        self.widgets.push(source.reidentified(new_id));
        Ok(new_id)
    }

    #[must_use = "returns the widget count"]
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    #[must_use = "returns the first widget id"]
    pub fn first_widget(&self) -> Option<AnnotId> {
        self.widgets.first().map(Widget::id)
    }

    /// Widget after `id` in field order.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::NotFound`] for an unknown or deleted id.
    pub fn next_widget(&self, id: AnnotId) -> Result<Option<AnnotId>> {
        let index = self.widget_position(id).ok_or_else(|| Self::missing_widget(id))?;
        Ok(self.widgets.get(index + 1).map(Widget::id))
    }

    /// Forward-only traversal in field order. The borrow keeps the overlay
    /// from changing mid-walk; fetch a new iterator to restart.
    #[must_use = "iterators are lazy"]
    pub fn widgets(&self) -> Widgets<'_> {
        Widgets {
            overlay: self,
            next: self.first_widget(),
        }
    }

    // ====================================================================
    // Appearances
    // ====================================================================

    /// Update every dirty annotation and widget, returning how many updates
    /// failed. Failed items stay dirty.
    pub fn update_dirty(&mut self) -> usize {
        let mut failed = 0;
        for annot in self.annots.iter_mut().filter(|a| a.is_dirty()) {
            if let Err(err) = annot.update() {
                log::warn!("Annotation {} not updated: {err}", annot.id());
                failed += 1;
            }
        }
        for widget in self.widgets.iter_mut().filter(|w| w.is_dirty()) {
            if let Err(err) = widget.update() {
                log::warn!("Widget '{}' not updated: {err}", widget.name());
                failed += 1;
            }
        }
        failed
    }

    fn appearances(&self) -> impl Iterator<Item = &DisplayList> {
        self.annots
            .iter()
            .filter_map(Annotation::appearance)
            .chain(self.widgets.iter().filter_map(Widget::appearance))
    }

    /// Number of commands across all cached appearances.
    #[must_use = "returns the appearance command count"]
    pub fn appearance_len(&self) -> usize {
        self.appearances().map(DisplayList::len).sum()
    }

    /// Replay the cached appearances, annotations first, onto an open
    /// device page. Items without an appearance are skipped.
    ///
    /// The cookie is polled and advanced per command as in
    /// [`DisplayList::run`]; an abort position counts every appearance
    /// command replayed before it.
    ///
    /// # Errors
    ///
    /// Returns the device error that left it unusable.
    pub fn run(
        &self,
        device: &mut dyn Device,
        ctm: &Matrix,
        cookie: Option<&Cookie>,
    ) -> folio_render::Result<RunStatus> {
        if let Some(cookie) = cookie {
            let done = cookie.progress().progress;
            cookie.init_progress_max(done.saturating_add(self.appearance_len() as u64));
        }
        let mut replayed = 0;
        for list in self.appearances() {
            match list.run(device, ctm, &Rect::INFINITE, cookie)? {
                RunStatus::Completed => replayed += list.len(),
                RunStatus::Aborted { at } => {
                    return Ok(RunStatus::Aborted {
                        at: replayed + at,
                    })
                }
            }
        }
        Ok(RunStatus::Completed)
    }

    /// All cached appearances merged into one list bounded by `page`.
    #[must_use = "returns the merged appearance list"]
    pub fn to_display_list(&self, page: Rect) -> DisplayList {
        let mut merged = DisplayList::new(page);
        for list in self.appearances() {
            for item in list.items() {
                merged.push(item.command.clone(), item.ctm);
            }
        }
        merged
    }
}

/// Iterator over the widgets of a [`PageOverlay`] in field order.
#[derive(Debug, Clone)]
pub struct Widgets<'a> {
    overlay: &'a PageOverlay,
    next: Option<AnnotId>,
}

impl<'a> Iterator for Widgets<'a> {
    type Item = &'a Widget;

    fn next(&mut self) -> Option<Self::Item> {
        let widget = self.overlay.widget(self.next?).ok()?;
        self.next = self.overlay.next_widget(widget.id()).ok().flatten();
        Some(widget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::IRect;
    use folio_render::{DrawDevice, Pixmap};

    fn rect() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 20.0)
    }

    #[test]
    fn test_annotation_lifecycle() {
        let mut overlay = PageOverlay::new();
        let a = overlay.create_annot(AnnotType::Square, rect()).unwrap();
        let b = overlay.create_annot(AnnotType::Text, rect()).unwrap();
        assert_eq!(overlay.first_annot(), Some(a));
        assert_eq!(overlay.next_annot(a).unwrap(), Some(b));
        assert_eq!(overlay.next_annot(b).unwrap(), None);

        overlay.delete_annot(a).unwrap();
        assert!(!overlay.is_valid(a));
        assert!(overlay.annot(a).is_err());
        assert!(overlay.delete_annot(a).is_err());
        assert_eq!(overlay.first_annot(), Some(b));

        // ids are not reused
        let c = overlay.create_annot(AnnotType::Ink, rect()).unwrap();
        assert_ne!(c, a);
    }

    #[test]
    fn test_widget_type_rejected_as_annot() {
        let mut overlay = PageOverlay::new();
        assert!(matches!(
            overlay.create_annot(AnnotType::Widget, rect()),
            Err(AnnotError::Unsupported(_))
        ));
    }

    #[test]
    fn test_clone_annot_same_and_other_overlay() {
        let mut page1 = PageOverlay::new();
        let mut page2 = PageOverlay::new();
        let a = page1.create_annot(AnnotType::FreeText, rect()).unwrap();
        page1.annot_mut(a).unwrap().set_contents("note");
        page1.annot_mut(a).unwrap().update().unwrap();

        let same = page1.clone_annot(a).unwrap();
        assert_ne!(same, a);
        assert_eq!(page1.annot(same).unwrap().contents(), Some("note"));
        assert!(page1.annot(same).unwrap().is_dirty());

        let other = page1.clone_annot_into(a, &mut page2).unwrap();
        assert_eq!(page2.annot(other).unwrap().kind(), AnnotType::FreeText);
        assert_eq!(page1.annot_count(), 2);
        assert_eq!(page2.annot_count(), 1);
    }

    #[test]
    fn test_widget_traversal() {
        let mut overlay = PageOverlay::new();
        let first = overlay.create_text_field("first", rect(), Some(10)).unwrap();
        let second = overlay.create_widget(WidgetType::CheckBox, "agree", rect()).unwrap();
        let third = overlay.create_widget(WidgetType::ComboBox, "color", rect()).unwrap();

        assert_eq!(overlay.first_widget(), Some(first));
        assert_eq!(overlay.next_widget(first).unwrap(), Some(second));
        assert_eq!(overlay.next_widget(third).unwrap(), None);
        let names: Vec<_> = overlay.widgets().map(Widget::name).collect();
        assert_eq!(names, ["first", "agree", "color"]);

        overlay.delete_widget(second).unwrap();
        assert!(overlay.next_widget(second).is_err());
        assert_eq!(overlay.next_widget(first).unwrap(), Some(third));
        assert_eq!(overlay.widgets().count(), 2);
        assert_eq!(overlay.find_widget("color"), Some(third));
        assert_eq!(overlay.widget(first).unwrap().max_len(), Some(10));
        assert!(overlay.create_widget(WidgetType::Text, "", rect()).is_err());
    }

    #[test]
    fn test_update_dirty_counts_failures() {
        let mut overlay = PageOverlay::new();
        overlay.create_annot(AnnotType::Square, rect()).unwrap();
        overlay
            .create_annot(AnnotType::Circle, Rect::new(0.0, 0.0, 0.0, 0.0))
            .unwrap();
        let w = overlay.create_text_field("name", rect(), None).unwrap();
        overlay.widget_mut(w).unwrap().set_value("Ada").unwrap();

        assert!(overlay.has_dirty());
        assert_eq!(overlay.update_dirty(), 1);
        assert!(overlay.has_dirty());
        assert!(!overlay.widget(w).unwrap().is_dirty());

        let merged = overlay.to_display_list(Rect::from_size(612.0, 792.0));
        assert!(merged.len() >= 2);
    }

    #[test]
    fn test_run_polls_cookie_between_appearances() {
        let mut overlay = PageOverlay::new();
        let a = overlay.create_annot(AnnotType::Square, rect()).unwrap();
        let b = overlay
            .create_annot(AnnotType::Square, Rect::new(0.0, 40.0, 100.0, 60.0))
            .unwrap();
        assert_eq!(overlay.update_dirty(), 0);
        let first = overlay.annot(a).unwrap().appearance().unwrap().len();
        let total = overlay.appearance_len();
        assert!(first > 0 && total > first);
        assert!(overlay.annot(b).unwrap().appearance().is_some());

        let mut dev = DrawDevice::new(Pixmap::new(IRect::new(0, 0, 200, 200)).unwrap());
        dev.begin_page(&Rect::from_size(200.0, 200.0)).unwrap();
        let cookie = Cookie::new();
        let status = overlay.run(&mut dev, &Matrix::IDENTITY, Some(&cookie)).unwrap();
        assert_eq!(status, RunStatus::Completed);
        assert_eq!(cookie.progress().progress, total as u64);
        assert_eq!(cookie.progress_percent(), 100);

        cookie.reset();
        cookie.abort();
        let status = overlay.run(&mut dev, &Matrix::IDENTITY, Some(&cookie)).unwrap();
        assert_eq!(status, RunStatus::Aborted { at: 0 });
        dev.end_page().unwrap();
    }
}
