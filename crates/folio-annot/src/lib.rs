//! # folio-annot
//!
//! Annotation and form widget overlays for folio pages.
//!
//! A [`PageOverlay`] owns the annotations and widgets of one page. Every
//! mutation marks the object dirty; `update` validates it and regenerates
//! its appearance as a [`folio_render::DisplayList`] in page space. A failed
//! update leaves the object dirty and otherwise untouched.
//!
//! ## Quick Start
//!
//! ```rust
//! use folio_annot::{AnnotType, PageOverlay, WidgetType};
//! use folio_core::Rect;
//!
//! let mut overlay = PageOverlay::new();
//! let note = overlay.create_annot(AnnotType::Highlight, Rect::new(72.0, 100.0, 300.0, 114.0))?;
//! overlay.annot_mut(note)?.set_opacity(0.4)?;
//! overlay.annot_mut(note)?.update()?;
//!
//! let zip = overlay.create_text_field("zip", Rect::new(72.0, 200.0, 172.0, 220.0), Some(5))?;
//! assert!(overlay.widget_mut(zip)?.set_value("123456").is_err());
//! overlay.widget_mut(zip)?.set_value("94105")?;
//! overlay.widget_mut(zip)?.update()?;
//! assert!(!overlay.has_dirty());
//!
//! let agree = overlay.create_widget(WidgetType::CheckBox, "agree", Rect::new(72.0, 240.0, 86.0, 254.0))?;
//! overlay.widget_mut(agree)?.set_value("Yes")?;
//! assert!(overlay.widget(agree)?.is_checked());
//! # Ok::<(), folio_annot::AnnotError>(())
//! ```

pub mod annot;
pub mod appearance;
pub mod error;
pub mod kind;
pub mod overlay;
pub mod widget;

pub use annot::{AnnotId, Annotation};
pub use error::{AnnotError, Result};
pub use kind::{AnnotFlags, AnnotType};
pub use overlay::{PageOverlay, Widgets};
pub use widget::{FieldAlignment, TextFormat, Widget, WidgetType, OFF_STATE, ON_STATE};
