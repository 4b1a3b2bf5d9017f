//! # folio-core
//!
//! Shared primitives for the folio document engine.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`geometry`] | `Point`, `Rect`, `IRect`, `Quad`, `Matrix` |
//! | [`cookie`] | `Cookie` cancellation/progress token |
//! | [`handle`] | `Handle<T>` / `HandleStore<T>` generational arena |
//! | [`error`] | `FolioError` taxonomy and `Result` alias |
//!
//! Everything else in the workspace (archive, format families, rendering,
//! annotations) builds on these types; none of them depend on each other.
//!
//! ## Quick Start
//!
//! ```rust
//! use folio_core::{Matrix, Point, Rect};
//!
//! let page = Rect::from_size(612.0, 792.0);
//! let zoom = Matrix::scale(2.0, 2.0).concat(&Matrix::rotate(90.0));
//! let bounds = page.transform(&zoom);
//! assert_eq!(bounds.width(), 1584.0);
//!
//! let p = Point::new(1.0, 0.0).transform(&Matrix::translate(5.0, 5.0));
//! assert_eq!(p, Point::new(6.0, 5.0));
//! ```

pub mod cookie;
pub mod error;
pub mod geometry;
pub mod handle;

pub use cookie::{Cookie, CookieProgress};
pub use error::{ErrorKind, FolioError, Result};
pub use geometry::{IRect, Matrix, Point, Quad, Rect};
pub use handle::{Handle, HandleStore};

/// Points per inch in page space.
pub const POINTS_PER_INCH: f32 = 72.0;
