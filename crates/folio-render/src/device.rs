//! Device trait and the page protocol state machine shared by all devices.
//!
//! A device moves through `Created → (begin_page → commands → end_page)* →
//! Closed`. Drawing outside an open page, a nested `begin_page`, or closing
//! with a page still open puts the device into `Failed`; every later call on
//! a failed or closed device is rejected.

use crate::command::Command;
use crate::error::{RenderError, Result};
use folio_core::{Matrix, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceState {
    /// No page has been started yet
    Created,
    /// Between `begin_page` and `end_page`
    PageOpen,
    /// At least one page finished, none open
    Ready,
    Closed,
    Failed,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::PageOpen => "page open",
            Self::Ready => "ready",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Output sink for drawing commands.
pub trait Device {
    /// Start a page with the given media box in device space.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Protocol`] if a page is already open, or
    /// [`RenderError::DeviceFailed`]/[`RenderError::DeviceClosed`].
    fn begin_page(&mut self, mediabox: &Rect) -> Result<()>;

    /// Finish the open page.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Protocol`] if no page is open.
    fn end_page(&mut self) -> Result<()>;

    /// Consume one command with its combined transform.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Protocol`] outside an open page; devices may
    /// also report non-fatal per-command errors (e.g. clip underflow) that
    /// leave the state unchanged.
    fn draw(&mut self, command: &Command, ctm: &Matrix) -> Result<()>;

    /// Flush output and refuse further calls.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Protocol`] if a page is still open.
    fn close(&mut self) -> Result<()>;

    fn state(&self) -> DeviceState;
}

/// State machine embedded by each device implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProtocol {
    state: DeviceState,
    pages: usize,
}

impl Default for PageProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl PageProtocol {
    #[must_use = "creates a new protocol tracker"]
    pub const fn new() -> Self {
        Self {
            state: DeviceState::Created,
            pages: 0,
        }
    }

    #[inline]
    #[must_use = "returns the current state"]
    pub const fn state(&self) -> DeviceState {
        self.state
    }

    /// Number of pages completed with `end_page`.
    #[inline]
    #[must_use = "returns the completed page count"]
    pub const fn pages(&self) -> usize {
        self.pages
    }

    fn usable(&self) -> Result<()> {
        match self.state {
            DeviceState::Failed => Err(RenderError::DeviceFailed),
            DeviceState::Closed => Err(RenderError::DeviceClosed),
            _ => Ok(()),
        }
    }

    fn violation(&mut self, op: &'static str) -> RenderError {
        let state = self.state;
        log::warn!("Device protocol violation: {op} while {state}");
        self.state = DeviceState::Failed;
        RenderError::Protocol { op, state }
    }

    /// Transition into `PageOpen`.
    ///
    /// # Errors
    ///
    /// Nested pages are a protocol violation.
    pub fn begin(&mut self) -> Result<()> {
        self.usable()?;
        if self.state == DeviceState::PageOpen {
            return Err(self.violation("begin_page"));
        }
        self.state = DeviceState::PageOpen;
        Ok(())
    }

    /// Transition out of `PageOpen`.
    ///
    /// # Errors
    ///
    /// Ending without an open page is a protocol violation.
    pub fn end(&mut self) -> Result<()> {
        self.usable()?;
        if self.state != DeviceState::PageOpen {
            return Err(self.violation("end_page"));
        }
        self.state = DeviceState::Ready;
        self.pages += 1;
        Ok(())
    }

    /// Check that `op` may draw now.
    ///
    /// # Errors
    ///
    /// Drawing outside an open page is a protocol violation.
    pub fn require_open(&mut self, op: &'static str) -> Result<()> {
        self.usable()?;
        if self.state != DeviceState::PageOpen {
            return Err(self.violation(op));
        }
        Ok(())
    }

    /// Transition into `Closed`.
    ///
    /// # Errors
    ///
    /// Closing with a page open is a protocol violation.
    pub fn close(&mut self) -> Result<()> {
        self.usable()?;
        if self.state == DeviceState::PageOpen {
            return Err(self.violation("close"));
        }
        self.state = DeviceState::Closed;
        Ok(())
    }

    /// Mark the device broken after an output failure.
    pub fn fail(&mut self) {
        self.state = DeviceState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_happy_path() {
        let mut p = PageProtocol::new();
        assert_eq!(p.state(), DeviceState::Created);
        p.begin().unwrap();
        p.require_open("fill_path").unwrap();
        p.end().unwrap();
        assert_eq!(p.state(), DeviceState::Ready);
        p.begin().unwrap();
        p.end().unwrap();
        assert_eq!(p.pages(), 2);
        p.close().unwrap();
        assert_eq!(p.state(), DeviceState::Closed);
    }

    #[test]
    fn test_draw_outside_page_fails_device() {
        let mut p = PageProtocol::new();
        let err = p.require_open("fill_path").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Protocol {
                op: "fill_path",
                state: DeviceState::Created
            }
        ));
        assert_eq!(p.state(), DeviceState::Failed);
        assert!(matches!(p.begin(), Err(RenderError::DeviceFailed)));
    }

    #[test]
    fn test_nested_begin_fails() {
        let mut p = PageProtocol::new();
        p.begin().unwrap();
        assert!(p.begin().is_err());
        assert_eq!(p.state(), DeviceState::Failed);
    }

    #[test]
    fn test_close_with_open_page_fails() {
        let mut p = PageProtocol::new();
        p.begin().unwrap();
        assert!(p.close().is_err());
        assert_eq!(p.state(), DeviceState::Failed);
    }

    #[test]
    fn test_calls_after_close_rejected() {
        let mut p = PageProtocol::new();
        p.close().unwrap();
        assert!(matches!(p.begin(), Err(RenderError::DeviceClosed)));
        assert!(matches!(p.close(), Err(RenderError::DeviceClosed)));
        assert_eq!(p.state(), DeviceState::Closed);
    }
}
