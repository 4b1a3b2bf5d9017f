//! Device that records into a display list.

use crate::command::Command;
use crate::device::{Device, DeviceState, PageProtocol};
use crate::error::Result;
use crate::list::DisplayList;
use folio_core::{Matrix, Rect};

/// Records every command it receives, unchanged, into a [`DisplayList`].
///
/// Each `begin_page` grows the list's bounds by the page's media box.
#[derive(Debug, Default)]
pub struct ListDevice {
    protocol: PageProtocol,
    list: DisplayList,
}

impl ListDevice {
    #[must_use = "creates a new ListDevice"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to an existing list instead of a fresh one.
    #[must_use = "creates a ListDevice over the given list"]
    pub fn appending(list: DisplayList) -> Self {
        Self {
            protocol: PageProtocol::new(),
            list,
        }
    }

    #[must_use = "returns the recorded list"]
    pub const fn list(&self) -> &DisplayList {
        &self.list
    }

    /// Take the recorded list, leaving an empty one behind.
    pub fn take_list(&mut self) -> DisplayList {
        std::mem::take(&mut self.list)
    }

    #[must_use = "returns the recorded list"]
    pub fn into_list(self) -> DisplayList {
        self.list
    }
}

impl Device for ListDevice {
    fn begin_page(&mut self, mediabox: &Rect) -> Result<()> {
        self.protocol.begin()?;
        self.list.include_bounds(mediabox);
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        self.protocol.end()
    }

    fn draw(&mut self, command: &Command, ctm: &Matrix) -> Result<()> {
        self.protocol.require_open(command.name())?;
        self.list.push(command.clone(), *ctm);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.protocol.close()
    }

    fn state(&self) -> DeviceState {
        self.protocol.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{Color, Path};

    #[test]
    fn test_records_commands_and_bounds() {
        let mut dev = ListDevice::new();
        dev.begin_page(&Rect::from_size(200.0, 300.0)).unwrap();
        dev.draw(
            &Command::FillPath {
                path: Path::rect(&Rect::new(0.0, 0.0, 1.0, 1.0)),
                even_odd: false,
                color: Color::WHITE,
            },
            &Matrix::scale(3.0, 3.0),
        )
        .unwrap();
        dev.end_page().unwrap();
        dev.close().unwrap();

        let list = dev.into_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list.bounds(), Rect::from_size(200.0, 300.0));
        assert_eq!(list.items()[0].ctm, Matrix::scale(3.0, 3.0));
    }

    #[test]
    fn test_draw_before_begin_fails() {
        let mut dev = ListDevice::new();
        assert!(dev.draw(&Command::PopClip, &Matrix::IDENTITY).is_err());
        assert_eq!(dev.state(), DeviceState::Failed);
        assert!(dev.list().is_empty());
    }

    #[test]
    fn test_appending_keeps_existing_items() {
        let mut list = DisplayList::new(Rect::from_size(10.0, 10.0));
        list.push(Command::PopClip, Matrix::IDENTITY);
        let mut dev = ListDevice::appending(list);
        dev.begin_page(&Rect::from_size(10.0, 10.0)).unwrap();
        dev.draw(&Command::PopClip, &Matrix::IDENTITY).unwrap();
        dev.end_page().unwrap();
        assert_eq!(dev.take_list().len(), 2);
        assert!(dev.list().is_empty());
    }
}
