//! Terminal backend for engine page surfaces.
//!
//! Every surface shares one [`SheetBuffer`]. During `Book::render_frame` each
//! visible page pushes a [`Sheet`] into it; the view drains the buffer after
//! the frame and paints the sheets in z order.

use std::cell::RefCell;
use std::rc::Rc;

use folio::{PageSnapshot, PageSurface, RenderError};
use tracing::trace;

use crate::brochure::PageContent;

/// A page as presented for one frame
#[derive(Debug, Clone)]
pub struct Sheet {
    pub index: usize,
    pub content: Rc<PageContent>,
    pub snapshot: PageSnapshot,
    /// Back side of a page turned in portrait layout
    pub mirrored: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SheetBuffer {
    sheets: Rc<RefCell<Vec<Sheet>>>,
}

impl SheetBuffer {
    fn push(&self, sheet: Sheet) {
        let mut sheets = self.sheets.borrow_mut();
        // A page drawn twice in one frame keeps only its latest snapshot
        sheets.retain(|s| !(s.index == sheet.index && s.mirrored == sheet.mirrored));
        sheets.push(sheet);
    }

    fn remove(&self, index: usize, mirrored: bool) {
        self.sheets
            .borrow_mut()
            .retain(|s| !(s.index == index && s.mirrored == mirrored));
    }

    /// Drain the sheets drawn since the last call, lowest z first
    pub fn take(&self) -> Vec<Sheet> {
        let mut sheets = std::mem::take(&mut *self.sheets.borrow_mut());
        sheets.sort_by_key(|s| s.snapshot.z_index);
        sheets
    }
}

#[derive(Debug, Clone)]
pub struct TerminalSurface {
    index: usize,
    content: Rc<PageContent>,
    buffer: SheetBuffer,
    mirrored: bool,
}

impl TerminalSurface {
    pub fn new(index: usize, content: Rc<PageContent>, buffer: SheetBuffer) -> Self {
        Self {
            index,
            content,
            buffer,
            mirrored: false,
        }
    }
}

impl PageSurface for TerminalSurface {
    fn draw(&mut self, snapshot: &PageSnapshot) -> Result<(), RenderError> {
        if snapshot.width <= 0.0 || snapshot.height <= 0.0 {
            return Err(RenderError::DrawFailed(format!(
                "page {} has no area",
                self.index
            )));
        }
        self.buffer.push(Sheet {
            index: self.index,
            content: self.content.clone(),
            snapshot: snapshot.clone(),
            mirrored: self.mirrored,
        });
        Ok(())
    }

    fn hide(&mut self) {
        trace!("Page {} hidden", self.index);
        self.buffer.remove(self.index, self.mirrored);
    }

    fn duplicate(&self) -> Result<Box<dyn PageSurface>, RenderError> {
        Ok(Box::new(Self {
            mirrored: true,
            ..self.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio::{PageDensity, PageOrientation, Placement, Point};
    use pretty_assertions::assert_eq;

    fn snapshot(z_index: i32) -> PageSnapshot {
        PageSnapshot {
            version: 1,
            density: PageDensity::Soft,
            orientation: PageOrientation::Right,
            z_index,
            width: 100.0,
            height: 150.0,
            placement: Placement::Flat {
                origin: Point::new(0.0, 0.0),
            },
        }
    }

    fn content() -> Rc<PageContent> {
        Rc::new(PageContent {
            title: "Page".into(),
            body: Vec::new(),
            color: None,
            hard: false,
        })
    }

    #[test]
    fn test_sheets_come_out_in_z_order() {
        let buffer = SheetBuffer::default();
        let mut top = TerminalSurface::new(1, content(), buffer.clone());
        let mut below = TerminalSurface::new(0, content(), buffer.clone());
        top.draw(&snapshot(3)).unwrap();
        below.draw(&snapshot(1)).unwrap();

        let order: Vec<usize> = buffer.take().iter().map(|s| s.index).collect();
        assert_eq!(order, vec![0, 1]);
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn test_copy_is_mirrored_and_hides_separately() {
        let buffer = SheetBuffer::default();
        let mut page = TerminalSurface::new(2, content(), buffer.clone());
        let mut copy = page.duplicate().unwrap();
        page.draw(&snapshot(1)).unwrap();
        copy.draw(&snapshot(3)).unwrap();
        page.hide();

        let sheets = buffer.take();
        assert_eq!(sheets.len(), 1);
        assert!(sheets[0].mirrored);
    }
}
