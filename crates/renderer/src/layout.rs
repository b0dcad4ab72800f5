//! Hit regions of the preview window.
//!
//! The left column holds one band per tracked link, top to bottom. A fixed
//! confirm control sits at the centre of the window while it is visible.

use crate::types::PixelSize;

/// Share of the window width taken by the link column.
pub const LINK_COLUMN_FRACTION: f64 = 0.3;
pub const CONFIRM_WIDTH: f64 = 200.0;
pub const CONFIRM_HEIGHT: f64 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Link(usize),
    Confirm,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkLayout {
    link_count: usize,
}

impl LinkLayout {
    pub fn new(link_count: usize) -> Self {
        Self { link_count }
    }

    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Classifies a cursor position in physical pixels. The confirm control
    /// only counts while `confirm_visible` and wins over the link column.
    pub fn hit_test(&self, x: f64, y: f64, size: PixelSize, confirm_visible: bool) -> Hit {
        let width = f64::from(size.width.max(1));
        let height = f64::from(size.height.max(1));
        if x < 0.0 || y < 0.0 || x >= width || y >= height {
            return Hit::Outside;
        }

        if confirm_visible {
            let left = (width - CONFIRM_WIDTH) / 2.0;
            let top = (height - CONFIRM_HEIGHT) / 2.0;
            if x >= left && x < left + CONFIRM_WIDTH && y >= top && y < top + CONFIRM_HEIGHT {
                return Hit::Confirm;
            }
        }

        if self.link_count == 0 || x >= width * LINK_COLUMN_FRACTION {
            return Hit::Outside;
        }
        let band = height / self.link_count as f64;
        let index = ((y / band) as usize).min(self.link_count - 1);
        Hit::Link(index)
    }
}
