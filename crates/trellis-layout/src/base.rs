// crates/trellis-layout/src/base.rs
use glam::Vec2;
use tracing::debug;
use trellis_core::GridLocation;

use crate::cell::{CellProps, CellRef};
use crate::window::WindowRef;

/// Sizing state shared by every layout algorithm.
///
/// `current_size` is the soft maximum: proportional cells are stretched to fill it, and a
/// layout pass may grow it but never shrinks it. Only [`LayoutBase::set_soft_max_size`],
/// `set_cell_size` from a parent layout, or a window resize replace it outright.
pub struct LayoutBase {
    /// Attributes used when this layout is itself a cell of another layout.
    pub cell: CellProps,
    pub top_left: Vec2,
    pub current_size: Vec2,
    pub hard_max_size: Vec2,
    /// Mirror Left/Right grid locations of every cell (right-to-left interfaces).
    pub swap_grid_locations: bool,
    adjustable_window: Option<WindowRef>,
}

impl LayoutBase {
    pub fn new() -> Self {
        Self {
            cell: CellProps::default(),
            top_left: Vec2::ZERO,
            current_size: Vec2::ZERO,
            hard_max_size: Vec2::splat(f32::MAX),
            swap_grid_locations: false,
            adjustable_window: None,
        }
    }

    pub fn with_hard_max_size(mut self, hard_max_size: Vec2) -> Self {
        self.hard_max_size = hard_max_size;
        self
    }

    pub fn set_soft_max_size(&mut self, size: Vec2) {
        self.current_size = size;
    }

    pub fn set_adjustable_window(&mut self, window: Option<WindowRef>) {
        self.adjustable_window = window;
    }

    pub fn adjustable_window(&self) -> Option<&WindowRef> {
        self.adjustable_window.as_ref()
    }

    /// Whether the along-axis hard maximum can be exceeded because the window scrolls.
    pub fn is_scrollable(&self) -> bool {
        self.adjustable_window
            .as_ref()
            .map(|window| window.borrow().can_scroll())
            .unwrap_or(false)
    }

    /// Origin that cell offsets are relative to. Cells inside a window are placed in the
    /// window's local space.
    pub fn layout_top_left(&self) -> Vec2 {
        if self.adjustable_window.is_some() {
            Vec2::ZERO
        } else {
            self.top_left
        }
    }

    pub fn grid_location(&self, location: GridLocation) -> GridLocation {
        location.swapped_if(self.swap_grid_locations)
    }

    /// Pulls the window's inner size into `current_size` ahead of a layout pass.
    pub fn sync_from_window_size(&mut self) {
        if let Some(window) = &self.adjustable_window {
            let window = window.borrow();
            self.current_size = (window.size() - window.border_combined()).max(Vec2::ZERO);
        }
    }

    /// Pushes the committed size back to the window.
    pub fn sync_to_window_size(&self) {
        if let Some(window) = &self.adjustable_window {
            let mut window = window.borrow_mut();
            if !window.can_scroll() {
                let border = window.border_combined();
                window.set_size(self.current_size + border);
            }
            window.size_scroll_to_fit();
        }
    }

    /// Single commit point of a layout pass.
    pub(crate) fn commit(&mut self, content_size: Vec2) {
        let previous = self.current_size;
        self.current_size = previous.max(content_size).min(self.hard_max_size);
        debug!(
            "Layout committed: content {:?}, size {:?} -> {:?}",
            content_size, previous, self.current_size
        );
        self.sync_to_window_size();
    }

    pub(crate) fn set_cell_size(&mut self, size: Vec2, hard_size: Vec2) {
        self.current_size = size;
        self.hard_max_size = hard_size;
    }
}

impl Default for LayoutBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifies every child after the parent committed its own geometry.
pub fn tell_children_to_update_layout(cells: &[CellRef]) {
    for cell in cells {
        cell.borrow_mut().notify_layout_updated();
    }
}

/// Common surface of the layout algorithms.
pub trait Layout {
    fn base(&self) -> &LayoutBase;
    fn base_mut(&mut self) -> &mut LayoutBase;

    fn cells(&self) -> &[CellRef];
    fn add_cell(&mut self, cell: CellRef);
    fn clear_cells(&mut self);

    /// Sizes and places every cell, then notifies them.
    fn layout(&mut self);
}

/// Implements [`crate::LayoutCell`] for a layout so layouts can nest.
macro_rules! impl_layout_cell {
    ($ty:ty) => {
        impl $crate::cell::LayoutCell for $ty {
            fn props(&self) -> &$crate::cell::CellProps {
                &self.base.cell
            }

            fn props_mut(&mut self) -> &mut $crate::cell::CellProps {
                &mut self.base.cell
            }

            fn set_cell_offset(&mut self, top_left: glam::Vec2) {
                self.base.top_left = top_left;
            }

            fn set_cell_size(&mut self, size: glam::Vec2) {
                self.base.set_cell_size(size, size);
            }

            fn set_cell_size_with_hard(&mut self, size: glam::Vec2, hard_size: glam::Vec2) {
                self.base.set_cell_size(size, hard_size.max(size));
            }

            fn cell_size(&self) -> glam::Vec2 {
                self.aggregate_cell_size()
            }

            fn cell_min_size(&self) -> glam::Vec2 {
                self.aggregate_min_size()
            }

            fn notify_layout_updated(&mut self) {
                $crate::base::Layout::layout(self);
            }
        }
    };
}

pub(crate) use impl_layout_cell;
