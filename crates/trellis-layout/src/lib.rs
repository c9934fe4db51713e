// crates/trellis-layout/src/lib.rs
//! Proportional layout of sizeable cells.
//!
//! Every algorithm follows the same shape: cells report a minimum and a preferred size, the
//! layout hands out space along one axis by proportion, lets cells below their minimum take
//! space from cells with slack, then places each cell inside its slot according to its grid
//! location and notifies it.

pub mod base;
pub mod cell;
pub mod distribution;
pub mod line;
pub mod multiline;
pub mod table;
pub mod window;

pub use base::{tell_children_to_update_layout, Layout, LayoutBase};
pub use cell::{CellProps, CellRef, LayoutBox, LayoutCell, LayoutSpacer};
pub use distribution::{distribute, AxisLimits, Distribution, Slot, Steal};
pub use line::LayoutLine;
pub use multiline::LayoutMultiline;
pub use table::LayoutTableSameSize;
pub use window::{AdjustableWindow, WindowRef};
