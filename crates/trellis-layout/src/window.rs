// crates/trellis-layout/src/window.rs
use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

/// A scrollable container whose size is kept in sync with a layout's computed size.
pub trait AdjustableWindow {
    fn size(&self) -> Vec2;
    fn set_size(&mut self, size: Vec2);

    fn local_top_left(&self) -> Vec2;
    fn set_top_left(&mut self, top_left: Vec2);

    /// Border thickness, top-left plus bottom-right.
    fn border_combined(&self) -> Vec2;

    /// Recomputes the scrollable area from the window's children.
    fn size_scroll_to_fit(&mut self);

    /// Non-scrolling windows are resized to the content instead.
    fn can_scroll(&self) -> bool {
        true
    }
}

pub type WindowRef = Rc<RefCell<dyn AdjustableWindow>>;
