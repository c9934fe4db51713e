// crates/trellis-layout/src/cell.rs
use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use trellis_core::GridLocation;

/// Sizing attributes every cell exposes to the layout that owns it.
///
/// Arrays hold one entry per axis: index 0 is horizontal, index 1 vertical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellProps {
    /// Weight of this cell when free space is distributed. 0 means the cell keeps its own size.
    pub proportion: [u16; 2],
    /// 0 is the lowest priority, 255 the highest. A cell below its minimum size may only take
    /// space from cells whose priority is equal or higher.
    pub priority: u8,
    /// When true the cell fills the slot it was given; otherwise it is never larger than
    /// `cell_size()`.
    pub expand: [bool; 2],
    pub grid_location: GridLocation,
    /// Space around the cell. Half goes on each side.
    pub margin: Vec2,
    pub min_size: Vec2,
}

impl Default for CellProps {
    fn default() -> Self {
        Self {
            proportion: [0, 0],
            priority: 0,
            expand: [false, false],
            grid_location: GridLocation::TopLeft,
            margin: Vec2::ZERO,
            min_size: Vec2::ZERO,
        }
    }
}

impl CellProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proportion(mut self, x: u16, y: u16) -> Self {
        self.proportion = [x, y];
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_expand(mut self, x: bool, y: bool) -> Self {
        self.expand = [x, y];
        self
    }

    pub fn with_grid_location(mut self, grid_location: GridLocation) -> Self {
        self.grid_location = grid_location;
        self
    }

    pub fn with_margin(mut self, margin: Vec2) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_min_size(mut self, min_size: Vec2) -> Self {
        self.min_size = min_size;
        self
    }
}

/// Anything a layout can size and place.
pub trait LayoutCell {
    fn props(&self) -> &CellProps;
    fn props_mut(&mut self) -> &mut CellProps;

    fn set_cell_offset(&mut self, top_left: Vec2);
    fn set_cell_size(&mut self, size: Vec2);

    /// `hard_size` is the largest size the slot can hold. Leaf cells usually ignore it.
    fn set_cell_size_with_hard(&mut self, size: Vec2, _hard_size: Vec2) {
        self.set_cell_size(size);
    }

    /// Size the cell would like to have.
    fn cell_size(&self) -> Vec2;

    /// Smallest size the cell should be given. Does not include the margin.
    fn cell_min_size(&self) -> Vec2;

    /// Called after the owning layout committed its geometry.
    fn notify_layout_updated(&mut self) {}
}

pub type CellRef = Rc<RefCell<dyn LayoutCell>>;

/// Blank space that takes its share of proportional space.
#[derive(Debug, Clone)]
pub struct LayoutSpacer {
    props: CellProps,
}

impl LayoutSpacer {
    pub fn new() -> Self {
        Self {
            props: CellProps::new().with_proportion(1, 1).with_expand(true, true),
        }
    }

    pub fn with_min_size(mut self, min_size: Vec2) -> Self {
        self.props.min_size = min_size;
        self
    }
}

impl Default for LayoutSpacer {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCell for LayoutSpacer {
    fn props(&self) -> &CellProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut CellProps {
        &mut self.props
    }

    fn set_cell_offset(&mut self, _top_left: Vec2) {}

    fn set_cell_size(&mut self, _size: Vec2) {}

    fn cell_size(&self) -> Vec2 {
        self.props.min_size
    }

    fn cell_min_size(&self) -> Vec2 {
        self.props.min_size
    }
}

/// Leaf cell with a fixed preferred size that records the geometry it was assigned.
///
/// Stands in for a widget: labels, buttons and the like report their content size through
/// `preferred` and read back `offset`/`size` after layout.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    props: CellProps,
    pub preferred: Vec2,
    pub offset: Vec2,
    pub size: Vec2,
    pub hard_size: Vec2,
    pub layout_passes: u32,
}

impl LayoutBox {
    pub fn new(preferred: Vec2) -> Self {
        Self {
            props: CellProps::new(),
            preferred,
            offset: Vec2::ZERO,
            size: Vec2::ZERO,
            hard_size: Vec2::ZERO,
            layout_passes: 0,
        }
    }

    pub fn with_props(mut self, props: CellProps) -> Self {
        self.props = props;
        self
    }

    pub fn shared(self) -> Rc<RefCell<LayoutBox>> {
        Rc::new(RefCell::new(self))
    }
}

impl LayoutCell for LayoutBox {
    fn props(&self) -> &CellProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut CellProps {
        &mut self.props
    }

    fn set_cell_offset(&mut self, top_left: Vec2) {
        self.offset = top_left;
    }

    fn set_cell_size(&mut self, size: Vec2) {
        self.size = size;
        self.hard_size = size;
    }

    fn set_cell_size_with_hard(&mut self, size: Vec2, hard_size: Vec2) {
        self.size = size;
        self.hard_size = hard_size;
    }

    fn cell_size(&self) -> Vec2 {
        self.preferred.max(self.props.min_size)
    }

    fn cell_min_size(&self) -> Vec2 {
        self.props.min_size
    }

    fn notify_layout_updated(&mut self) {
        self.layout_passes += 1;
    }
}
