// crates/trellis-layout/src/table.rs
use glam::Vec2;
use tracing::{debug, warn};
use trellis_core::{AxisAnchor, GridLocation};

use crate::base::{impl_layout_cell, tell_children_to_update_layout, Layout, LayoutBase};
use crate::cell::CellRef;

/// A grid in which every cell gets the same box: the largest minimum size (plus margin)
/// of any cell.
pub struct LayoutTableSameSize {
    pub base: LayoutBase,
    /// When true cells fill the table row by row and `num_columns` is the column count.
    /// When false they fill column by column and `num_columns` counts rows instead.
    pub transpose: bool,
    pub num_columns: usize,
    cells: Vec<CellRef>,
    last_cell_box: Vec2,
}

impl LayoutTableSameSize {
    pub fn new(num_columns: usize) -> Self {
        Self {
            base: LayoutBase::new(),
            transpose: true,
            num_columns,
            cells: Vec::new(),
            last_cell_box: Vec2::ZERO,
        }
    }

    pub fn num_rows(&self) -> usize {
        let num_columns = self.num_columns.max(1);
        (self.cells.len() + num_columns - 1) / num_columns
    }

    /// Uniform box every cell was sized to in the last layout pass.
    pub fn cell_box(&self) -> Vec2 {
        self.last_cell_box
    }

    fn grid_dimensions(&self) -> (usize, usize) {
        let major = self.num_columns.max(1);
        let minor = self.num_rows();
        if self.transpose {
            (major, minor)
        } else {
            (minor, major)
        }
    }

    /// Lays out as the outermost layout, applying this layout's own margin around the grid.
    pub fn layout_as_root(&mut self) {
        self.layout_with_margin(true);
    }

    fn layout_with_margin(&mut self, is_root: bool) {
        if self.cells.is_empty() {
            return;
        }

        let num_columns = self.num_columns.max(1);
        if self.cells.len() % num_columns != 0 {
            warn!(
                "LayoutTableSameSize: {} cells do not fill {} columns evenly",
                self.cells.len(),
                num_columns
            );
        }

        self.base.sync_from_window_size();

        let (columns, rows) = self.grid_dimensions();
        let grid = Vec2::new(columns as f32, rows as f32);
        let layout_margin = if is_root { self.base.cell.margin } else { Vec2::ZERO };

        let soft_per_cell = self.base.current_size.max(self.base.cell.min_size) / grid;
        let hard_per_cell = (self.base.hard_max_size - layout_margin) / grid;

        let mut biggest = Vec2::ZERO;
        for cell in &self.cells {
            let cell = cell.borrow();
            let wanted = (cell.cell_min_size() + cell.props().margin)
                .max(soft_per_cell)
                .min(hard_per_cell);
            biggest = biggest.max(wanted);
        }

        let origin = self.base.layout_top_left() + layout_margin * 0.5;

        for row in 0..rows {
            for column in 0..columns {
                let index = if self.transpose {
                    row * columns + column
                } else {
                    column * rows + row
                };
                let Some(cell) = self.cells.get(index) else {
                    continue;
                };

                let (props, size, min) = {
                    let cell = cell.borrow();
                    (*cell.props(), cell.cell_size(), cell.cell_min_size())
                };

                let available = (biggest - min).max(Vec2::ZERO);
                let final_margin = props.margin.min(available);
                let cell_box = biggest - final_margin;

                let mut final_size = Vec2::ZERO;
                for axis in 0..2 {
                    final_size[axis] = if props.expand[axis] {
                        cell_box[axis]
                    } else {
                        size[axis].min(cell_box[axis])
                    };
                }

                let half_margin = final_margin * 0.5;
                let accum = Vec2::new(column as f32, row as f32) * biggest;
                let location = self.base.grid_location(props.grid_location);
                let top_left = place_in_box(location, accum, cell_box, final_size, half_margin);

                let mut cell = cell.borrow_mut();
                cell.set_cell_offset(origin + top_left);
                cell.set_cell_size_with_hard(final_size, cell_box);
            }
        }

        debug!(
            "LayoutTableSameSize: {}x{} grid, cell box {:?}",
            columns, rows, biggest
        );
        self.last_cell_box = biggest;
        // Root margin stays outside current_size
        self.base.commit(biggest * grid);

        tell_children_to_update_layout(&self.cells);
    }

    fn aggregate_min_size(&self) -> Vec2 {
        let (columns, rows) = self.grid_dimensions();
        let biggest = self
            .cells
            .iter()
            .map(|cell| {
                let cell = cell.borrow();
                cell.cell_min_size() + cell.props().margin
            })
            .fold(Vec2::ZERO, Vec2::max);

        (biggest * Vec2::new(columns as f32, rows as f32))
            .max(self.base.cell.min_size)
            .min(self.base.hard_max_size)
    }

    fn aggregate_cell_size(&self) -> Vec2 {
        self.aggregate_min_size()
    }
}

fn place_in_box(
    location: GridLocation,
    accum: Vec2,
    cell_box: Vec2,
    size: Vec2,
    half_margin: Vec2,
) -> Vec2 {
    let mut top_left = Vec2::ZERO;
    for axis in 0..2 {
        top_left[axis] = match location.anchor(axis) {
            AxisAnchor::Start => accum[axis] + half_margin[axis],
            AxisAnchor::Center => {
                accum[axis] + (cell_box[axis] - size[axis]) * 0.5 + half_margin[axis]
            }
            AxisAnchor::End => accum[axis] + cell_box[axis] - size[axis] - half_margin[axis],
        };
    }
    top_left
}

impl Default for LayoutTableSameSize {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Layout for LayoutTableSameSize {
    fn base(&self) -> &LayoutBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayoutBase {
        &mut self.base
    }

    fn cells(&self) -> &[CellRef] {
        &self.cells
    }

    fn add_cell(&mut self, cell: CellRef) {
        self.cells.push(cell);
    }

    fn clear_cells(&mut self) {
        self.cells.clear();
    }

    fn layout(&mut self) {
        self.layout_with_margin(false);
    }
}

impl_layout_cell!(LayoutTableSameSize);
