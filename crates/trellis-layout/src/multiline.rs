// crates/trellis-layout/src/multiline.rs
use glam::Vec2;
use tracing::warn;

use crate::base::{impl_layout_cell, Layout, LayoutBase};
use crate::cell::CellRef;
use crate::distribution::Distribution;
use crate::line::{aggregate_size, arrange_lines, cells_per_line, LineOptions};

/// A flat sequence of cells split into `num_lines` lines whose columns line up.
///
/// With 6 cells and 2 lines the first line holds cells 0..3 and the second 3..6. Cells of
/// the first line decide proportion and priority of each column; minimum and preferred sizes
/// are the largest found in the column.
pub struct LayoutMultiline {
    pub base: LayoutBase,
    pub vertical: bool,
    pub even_margin_space_at_edges: bool,
    pub expand_to_cover_soft_max_size: bool,
    pub num_lines: usize,
    cells: Vec<CellRef>,
    last_distribution: Distribution,
}

impl LayoutMultiline {
    pub fn new(num_lines: usize) -> Self {
        Self {
            base: LayoutBase::new(),
            vertical: true,
            even_margin_space_at_edges: true,
            expand_to_cover_soft_max_size: false,
            num_lines,
            cells: Vec::new(),
            last_distribution: Distribution::default(),
        }
    }

    pub fn cells_per_line(&self) -> usize {
        cells_per_line(self.cells.len(), self.num_lines)
    }

    pub fn last_distribution(&self) -> &Distribution {
        &self.last_distribution
    }

    fn aggregate_cell_size(&self) -> Vec2 {
        aggregate_size(
            &self.cells,
            self.vertical,
            self.num_lines,
            false,
            self.base.hard_max_size,
        )
    }

    fn aggregate_min_size(&self) -> Vec2 {
        aggregate_size(
            &self.cells,
            self.vertical,
            self.num_lines,
            true,
            self.base.hard_max_size,
        )
        .max(self.base.cell.min_size.min(self.base.hard_max_size))
    }
}

impl Default for LayoutMultiline {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Layout for LayoutMultiline {
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
        if self.cells.is_empty() {
            return;
        }

        let num_lines = self.num_lines.max(1);
        if self.cells.len() % num_lines != 0 {
            warn!(
                "LayoutMultiline: {} cells do not divide evenly into {} lines; the last line will be ragged",
                self.cells.len(),
                num_lines
            );
        }

        let options = LineOptions {
            vertical: self.vertical,
            even_margin_space_at_edges: self.even_margin_space_at_edges,
            expand_to_cover_soft_max_size: self.expand_to_cover_soft_max_size,
        };
        self.last_distribution = arrange_lines(&mut self.base, &self.cells, options, num_lines);
    }
}

impl_layout_cell!(LayoutMultiline);
