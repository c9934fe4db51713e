// crates/trellis-layout/src/line.rs
use glam::Vec2;
use trellis_core::AxisAnchor;

use crate::base::{impl_layout_cell, tell_children_to_update_layout, Layout, LayoutBase};
use crate::cell::{CellProps, CellRef};
use crate::distribution::{distribute, AxisLimits, Distribution, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineOptions {
    pub vertical: bool,
    pub even_margin_space_at_edges: bool,
    pub expand_to_cover_soft_max_size: bool,
}

/// All cells sharing a position along the line, merged across lines.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Column {
    /// Attributes of the cell on the first line; they govern the whole column.
    pub lead: CellProps,
    pub min: Vec2,
    pub size: Vec2,
    pub margin: Vec2,
}

pub(crate) fn cells_per_line(num_cells: usize, num_lines: usize) -> usize {
    let num_lines = num_lines.max(1);
    (num_cells + num_lines - 1) / num_lines
}

pub(crate) fn gather_columns(cells: &[CellRef], num_lines: usize) -> Vec<Column> {
    let num_lines = num_lines.max(1);
    let per_line = cells_per_line(cells.len(), num_lines);

    (0..per_line)
        .map(|x| {
            let lead = cells[x].borrow();
            let mut column = Column {
                lead: *lead.props(),
                min: lead.cell_min_size(),
                size: lead.cell_size(),
                margin: lead.props().margin,
            };
            drop(lead);

            for line in 1..num_lines {
                let Some(cell) = cells.get(line * per_line + x) else {
                    break;
                };
                let cell = cell.borrow();
                column.min = column.min.max(cell.cell_min_size());
                column.size = column.size.max(cell.cell_size());
                column.margin = column.margin.max(cell.props().margin);
            }
            column
        })
        .collect()
}

/// Size of the lines when nested inside another layout: sum along the axis, largest column
/// across it.
pub(crate) fn aggregate_size(
    cells: &[CellRef],
    vertical: bool,
    num_lines: usize,
    minimum: bool,
    hard_max_size: Vec2,
) -> Vec2 {
    if cells.is_empty() {
        return Vec2::ZERO;
    }
    let axis = vertical as usize;
    let other = 1 - axis;

    let mut result = Vec2::ZERO;
    for column in gather_columns(cells, num_lines) {
        let value = if minimum {
            column.min
        } else {
            column.size.max(column.min)
        };
        result[axis] += value[axis] + column.margin[axis];
        result[other] = result[other].max(value[other] + column.margin[other]);
    }
    result[other] *= num_lines.max(1) as f32;
    result.min(hard_max_size)
}

pub(crate) fn place_along(
    anchor: AxisAnchor,
    accum: f32,
    slot: f32,
    size: f32,
    half_margin: f32,
) -> f32 {
    match anchor {
        AxisAnchor::Start => accum + half_margin,
        AxisAnchor::Center => accum + (slot - size) * 0.5 + half_margin,
        AxisAnchor::End => accum + (slot - size) - half_margin,
    }
}

pub(crate) fn place_across(anchor: AxisAnchor, extent: f32, size: f32, half_margin: f32) -> f32 {
    match anchor {
        AxisAnchor::Start => half_margin,
        AxisAnchor::Center => (extent - size) * 0.5,
        AxisAnchor::End => extent - size - half_margin,
    }
}

/// Lays `cells` out as `num_lines` lines that share column sizes.
pub(crate) fn arrange_lines(
    base: &mut LayoutBase,
    cells: &[CellRef],
    options: LineOptions,
    num_lines: usize,
) -> Distribution {
    let axis = options.vertical as usize;
    let other = 1 - axis;
    let num_lines = num_lines.max(1);
    let per_line = cells_per_line(cells.len(), num_lines);

    base.sync_from_window_size();

    let columns = gather_columns(cells, num_lines);
    let (Some(first), Some(last)) = (columns.first(), columns.last()) else {
        return Distribution::default();
    };

    let slots: Vec<Slot> = columns
        .iter()
        .map(|column| Slot {
            proportion: column.lead.proportion[axis],
            priority: column.lead.priority,
            min: column.min[axis],
            preferred: column.size[axis].max(column.min[axis]),
        })
        .collect();

    let front_edge = if options.even_margin_space_at_edges && !first.lead.expand[axis] {
        first.margin[axis] * 0.5
    } else {
        0.0
    };
    let back_edge = if options.even_margin_space_at_edges && !last.lead.expand[axis] {
        last.margin[axis] * 0.5
    } else {
        0.0
    };
    let margins = columns.iter().map(|c| c.margin[axis]).sum::<f32>() + front_edge + back_edge;

    let scrollable = base.is_scrollable();
    let distribution = distribute(
        &slots,
        margins,
        AxisLimits {
            soft: base.current_size[axis],
            hard: base.hard_max_size[axis],
            scrollable,
        },
    );
    let factor = distribution.margin_factor;

    let mut max_other = columns
        .iter()
        .map(|c| c.size[other].max(c.min[other]) + c.margin[other])
        .fold(0.0f32, f32::max);
    if options.expand_to_cover_soft_max_size {
        max_other = max_other.max(base.current_size[other] / num_lines as f32);
    }
    if !scrollable {
        max_other = max_other.min(base.hard_max_size[other] / num_lines as f32);
    }

    let origin = base.layout_top_left();

    for line in 0..num_lines {
        let mut accum = front_edge * factor;

        for (x, column) in columns.iter().enumerate() {
            let Some(cell) = cells.get(line * per_line + x) else {
                break;
            };

            let (props, size, min) = {
                let cell = cell.borrow();
                (*cell.props(), cell.cell_size(), cell.cell_min_size())
            };
            let slot = distribution.sizes[x];

            let mut final_size = Vec2::ZERO;
            final_size[axis] = if props.expand[axis] {
                slot
            } else {
                size[axis].max(min[axis]).min(slot)
            };
            final_size[other] = if props.expand[other] {
                let available = (max_other - min[other]).max(0.0);
                max_other - available.min(props.margin[other])
            } else {
                size[other].max(min[other]).min(max_other)
            };

            let half_margin = props.margin * (0.5 * factor);
            let location = base.grid_location(props.grid_location);

            let mut top_left = Vec2::ZERO;
            top_left[axis] = place_along(
                location.anchor(axis),
                accum,
                slot,
                final_size[axis],
                half_margin[axis],
            );
            top_left[other] = place_across(
                location.anchor(other),
                max_other,
                final_size[other],
                half_margin[other],
            ) + line as f32 * max_other;

            let mut hard_size = Vec2::ZERO;
            hard_size[axis] = slot;
            hard_size[other] = max_other;

            {
                let mut cell = cell.borrow_mut();
                cell.set_cell_offset(origin + top_left);
                cell.set_cell_size_with_hard(final_size, hard_size);
            }

            accum += slot + column.margin[axis] * factor;
        }
    }

    let mut content = Vec2::ZERO;
    content[axis] = distribution.total() + margins * factor;
    content[other] = max_other * num_lines as f32;
    base.commit(content);

    tell_children_to_update_layout(cells);

    distribution
}

/// Cells in a single row or column.
pub struct LayoutLine {
    pub base: LayoutBase,
    /// Column when true, row when false.
    pub vertical: bool,
    /// Give the first and last cell a full margin towards the edges instead of half of it.
    pub even_margin_space_at_edges: bool,
    /// Stretch the cross axis to `current_size` instead of the tallest cell.
    pub expand_to_cover_soft_max_size: bool,
    cells: Vec<CellRef>,
    last_distribution: Distribution,
}

impl LayoutLine {
    pub fn new() -> Self {
        Self {
            base: LayoutBase::new(),
            vertical: true,
            even_margin_space_at_edges: true,
            expand_to_cover_soft_max_size: false,
            cells: Vec::new(),
            last_distribution: Distribution::default(),
        }
    }

    pub fn horizontal() -> Self {
        Self {
            vertical: false,
            ..Self::new()
        }
    }

    /// Result of the most recent distribution pass.
    pub fn last_distribution(&self) -> &Distribution {
        &self.last_distribution
    }

    fn options(&self) -> LineOptions {
        LineOptions {
            vertical: self.vertical,
            even_margin_space_at_edges: self.even_margin_space_at_edges,
            expand_to_cover_soft_max_size: self.expand_to_cover_soft_max_size,
        }
    }

    fn aggregate_cell_size(&self) -> Vec2 {
        aggregate_size(&self.cells, self.vertical, 1, false, self.base.hard_max_size)
    }

    fn aggregate_min_size(&self) -> Vec2 {
        aggregate_size(&self.cells, self.vertical, 1, true, self.base.hard_max_size)
            .max(self.base.cell.min_size.min(self.base.hard_max_size))
    }
}

impl Default for LayoutLine {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout for LayoutLine {
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
        let options = self.options();
        self.last_distribution = arrange_lines(&mut self.base, &self.cells, options, 1);
    }
}

impl_layout_cell!(LayoutLine);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{LayoutBox, LayoutCell, LayoutSpacer};
    use std::cell::RefCell;
    use std::rc::Rc;
    use trellis_core::GridLocation;

    fn boxed(preferred: Vec2, props: CellProps) -> Rc<RefCell<LayoutBox>> {
        LayoutBox::new(preferred).with_props(props).shared()
    }

    #[test]
    fn test_empty_line_is_noop() {
        let mut line = LayoutLine::horizontal();
        line.base.current_size = Vec2::new(10.0, 10.0);
        line.layout();
        assert_eq!(line.base.current_size, Vec2::new(10.0, 10.0));
        assert!(line.last_distribution().sizes.is_empty());
    }

    #[test]
    fn test_horizontal_proportional_row() {
        let mut line = LayoutLine::horizontal();
        line.even_margin_space_at_edges = false;
        line.base.current_size = Vec2::new(400.0, 0.0);

        let props = CellProps::new().with_min_size(Vec2::new(50.0, 20.0)).with_expand(true, false);
        let a = boxed(Vec2::ZERO, props.with_proportion(1, 0));
        let b = boxed(Vec2::ZERO, props.with_proportion(1, 0));
        let c = boxed(Vec2::ZERO, props.with_proportion(2, 0));
        line.add_cell(a.clone());
        line.add_cell(b.clone());
        line.add_cell(c.clone());
        line.layout();

        assert_eq!(a.borrow().size, Vec2::new(100.0, 20.0));
        assert_eq!(b.borrow().offset, Vec2::new(100.0, 0.0));
        assert_eq!(c.borrow().offset, Vec2::new(200.0, 0.0));
        assert_eq!(c.borrow().size, Vec2::new(200.0, 20.0));
        assert_eq!(line.base.current_size, Vec2::new(400.0, 20.0));
        assert_eq!(a.borrow().layout_passes, 1);
    }

    #[test]
    fn test_non_expanded_cell_keeps_its_size_and_aligns() {
        let mut line = LayoutLine::horizontal();
        line.base.current_size = Vec2::new(100.0, 0.0);
        let cell = boxed(
            Vec2::new(20.0, 10.0),
            CellProps::new()
                .with_proportion(1, 0)
                .with_grid_location(GridLocation::BottomRight),
        );
        let tall = boxed(Vec2::new(0.0, 30.0), CellProps::new());
        line.add_cell(cell.clone());
        line.add_cell(tall.clone());
        line.layout();

        assert_eq!(cell.borrow().size, Vec2::new(20.0, 10.0));
        // Slot is 100 wide, the tall column sets the cross size to 30
        assert_eq!(cell.borrow().offset, Vec2::new(80.0, 20.0));
    }

    #[test]
    fn test_margins_with_even_edges() {
        let mut line = LayoutLine::horizontal();
        let props = CellProps::new().with_margin(Vec2::new(10.0, 0.0));
        let a = boxed(Vec2::new(20.0, 5.0), props);
        let b = boxed(Vec2::new(20.0, 5.0), props);
        line.add_cell(a.clone());
        line.add_cell(b.clone());
        line.layout();

        // Full margin at each edge, two half margins in between
        assert_eq!(a.borrow().offset.x, 10.0);
        assert_eq!(b.borrow().offset.x, 40.0);
        assert_eq!(line.base.current_size.x, 70.0);
    }

    #[test]
    fn test_spacer_pushes_cells_apart() {
        let mut line = LayoutLine::horizontal();
        line.base.current_size = Vec2::new(200.0, 0.0);
        let left = boxed(Vec2::new(30.0, 10.0), CellProps::new());
        let right = boxed(Vec2::new(30.0, 10.0), CellProps::new());
        line.add_cell(left.clone());
        line.add_cell(Rc::new(RefCell::new(LayoutSpacer::new())));
        line.add_cell(right.clone());
        line.layout();

        assert_eq!(left.borrow().offset.x, 0.0);
        assert_eq!(right.borrow().offset.x, 170.0);
    }

    #[test]
    fn test_swapped_grid_locations() {
        let mut line = LayoutLine::new();
        line.base.swap_grid_locations = true;
        let wide = boxed(Vec2::new(80.0, 10.0), CellProps::new());
        let narrow = boxed(Vec2::new(20.0, 10.0), CellProps::new());
        line.add_cell(wide.clone());
        line.add_cell(narrow.clone());
        line.layout();

        // TopLeft becomes TopRight on the cross axis of a column
        assert_eq!(narrow.borrow().offset, Vec2::new(60.0, 10.0));
    }

    #[test]
    fn test_nested_line_sizes_from_children() {
        let mut inner = LayoutLine::horizontal();
        inner.add_cell(boxed(Vec2::new(30.0, 10.0), CellProps::new()));
        inner.add_cell(boxed(Vec2::new(40.0, 15.0), CellProps::new().with_min_size(Vec2::new(40.0, 12.0))));

        assert_eq!(inner.cell_size(), Vec2::new(70.0, 15.0));
        assert_eq!(inner.cell_min_size(), Vec2::new(40.0, 12.0));
    }

    #[test]
    fn test_layout_twice_is_stable() {
        let mut line = LayoutLine::horizontal();
        line.base.hard_max_size = Vec2::new(300.0, 100.0);
        let a = boxed(Vec2::ZERO, CellProps::new().with_proportion(1, 0).with_min_size(Vec2::new(10.0, 5.0)).with_expand(true, true));
        let b = boxed(Vec2::ZERO, CellProps::new().with_proportion(1, 0).with_min_size(Vec2::new(390.0, 5.0)).with_expand(true, true));
        line.add_cell(a.clone());
        line.add_cell(b.clone());

        line.layout();
        let first = (a.borrow().offset, a.borrow().size, b.borrow().offset, b.borrow().size);
        line.layout();
        let second = (a.borrow().offset, a.borrow().size, b.borrow().offset, b.borrow().size);
        assert_eq!(first, second);
    }
}
