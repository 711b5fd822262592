//! FILENAME: pivot-table/src/table.rs
//! The virtualized pivot table.
//!
//! `render` materializes the window anchored at a start row/column and
//! serializes it; `update` moves the window by editing the current grid one
//! row or column at a time instead of rebuilding it. Because cell content is
//! a pure function of logical coordinates, both paths produce identical
//! markup for the same window.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use pivot_model::axis::AxisDescriptor;
use pivot_model::layout::{Layout, LegendRegistry};
use pivot_model::response::AggregationResponse;

use crate::builder::GridBuilder;
use crate::cells::{CellType, TableCell, CELL_HEIGHT, CELL_WIDTH};
use crate::error::TableError;
use crate::html::HtmlRenderer;
use crate::lookup::{build_lookups, GridShape, LookupTables};

const DEFAULT_RENDER_WIDTH: u32 = 1920;
const DEFAULT_RENDER_HEIGHT: u32 = 1080;

/// A windowed pivot table over one aggregation result.
pub struct PivotTable {
    layout: Layout,
    response: AggregationResponse,
    row_axis: AxisDescriptor,
    col_axis: AxisDescriptor,
    legends: LegendRegistry,

    shape: GridShape,
    lookups: LookupTables,

    /// Viewport size in pixels.
    render_width: u32,
    render_height: u32,

    /// Current window, in window coordinates (headers included), inclusive.
    row_start: usize,
    row_end: usize,
    column_start: usize,
    column_end: usize,

    /// The materialized window, padding rows/cells included.
    current_table: Vec<Vec<TableCell>>,
    rendered: bool,

    /// Suppresses the click affordance on value cells.
    unclickable: bool,

    /// Element id -> dimension-item ids, rebuilt on every serialization.
    uuid_item_ids: FxHashMap<String, Vec<String>>,

    /// `(sort key, element id)` per sortable header in the latest output.
    sortable_ids: Vec<(String, String)>,
}

impl PivotTable {
    pub fn new(
        layout: Layout,
        mut response: AggregationResponse,
        row_axis: AxisDescriptor,
        col_axis: AxisDescriptor,
        legends: LegendRegistry,
    ) -> Result<Self, TableError> {
        validate_axis("rows", &row_axis)?;
        validate_axis("columns", &col_axis)?;

        let shape = GridShape::new(&layout, &row_axis, &col_axis);
        let lookups = build_lookups(&shape, &row_axis, &col_axis, &response);

        let expected_rows = shape.table_row_size();
        let expected_cols = shape.table_column_size();
        if lookups.row_count() != expected_rows || lookups.column_count() != expected_cols {
            return Err(TableError::LookupShapeMismatch {
                expected_rows,
                expected_cols,
                actual_rows: lookups.row_count(),
                actual_cols: lookups.column_count(),
            });
        }

        // With a single-level row axis the total column orders the table, so
        // each row total is published back into the result under a derived
        // key.
        if row_axis.present && row_axis.dims == 1 {
            for (leaf, ids) in row_axis.leaf_ids.iter().enumerate() {
                if !lookups.is_row_empty(&shape, leaf) {
                    let key = format!("total-{}", ids.key());
                    response.seed_value(key, lookups.row_total(&shape, leaf));
                }
            }
        }

        Ok(PivotTable {
            layout,
            response,
            row_axis,
            col_axis,
            legends,
            shape,
            lookups,
            render_width: DEFAULT_RENDER_WIDTH,
            render_height: DEFAULT_RENDER_HEIGHT,
            row_start: 0,
            row_end: 0,
            column_start: 0,
            column_end: 0,
            current_table: Vec::new(),
            rendered: false,
            unclickable: false,
            uuid_item_ids: FxHashMap::default(),
            sortable_ids: Vec::new(),
        })
    }

    /// Sets the viewport size in pixels. Takes effect on the next `render`
    /// or `update`.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.render_width = width;
        self.render_height = height;
    }

    pub fn set_unclickable(&mut self, unclickable: bool) {
        self.unclickable = unclickable;
    }

    /// Element id -> dimension-item ids for the latest output.
    pub fn uuid_item_ids(&self) -> &FxHashMap<String, Vec<String>> {
        &self.uuid_item_ids
    }

    /// Sortable header handles in the latest output.
    pub fn sortable_ids(&self) -> &[(String, String)] {
        &self.sortable_ids
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn response(&self) -> &AggregationResponse {
        &self.response
    }

    // ========================================================================
    // WINDOW ARITHMETIC
    // ========================================================================

    /// Highest valid window row: header levels plus the logical grid.
    fn max_window_row(&self) -> usize {
        self.col_axis.dims + self.shape.table_row_size() - 1
    }

    fn max_window_column(&self) -> usize {
        self.row_axis.dims + self.shape.table_column_size() - 1
    }

    /// Window rows that fit the viewport height.
    fn window_height(&self) -> usize {
        (self.render_height / CELL_HEIGHT) as usize + 1
    }

    fn window_width(&self) -> usize {
        (self.render_width / CELL_WIDTH) as usize + 1
    }

    fn get_row_end(&self, row_start: usize) -> usize {
        (self.window_height() + row_start).min(self.max_window_row())
    }

    fn get_column_end(&self, column_start: usize) -> usize {
        (self.window_width() + column_start).min(self.max_window_column())
    }

    fn builder(&self) -> GridBuilder<'_> {
        GridBuilder {
            shape: &self.shape,
            row_axis: &self.row_axis,
            col_axis: &self.col_axis,
            lookups: &self.lookups,
            layout: &self.layout,
            response: &self.response,
        }
    }

    // ========================================================================
    // RENDER AND UPDATE
    // ========================================================================

    /// Builds and serializes the window anchored at `(row_start,
    /// column_start)`. Out-of-range anchors clamp to the table edge.
    pub fn render(&mut self, row_start: usize, column_start: usize) -> String {
        self.row_start = row_start.min(self.max_window_row());
        self.column_start = column_start.min(self.max_window_column());
        self.row_end = self.get_row_end(self.row_start);
        self.column_end = self.get_column_end(self.column_start);

        debug!(
            "rendering window rows {}..={} columns {}..={}",
            self.row_start, self.row_end, self.column_start, self.column_end
        );

        self.current_table = self.builder().build_table(
            self.row_start,
            self.row_end,
            self.column_start,
            self.column_end,
        );
        self.add_padding_cells();
        self.rendered = true;

        self.apply_visibility_passes();
        self.serialize()
    }

    /// Moves the window by editing the current grid, then serializes it.
    /// Falls back to a full render when no window has been rendered yet.
    pub fn update(&mut self, column_start: usize, row_start: usize) -> String {
        if !self.rendered {
            warn!("update requested before first render, rendering instead");
            return self.render(row_start, column_start);
        }

        let row_start = row_start.min(self.max_window_row());
        let column_start = column_start.min(self.max_window_column());
        let row_end = self.get_row_end(row_start);
        let column_end = self.get_column_end(column_start);

        let steps = self.row_start.abs_diff(row_start) + self.column_start.abs_diff(column_start);
        debug!(
            "updating window to rows {}..={} columns {}..={} in {} steps",
            row_start, row_end, column_start, column_end, steps
        );
        for _ in 0..steps {
            self.apply_changes(column_start, column_end, row_start, row_end);
        }

        self.update_padding_cells();
        self.apply_visibility_passes();
        self.serialize()
    }

    fn apply_visibility_passes(&mut self) {
        if self.layout.hide_empty_rows && self.row_axis.present && self.col_axis.present {
            self.hide_empty_rows();
        }
        if self.layout.hide_empty_columns && self.row_axis.present && self.col_axis.present {
            self.hide_empty_columns();
        }
        self.update_column_axis_dimension_span();
        self.update_row_axis_dimension_span();
    }

    fn serialize(&mut self) -> String {
        self.collect_uuid_item_ids();

        let span = self.current_table.get(1).map(|row| row.len()).unwrap_or(0);
        let top_bar_span = self.top_bar_span(span);

        let mut sortables = Vec::new();
        let renderer = HtmlRenderer {
            layout: &self.layout,
            legends: &self.legends,
            response: &self.response,
            unclickable: self.unclickable,
        };
        let html = renderer.render_table(&self.current_table, top_bar_span, &mut sortables);
        self.sortable_ids = sortables;
        html
    }

    fn collect_uuid_item_ids(&mut self) {
        self.uuid_item_ids.clear();
        for row in &self.current_table {
            for cell in row {
                if cell.cell_type == CellType::Value {
                    if let Some(uuid) = &cell.uuid {
                        self.uuid_item_ids.insert(uuid.clone(), cell.item_ids.clone());
                    }
                }
            }
        }
    }

    fn top_bar_span(&self, span: usize) -> usize {
        let row_dims = self.row_axis.dims;
        if !self.layout.show_dimension_labels {
            if !self.col_axis.present && self.row_axis.present {
                return row_dims + 1;
            }
            if self.col_axis.present && self.row_axis.present {
                return span + if row_dims > 1 { row_dims - 1 } else { row_dims };
            }
        }
        span
    }

    // ========================================================================
    // INCREMENTAL WINDOW EDITS
    // ========================================================================

    /// Moves each window edge at most one step towards its target. Grow
    /// edits run before shrink edits so spans never clip against a window
    /// smaller than either the old or the new one.
    fn apply_changes(
        &mut self,
        column_start: usize,
        column_end: usize,
        row_start: usize,
        row_end: usize,
    ) {
        if self.column_start > column_start {
            self.column_start -= 1;
            self.prepend_table_column();
        }

        if self.column_end < column_end {
            self.column_end += 1;
            self.append_table_column();
        }

        if self.row_start > row_start {
            self.row_start -= 1;
            self.prepend_table_row();
        }

        if self.row_end < row_end {
            self.row_end += 1;
            self.append_table_row();
        }

        if self.row_start < row_start {
            self.row_start += 1;
            self.delete_top_row();
        }

        if self.row_end > row_end {
            self.row_end -= 1;
            self.delete_bottom_row();
        }

        if self.column_start < column_start {
            self.column_start += 1;
            self.delete_left_column();
        }

        if self.column_end > column_end {
            self.column_end -= 1;
            self.delete_right_column();
        }
    }

    fn prepend_table_column(&mut self) {
        let column =
            self.builder()
                .build_table_column(self.column_start, self.row_start, self.row_end);
        for (i, cell) in column.into_iter().enumerate() {
            self.current_table[i + 1].insert(1, cell);
        }
    }

    fn append_table_column(&mut self) {
        let column =
            self.builder()
                .build_table_column(self.column_end, self.row_start, self.row_end);
        for (i, cell) in column.into_iter().enumerate() {
            let row = &mut self.current_table[i + 1];
            let at = row.len() - 1;
            row.insert(at, cell);
        }
    }

    fn prepend_table_row(&mut self) {
        let mut row =
            self.builder()
                .build_table_row(self.row_start, self.column_start, self.column_end);
        self.add_row_padding(&mut row);
        self.current_table.insert(1, row);
    }

    fn append_table_row(&mut self) {
        let mut row =
            self.builder()
                .build_table_row(self.row_end, self.column_start, self.column_end);
        self.add_row_padding(&mut row);
        let at = self.current_table.len() - 1;
        self.current_table.insert(at, row);
    }

    fn delete_top_row(&mut self) {
        self.current_table.remove(1);
    }

    fn delete_bottom_row(&mut self) {
        let at = self.current_table.len() - 2;
        self.current_table.remove(at);
    }

    fn delete_left_column(&mut self) {
        let last = self.current_table.len() - 1;
        for row in &mut self.current_table[1..last] {
            row.remove(1);
        }
    }

    fn delete_right_column(&mut self) {
        let last = self.current_table.len() - 1;
        for row in &mut self.current_table[1..last] {
            let at = row.len() - 2;
            row.remove(at);
        }
    }

    // ========================================================================
    // PADDING
    // ========================================================================

    fn left_padding(&self) -> u32 {
        self.column_start as u32 * CELL_WIDTH
    }

    fn top_padding(&self) -> u32 {
        self.row_start as u32 * CELL_HEIGHT
    }

    fn right_padding(&self) -> u32 {
        (self.max_window_column() - self.column_end) as u32 * CELL_WIDTH
    }

    fn bottom_padding(&self) -> u32 {
        (self.max_window_row() - self.row_end) as u32 * CELL_HEIGHT
    }

    fn add_row_padding(&self, row: &mut Vec<TableCell>) {
        row.insert(0, TableCell::padding(self.left_padding(), CELL_HEIGHT, 1, 1));
        row.push(TableCell::padding(self.right_padding(), CELL_HEIGHT, 1, 1));
    }

    /// Wraps the freshly built window in padding cells standing in for the
    /// off-window area.
    fn add_padding_cells(&mut self) {
        let window_columns = self.column_end - self.column_start + 1;
        let left = self.left_padding();
        let right = self.right_padding();

        for row in &mut self.current_table {
            row.insert(0, TableCell::padding(left, CELL_HEIGHT, 1, 1));
            row.push(TableCell::padding(right, CELL_HEIGHT, 1, 1));
        }

        let top = TableCell::padding(CELL_WIDTH, self.top_padding(), window_columns, 1);
        let bottom = TableCell::padding(CELL_WIDTH, self.bottom_padding(), window_columns, 1);
        self.current_table.insert(0, vec![top]);
        self.current_table.push(vec![bottom]);
    }

    fn update_padding_cells(&mut self) {
        let top = self.top_padding();
        let bottom = self.bottom_padding();
        let left = self.left_padding();
        let right = self.right_padding();
        let last = self.current_table.len() - 1;

        // The window narrows when an edge clamps against the table, so the
        // spanning padding rows track the current column count.
        let window_columns = self.column_end - self.column_start + 1;

        self.current_table[0][0].height = top;
        self.current_table[0][0].col_span = window_columns;
        self.current_table[0][0].hidden = top == 0;

        self.current_table[last][0].height = bottom;
        self.current_table[last][0].col_span = window_columns;
        self.current_table[last][0].hidden = bottom == 0;

        for row in &mut self.current_table[1..last] {
            row[0].width = left;
            row[0].hidden = left == 0;

            let end = row.len() - 1;
            row[end].width = right;
            row[end].hidden = right == 0;
        }
    }

    // ========================================================================
    // EMPTY HIDING
    // ========================================================================

    /// Collapses every window row whose grand total is non-positive, and
    /// removes its leaf from the row axis so ancestor spans shrink.
    fn hide_empty_rows(&mut self) {
        let col_dims = self.col_axis.dims;
        let row_dims = self.row_axis.dims;
        let last = self.current_table.len() - 1;

        for r in 1..last {
            let w = self.row_start + r - 1;
            if w < col_dims {
                continue;
            }
            let y = w - col_dims;
            if !self.lookups.is_row_empty(&self.shape, y) {
                continue;
            }

            if self.column_start < row_dims {
                let leaf_col = row_dims - self.column_start;
                if let Some(node) = self.current_table[r].get(leaf_col).and_then(|c| c.node) {
                    self.row_axis.reduce(node);
                }
            }

            let row = &mut self.current_table[r];
            let end = row.len() - 1;
            for cell in &mut row[1..end] {
                cell.collapsed = true;
            }
        }
    }

    fn hide_empty_columns(&mut self) {
        let col_dims = self.col_axis.dims;
        let row_dims = self.row_axis.dims;
        let last = self.current_table.len() - 1;
        let row_len = match self.current_table.get(1) {
            Some(row) => row.len(),
            None => return,
        };

        for c in 1..row_len - 1 {
            let w = self.column_start + c - 1;
            if w < row_dims {
                continue;
            }
            let x = w - row_dims;
            if !self.lookups.is_column_empty(&self.shape, x) {
                continue;
            }

            if self.row_start < col_dims {
                let leaf_row = col_dims - self.row_start;
                if let Some(node) = self
                    .current_table
                    .get(leaf_row)
                    .and_then(|row| row.get(c))
                    .and_then(|cell| cell.node)
                {
                    self.col_axis.reduce(node);
                }
            }

            for row in &mut self.current_table[1..last] {
                row[c].collapsed = true;
            }
        }
    }

    // ========================================================================
    // SPAN ADJUSTMENT
    // ========================================================================

    /// Remaining leaf span of an axis header cell after empty hiding.
    fn adjusted_span(axis: &AxisDescriptor, cell: &TableCell, level: usize, original: usize) -> usize {
        if let Some(node_id) = cell.node {
            let node = axis.node(node_id);
            if node.children > 0 && level + 1 < axis.spans.len() {
                let offset = cell
                    .leaf
                    .map(|leaf| leaf.saturating_sub(node.leaf_start))
                    .unwrap_or(0);
                return (node.children * axis.spans[level + 1]).saturating_sub(offset);
            }
        }
        original
    }

    /// Whether a header cell stays hidden at table position `(i, j)`, where
    /// `i` indexes along the axis depth and `j` along the scan direction.
    fn axis_hidden(cell: &TableCell, i: usize, j: usize) -> bool {
        match cell.cell_type {
            CellType::DimensionLabel => false,
            CellType::RowAxis | CellType::ColumnAxis => !(cell.oldest || j == 1),
            CellType::DimensionSubtotal | CellType::DimensionGrandTotal => i != 1,
            _ => !(i == 1 && j == 1),
        }
    }

    /// Rewrites row spans in the row-axis header columns so every column
    /// sums to the window height, clipping runs that extend past the window.
    fn update_row_axis_dimension_span(&mut self) {
        let row_span_limit = self.row_end - self.row_start + 1;
        let last = self.current_table.len() - 1;
        // The axis can be deeper than the materialized window.
        let row_len = self.current_table.get(1).map(|row| row.len()).unwrap_or(0);
        let visible_dims = self
            .row_axis
            .dims
            .saturating_sub(self.column_start)
            .min(row_len.saturating_sub(2));

        for i in 1..=visible_dims {
            let level = self.column_start + i - 1;
            let mut span_counter = 0usize;

            for j in 1..last {
                let header_rows = self.col_axis.dims.saturating_sub(self.row_start);
                let cell_is_empty_corner = {
                    let cell = &self.current_table[j][i];
                    j == 1 && cell.cell_type == CellType::DimensionEmpty
                };

                let cell = &mut self.current_table[j][i];
                if cell.collapsed {
                    continue;
                }

                cell.row_span =
                    Self::adjusted_span(&self.row_axis, cell, level, cell.row_span);
                cell.hidden = Self::axis_hidden(cell, i, j);

                if cell_is_empty_corner {
                    span_counter += header_rows;
                    continue;
                }

                if span_counter >= row_span_limit || cell.hidden {
                    cell.hidden = true;
                    continue;
                }

                if cell.row_span + span_counter > row_span_limit {
                    cell.row_span = row_span_limit - span_counter;
                }

                span_counter += cell.row_span;
            }
        }
    }

    fn update_column_axis_dimension_span(&mut self) {
        let col_span_limit = self.column_end - self.column_start + 1;
        // The axis can be deeper than the materialized window.
        let visible_dims = self
            .col_axis
            .dims
            .saturating_sub(self.row_start)
            .min(self.current_table.len().saturating_sub(2));
        let header_columns = self.row_axis.dims.saturating_sub(self.column_start);

        for i in 1..=visible_dims {
            let level = self.row_start + i - 1;
            let mut span_counter = 0usize;
            let row_len = self.current_table[i].len();

            for j in 1..row_len - 1 {
                let cell_is_empty_corner = {
                    let cell = &self.current_table[i][j];
                    j == 1 && cell.cell_type == CellType::DimensionEmpty
                };

                let cell = &mut self.current_table[i][j];
                if cell.collapsed {
                    continue;
                }

                cell.col_span =
                    Self::adjusted_span(&self.col_axis, cell, level, cell.col_span);
                cell.hidden = Self::axis_hidden(cell, i, j);

                if cell_is_empty_corner {
                    span_counter += header_columns;
                    continue;
                }

                if span_counter >= col_span_limit || cell.hidden {
                    cell.hidden = true;
                    continue;
                }

                if cell.col_span + span_counter > col_span_limit {
                    cell.col_span = col_span_limit - span_counter;
                }

                span_counter += cell.col_span;
            }
        }
    }
}

fn validate_axis(name: &'static str, axis: &AxisDescriptor) -> Result<(), TableError> {
    if !axis.present {
        return Ok(());
    }

    let actual_levels = axis.node_table.len();
    let actual_leaves = axis.node_table.first().map(|row| row.len()).unwrap_or(0);
    if actual_levels != axis.dims
        || axis.node_table.iter().any(|row| row.len() != axis.leaf_count)
    {
        return Err(TableError::AxisShapeMismatch {
            axis: name,
            expected_levels: axis.dims,
            expected_leaves: axis.leaf_count,
            actual_levels,
            actual_leaves,
        });
    }

    if axis.leaf_ids.len() != axis.leaf_count {
        return Err(TableError::AxisLeafIdMismatch {
            axis: name,
            leaves: axis.leaf_count,
            leaf_ids: axis.leaf_ids.len(),
        });
    }

    Ok(())
}
