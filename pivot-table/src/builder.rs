//! FILENAME: pivot-table/src/builder.rs
//! Windowed grid composition.
//!
//! The builder assembles any rectangular window of the full table, header
//! rows/columns included, one row or one column at a time. Window coordinates
//! cover the whole table: window row `w < col_axis.dims` is column-header
//! level `w`, anything after is logical grid row `w - col_axis.dims`; window
//! columns mirror this with the row axis.
//!
//! Cell content is a pure function of logical coordinates, so a window built
//! here and a window reached by incremental edits hold equal cells. Initial
//! hidden flags only need to be right within the built slice; the
//! span-adjustment pass over the assembled table settles final visibility.

use pivot_model::axis::AxisDescriptor;
use pivot_model::layout::{Layout, NumberType};
use pivot_model::response::AggregationResponse;

use crate::cells::{percentage_html, TableCell};
use crate::lookup::{leaf_id_combination, GridShape, LookupTables, ValueType};

pub(crate) struct GridBuilder<'a> {
    pub shape: &'a GridShape,
    pub row_axis: &'a AxisDescriptor,
    pub col_axis: &'a AxisDescriptor,
    pub lookups: &'a LookupTables,
    pub layout: &'a Layout,
    pub response: &'a AggregationResponse,
}

impl<'a> GridBuilder<'a> {
    /// Whether column headers carry sort handles. Only meaningful with a
    /// single-level row axis, where one header column orders the whole table.
    pub fn sortable_column_headers(&self) -> bool {
        self.row_axis.present && self.row_axis.dims == 1
    }

    // ========================================================================
    // VALUE CELLS
    // ========================================================================

    /// The cell at logical grid position `(x, y)`.
    pub fn get_value_cell(&self, x: usize, y: usize) -> TableCell {
        let value = self.lookups.values[y][x];
        let mut cell = match self.lookups.types[y][x] {
            ValueType::Value => {
                let leaf_row = self.shape.leaf_row_index(y);
                let leaf_col = self.shape.leaf_column_index(x);
                let ids =
                    leaf_id_combination(self.row_axis, self.col_axis, leaf_row, leaf_col);
                TableCell::value_cell(value, &ids, y, x)
            }
            ValueType::RowSubtotal
            | ValueType::ColumnSubtotal
            | ValueType::IntersectSubtotal => TableCell::value_sub_total(value),
            ValueType::RowTotal | ValueType::ColumnTotal | ValueType::IntersectTotal => {
                TableCell::value_grand_total(value)
            }
        };
        self.apply_percentage(&mut cell, x, y);
        cell
    }

    /// Rewrites a value cell's content as a share of its row or column total.
    /// Applied per cell so incremental edits agree with full renders.
    fn apply_percentage(&self, cell: &mut TableCell, x: usize, y: usize) {
        let total = match self.layout.number_type {
            NumberType::None => return,
            NumberType::PercentOfRow => {
                if !self.shape.row_totals {
                    return;
                }
                self.lookups.row_total(self.shape, y)
            }
            NumberType::PercentOfColumn => {
                if !self.shape.col_totals {
                    return;
                }
                self.lookups.column_total(self.shape, x)
            }
        };

        if !cell.empty {
            cell.html_value = percentage_html(cell.value, total);
        }
        if total == 0.0 {
            cell.empty = true;
            cell.html_value = "&nbsp;".to_string();
        }
    }

    pub fn build_value_row(
        &self,
        y: usize,
        column_start: usize,
        column_end: usize,
    ) -> Vec<TableCell> {
        (column_start..=column_end)
            .map(|x| self.get_value_cell(x, y))
            .collect()
    }

    pub fn build_value_column(
        &self,
        x: usize,
        row_start: usize,
        row_end: usize,
    ) -> Vec<TableCell> {
        (row_start..=row_end)
            .map(|y| self.get_value_cell(x, y))
            .collect()
    }

    // ========================================================================
    // CORNER BLOCK
    // ========================================================================

    /// One row of the corner block, for window columns
    /// `column_start..row_axis.dims` at header level `level`.
    pub fn build_corner_axis_row(&self, level: usize, column_start: usize) -> Vec<TableCell> {
        let row_dims = self.row_axis.dims.max(1);
        let col_dims = self.col_axis.dims.max(1);

        if !self.layout.show_dimension_labels {
            return (column_start..row_dims)
                .map(|x| {
                    TableCell::dimension_empty(row_dims - x, col_dims - level, x != column_start)
                })
                .collect();
        }

        let mut row = Vec::with_capacity(row_dims - column_start);
        if level + 1 == col_dims {
            // Bottom corner row: row-dimension names, with the shared corner
            // cell labelled "rows / columns".
            for x in column_start..row_dims {
                if x + 1 == row_dims {
                    row.push(TableCell::dimension_label(&self.corner_label()));
                } else {
                    row.push(TableCell::dimension_label(self.row_dimension_label(x)));
                }
            }
        } else {
            for x in column_start..row_dims {
                if x + 1 == row_dims {
                    row.push(TableCell::dimension_label(self.col_dimension_label(level)));
                } else {
                    row.push(TableCell::dimension_label("&nbsp;"));
                }
            }
        }
        row
    }

    /// One column of the corner block, for header levels
    /// `row_start..col_axis.dims` at window column `column`.
    pub fn build_corner_axis_column(&self, column: usize, row_start: usize) -> Vec<TableCell> {
        let row_dims = self.row_axis.dims.max(1);
        let col_dims = self.col_axis.dims.max(1);

        if !self.layout.show_dimension_labels {
            return (row_start..col_dims)
                .map(|y| {
                    TableCell::dimension_empty(row_dims - column, col_dims - y, y != row_start)
                })
                .collect();
        }

        let mut cells = Vec::with_capacity(col_dims - row_start);
        if column + 1 == row_dims {
            for y in row_start..col_dims {
                if y + 1 == col_dims {
                    cells.push(TableCell::dimension_label(&self.corner_label()));
                } else {
                    cells.push(TableCell::dimension_label(self.col_dimension_label(y)));
                }
            }
        } else {
            for y in row_start..col_dims {
                if y + 1 == col_dims {
                    cells.push(TableCell::dimension_label(self.row_dimension_label(column)));
                } else {
                    cells.push(TableCell::dimension_label("&nbsp;"));
                }
            }
        }
        cells
    }

    fn row_dimension_label(&self, level: usize) -> &str {
        self.row_axis
            .dimension_names
            .get(level)
            .map(|id| self.response.get_name_by_id(id))
            .unwrap_or("")
    }

    fn col_dimension_label(&self, level: usize) -> &str {
        self.col_axis
            .dimension_names
            .get(level)
            .map(|id| self.response.get_name_by_id(id))
            .unwrap_or("")
    }

    /// Label of the cell shared by both axes: "rows / columns".
    fn corner_label(&self) -> String {
        let row_label = if self.row_axis.present {
            self.row_dimension_label(self.row_axis.dims - 1)
        } else {
            ""
        };
        let col_label = if self.col_axis.present {
            self.col_dimension_label(self.col_axis.dims - 1)
        } else {
            ""
        };
        if col_label.is_empty() {
            row_label.to_string()
        } else if row_label.is_empty() {
            col_label.to_string()
        } else {
            format!("{}&nbsp;/&nbsp;{}", row_label, col_label)
        }
    }

    // ========================================================================
    // COLUMN AXIS
    // ========================================================================

    /// One header row of the column axis, for window columns
    /// `column_start..column_end` (exclusive) at level `level`.
    pub fn build_column_axis_row(
        &self,
        level: usize,
        column_start: usize,
        column_end: usize,
    ) -> Vec<TableCell> {
        let row_dims = self.row_axis.dims.max(1);
        let mut row = Vec::with_capacity(column_end.saturating_sub(column_start));

        let mut window_col = column_start;
        if window_col < row_dims {
            row.extend(self.build_corner_axis_row(level, window_col));
            window_col = row_dims;
        }

        let mut first = true;
        for w in window_col..column_end {
            let x = w - row_dims;
            row.push(self.column_header_cell(level, x, first));
            first = false;
        }
        // A narrow window can end inside the corner block.
        row.truncate(column_end - column_start);
        row
    }

    /// One column of the column-axis header block, for header levels
    /// `row_start..col_axis.dims` at window column `column`.
    pub fn build_column_axis_column(&self, column: usize, row_start: usize) -> Vec<TableCell> {
        let row_dims = self.row_axis.dims.max(1);
        let col_dims = self.col_axis.dims;
        if row_start >= col_dims {
            return Vec::new();
        }

        if column < row_dims {
            return self.build_corner_axis_column(column, row_start);
        }

        let x = column - row_dims;
        let mut first = true;
        (row_start..col_dims)
            .map(|level| {
                let cell = self.column_header_cell(level, x, first);
                first = false;
                cell
            })
            .collect()
    }

    /// The column-axis header cell at `(level, logical column x)`. `first`
    /// marks the leading cell of the built slice.
    fn column_header_cell(&self, level: usize, x: usize, first: bool) -> TableCell {
        let col_dims = self.col_axis.dims;

        if self.shape.is_column_sub_total(x) {
            return TableCell::dimension_sub_total(1, col_dims - level, true, !first);
        }

        if self.shape.is_column_grand_total(x) {
            // The label lives at the outermost level; deeper levels under the
            // total column are filler.
            if level == 0 {
                return TableCell::dimension_grand_total(
                    "Total",
                    1,
                    col_dims,
                    self.sortable_column_headers(),
                );
            }
            return TableCell::dimension_sub_total(1, col_dims - level, true, true);
        }

        let leaf = self.shape.leaf_column_index(x);
        let node = match self.col_axis.node_at(level, leaf) {
            Some(node) => node,
            None => return TableCell::dimension_empty(1, 1, true),
        };
        let oldest = self.col_axis.node(node).leaf_start == leaf;
        let name = self
            .response
            .get_item_name(&self.col_axis.node(node).id, self.layout.show_hierarchy);

        let sort = if self.sortable_column_headers() && level + 1 == col_dims {
            Some(self.col_axis.leaf_ids[leaf].key())
        } else {
            None
        };

        TableCell::column_axis(
            node,
            level,
            leaf,
            self.col_axis.node(node).span,
            name,
            oldest,
            sort,
        )
    }

    // ========================================================================
    // ROW AXIS
    // ========================================================================

    /// The row-axis header cells of logical grid row `y`, for window columns
    /// `column_start..row_axis.dims`.
    pub fn build_row_axis_row(&self, y: usize, column_start: usize) -> Vec<TableCell> {
        let row_dims = self.row_axis.dims;
        if column_start >= row_dims {
            return Vec::new();
        }

        let mut first = true;
        (column_start..row_dims)
            .map(|level| {
                let cell = self.row_header_cell(level, y, first);
                first = false;
                cell
            })
            .collect()
    }

    /// One column of the row-axis header block, for logical grid rows
    /// `row_start..=row_end` at header column `level`.
    pub fn build_row_axis_column(
        &self,
        level: usize,
        row_start: usize,
        row_end: usize,
    ) -> Vec<TableCell> {
        let mut first = true;
        (row_start..=row_end)
            .map(|y| {
                let cell = self.row_header_cell(level, y, first);
                first = false;
                cell
            })
            .collect()
    }

    /// The row-axis header cell at `(header column level, logical row y)`.
    fn row_header_cell(&self, level: usize, y: usize, first: bool) -> TableCell {
        let row_dims = self.row_axis.dims;

        if self.shape.is_row_sub_total(y) {
            return TableCell::dimension_sub_total(row_dims - level, 1, true, !first);
        }

        if self.shape.is_row_grand_total(y) {
            if level == 0 {
                return TableCell::dimension_grand_total("Total", row_dims, 1, false);
            }
            return TableCell::dimension_sub_total(row_dims - level, 1, true, true);
        }

        let leaf = self.shape.leaf_row_index(y);
        let node = match self.row_axis.node_at(level, leaf) {
            Some(node) => node,
            None => return TableCell::dimension_empty(1, 1, true),
        };
        let oldest = self.row_axis.node(node).leaf_start == leaf;
        let name = self
            .response
            .get_item_name(&self.row_axis.node(node).id, self.layout.show_hierarchy);

        TableCell::row_axis(
            node,
            level,
            leaf,
            self.row_axis.node(node).span,
            name,
            oldest,
        )
    }

    // ========================================================================
    // WHOLE ROWS, COLUMNS AND WINDOWS
    // ========================================================================

    /// One full table row at window row `w`, covering window columns
    /// `column_start..=column_end`.
    pub fn build_table_row(
        &self,
        w: usize,
        column_start: usize,
        column_end: usize,
    ) -> Vec<TableCell> {
        let col_dims = self.col_axis.dims;
        let row_dims = self.row_axis.dims;

        if w < col_dims {
            return self.build_column_axis_row(w, column_start, column_end + 1);
        }

        let y = w - col_dims;
        let mut row = if column_start < row_dims {
            self.build_row_axis_row(y, column_start)
        } else {
            Vec::new()
        };
        // A narrow window can end inside the header block.
        row.truncate(column_end - column_start + 1);

        if column_end >= row_dims {
            let x0 = column_start.saturating_sub(row_dims);
            row.extend(self.build_value_row(y, x0, column_end - row_dims));
        }
        row
    }

    /// One full table column at window column `w`, covering window rows
    /// `row_start..=row_end`.
    pub fn build_table_column(
        &self,
        w: usize,
        row_start: usize,
        row_end: usize,
    ) -> Vec<TableCell> {
        let col_dims = self.col_axis.dims;
        let row_dims = self.row_axis.dims;

        let mut column = if row_start < col_dims {
            self.build_column_axis_column(w, row_start)
        } else {
            Vec::new()
        };
        // A short window can end inside the header block.
        column.truncate(row_end - row_start + 1);

        if row_end >= col_dims {
            let y0 = row_start.saturating_sub(col_dims);
            if w < row_dims {
                column.extend(self.build_row_axis_column(w, y0, row_end - col_dims));
            } else {
                column.extend(self.build_value_column(w - row_dims, y0, row_end - col_dims));
            }
        }
        column
    }

    /// The full window `rows row_start..=row_end x columns
    /// column_start..=column_end`, in window coordinates.
    pub fn build_table(
        &self,
        row_start: usize,
        row_end: usize,
        column_start: usize,
        column_end: usize,
    ) -> Vec<Vec<TableCell>> {
        (row_start..=row_end)
            .map(|w| self.build_table_row(w, column_start, column_end))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellType;
    use crate::lookup::build_lookups;
    use pivot_model::axis::AxisDescriptor;
    use pivot_model::layout::Layout;
    use pivot_model::response::AggregationResponse;

    struct Fixture {
        shape: GridShape,
        row_axis: AxisDescriptor,
        col_axis: AxisDescriptor,
        lookups: LookupTables,
        layout: Layout,
        response: AggregationResponse,
    }

    impl Fixture {
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
    }

    fn create_test_fixture(layout: Layout) -> Fixture {
        let row_axis = AxisDescriptor::from_leaf_paths(
            vec!["dim_row".to_string()],
            &[vec!["r1"], vec!["r2"]],
        );
        let col_axis = AxisDescriptor::from_leaf_paths(
            vec!["dim_col".to_string()],
            &[vec!["c1"], vec!["c2"], vec!["c3"]],
        );
        let mut response = AggregationResponse::new();
        for (key, value) in [
            ("c1-r1", 1.0),
            ("c2-r1", 2.0),
            ("c3-r1", 3.0),
            ("c1-r2", 4.0),
            ("c2-r2", 5.0),
            ("c3-r2", 6.0),
        ] {
            response.seed_value(key, value);
        }
        response.set_name("r1", "North");
        response.set_name("r2", "South");
        response.set_name("c1", "Jan");
        response.set_name("c2", "Feb");
        response.set_name("c3", "Mar");

        let shape = GridShape::new(&layout, &row_axis, &col_axis);
        let lookups = build_lookups(&shape, &row_axis, &col_axis, &response);
        Fixture { shape, row_axis, col_axis, lookups, layout, response }
    }

    #[test]
    fn test_full_window_shape() {
        let fixture = create_test_fixture(Layout::default());
        let builder = fixture.builder();

        // 1 header row + 2 leaf rows + 1 total row; 1 header column +
        // 3 leaf columns + 1 total column.
        let table = builder.build_table(0, 3, 0, 4);
        assert_eq!(table.len(), 4);
        assert!(table.iter().all(|row| row.len() == 5));

        assert_eq!(table[0][0].cell_type, CellType::DimensionEmpty);
        assert_eq!(table[0][1].cell_type, CellType::ColumnAxis);
        assert_eq!(table[0][1].html_value, "Jan");
        assert_eq!(table[0][4].cell_type, CellType::DimensionGrandTotal);
        assert_eq!(table[1][0].html_value, "North");
        assert_eq!(table[1][1].value, 1.0);
        assert_eq!(table[3][0].cell_type, CellType::DimensionGrandTotal);
        assert_eq!(table[3][4].cell_type, CellType::ValueGrandTotal);
        assert_eq!(table[3][4].value, 21.0);
    }

    #[test]
    fn test_row_and_column_composition_agree() {
        let fixture = create_test_fixture(Layout::default());
        let builder = fixture.builder();

        let by_rows = builder.build_table(0, 3, 0, 4);
        for w in 0..=4usize {
            let column = builder.build_table_column(w, 0, 3);
            for (r, cell) in column.iter().enumerate() {
                assert_eq!(
                    cell.html_value, by_rows[r][w].html_value,
                    "window column {} row {}",
                    w, r
                );
                assert_eq!(cell.cell_type, by_rows[r][w].cell_type);
            }
        }
    }

    #[test]
    fn test_partial_window_matches_full_window() {
        let fixture = create_test_fixture(Layout::default());
        let builder = fixture.builder();

        let full = builder.build_table(0, 3, 0, 4);
        let partial = builder.build_table(1, 2, 2, 4);

        for (i, row) in partial.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                let reference = &full[i + 1][j + 2];
                assert_eq!(cell.html_value, reference.html_value);
                assert_eq!(cell.value, reference.value);
                assert_eq!(cell.uuid, reference.uuid);
            }
        }
    }

    #[test]
    fn test_row_percentage() {
        let mut layout = Layout::default();
        layout.number_type = NumberType::PercentOfRow;
        let fixture = create_test_fixture(layout);
        let builder = fixture.builder();

        // Row 0 totals 6: 1, 2, 3 -> 16.67%, 33.33%, 50%.
        assert_eq!(builder.get_value_cell(0, 0).html_value, "16.67%");
        assert_eq!(builder.get_value_cell(1, 0).html_value, "33.33%");
        assert_eq!(builder.get_value_cell(2, 0).html_value, "50%");
        assert_eq!(builder.get_value_cell(3, 0).html_value, "100%");
    }

    #[test]
    fn test_sortable_headers_single_level_row_axis() {
        let fixture = create_test_fixture(Layout::default());
        let builder = fixture.builder();
        assert!(builder.sortable_column_headers());

        let header = builder.build_column_axis_row(0, 0, 5);
        assert_eq!(header[1].sort.as_deref(), Some("c1"));
        assert_eq!(header[3].sort.as_deref(), Some("c3"));
        assert_eq!(header[4].sort.as_deref(), Some("total"));
    }

    #[test]
    fn test_dimension_labels_in_corner() {
        let mut layout = Layout::default();
        layout.show_dimension_labels = true;
        let mut fixture = create_test_fixture(layout);
        fixture.response.set_name("dim_row", "Region");
        fixture.response.set_name("dim_col", "Month");
        let builder = fixture.builder();

        let corner = builder.build_corner_axis_row(0, 0);
        assert_eq!(corner.len(), 1);
        assert_eq!(corner[0].cell_type, CellType::DimensionLabel);
        assert_eq!(corner[0].html_value, "Region&nbsp;/&nbsp;Month");
    }
}
