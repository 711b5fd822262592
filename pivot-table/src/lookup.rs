//! FILENAME: pivot-table/src/lookup.rs
//! Dense value/type lookup matrices over the logical grid.
//!
//! The logical grid is the full table including subtotal and grand-total
//! rows/columns, independent of what is visible. One pass over the leaf
//! coordinates fills the value lookup: each leaf value lands in its own cell
//! and is accumulated into at most seven aggregate targets (row/column
//! subtotal, row/column grand total, and their intersections). A second,
//! value-independent pass classifies every coordinate.

use serde::{Deserialize, Serialize};

use pivot_model::axis::AxisDescriptor;
use pivot_model::key::IdCombination;
use pivot_model::layout::Layout;
use pivot_model::response::{parse_value, AggregationResponse};

/// Sentinel stored at leaf coordinates whose id-combination is absent from
/// the result. Distinct from an explicit zero; normalized away when the cell
/// is created. Absent leaves contribute 0 to every aggregate.
pub const EMPTY_VALUE: f64 = -1.0;

/// Classification of a logical-grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValueType {
    #[default]
    Value,
    RowSubtotal,
    ColumnSubtotal,
    RowTotal,
    ColumnTotal,
    IntersectSubtotal,
    IntersectTotal,
}

// ============================================================================
// GRID SHAPE
// ============================================================================

/// Sizing and index arithmetic for the logical grid.
///
/// Subtotal flags follow the axis they cut across: `col_sub_totals` inserts
/// subtotal *rows* (spaced by the row axis' unique factor), `row_sub_totals`
/// inserts subtotal *columns*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub row_leaf_count: usize,
    pub col_leaf_count: usize,
    pub row_unique_factor: usize,
    pub col_unique_factor: usize,

    /// Header column count contributed by the row axis.
    pub row_axis_dims: usize,

    /// Header row count contributed by the column axis.
    pub col_axis_dims: usize,

    pub col_sub_totals: bool,
    pub row_sub_totals: bool,
    pub col_totals: bool,
    pub row_totals: bool,
}

impl GridShape {
    pub fn new(layout: &Layout, row_axis: &AxisDescriptor, col_axis: &AxisDescriptor) -> Self {
        GridShape {
            row_leaf_count: row_axis.leaf_count,
            col_leaf_count: col_axis.leaf_count,
            row_unique_factor: row_axis.unique_factor.max(1),
            col_unique_factor: col_axis.unique_factor.max(1),
            row_axis_dims: row_axis.dims,
            col_axis_dims: col_axis.dims,
            col_sub_totals: layout.show_col_sub_totals && row_axis.present && row_axis.dims > 1,
            row_sub_totals: layout.show_row_sub_totals && col_axis.present && col_axis.dims > 1,
            col_totals: layout.show_col_totals,
            row_totals: layout.show_row_totals,
        }
    }

    /// Logical grid height: leaves plus subtotal rows plus the total row.
    pub fn table_row_size(&self) -> usize {
        let mut size = self.row_leaf_count;
        if self.col_sub_totals {
            size += self.row_leaf_count / self.row_unique_factor;
        }
        if self.col_totals {
            size += 1;
        }
        size
    }

    /// Logical grid width: leaves plus subtotal columns plus the total column.
    pub fn table_column_size(&self) -> usize {
        let mut size = self.col_leaf_count;
        if self.row_sub_totals {
            size += self.col_leaf_count / self.col_unique_factor;
        }
        if self.row_totals {
            size += 1;
        }
        size
    }

    pub fn is_row_sub_total(&self, row: usize) -> bool {
        self.col_sub_totals && (row + 1) % (self.row_unique_factor + 1) == 0
    }

    pub fn is_row_grand_total(&self, row: usize) -> bool {
        self.col_totals && row == self.table_row_size() - 1
    }

    pub fn is_column_sub_total(&self, column: usize) -> bool {
        self.row_sub_totals && (column + 1) % (self.col_unique_factor + 1) == 0
    }

    pub fn is_column_grand_total(&self, column: usize) -> bool {
        self.row_totals && column == self.table_column_size() - 1
    }

    /// Logical row of the subtotal slot following leaf row `leaf_row`.
    pub fn next_sub_row_index(&self, leaf_row: usize) -> usize {
        let f = self.row_unique_factor;
        leaf_row + leaf_row / f + (f - leaf_row % f)
    }

    /// Logical column of the subtotal slot following leaf column `leaf_col`.
    pub fn next_sub_column_index(&self, leaf_col: usize) -> usize {
        let f = self.col_unique_factor;
        leaf_col + leaf_col / f + (f - leaf_col % f)
    }

    pub fn total_row_index(&self) -> usize {
        self.table_row_size() - 1
    }

    pub fn total_column_index(&self) -> usize {
        self.table_column_size() - 1
    }

    /// Leaf row behind a logical row that is neither subtotal nor total.
    pub fn leaf_row_index(&self, row: usize) -> usize {
        if self.col_sub_totals {
            row - row / (self.row_unique_factor + 1)
        } else {
            row
        }
    }

    /// Leaf column behind a logical column that is neither subtotal nor total.
    pub fn leaf_column_index(&self, column: usize) -> usize {
        if self.row_sub_totals {
            column - column / (self.col_unique_factor + 1)
        } else {
            column
        }
    }
}

// ============================================================================
// LOOKUP TABLES
// ============================================================================

/// The dense value and type matrices, sized to the logical grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupTables {
    pub values: Vec<Vec<f64>>,
    pub types: Vec<Vec<ValueType>>,
}

impl LookupTables {
    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    pub fn column_count(&self) -> usize {
        self.values.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Grand-total of a logical row. Meaningful when row totals are enabled.
    pub fn row_total(&self, shape: &GridShape, row: usize) -> f64 {
        self.values[row][shape.total_column_index()]
    }

    /// Grand-total of a logical column. Meaningful when column totals are
    /// enabled.
    pub fn column_total(&self, shape: &GridShape, column: usize) -> f64 {
        self.values[shape.total_row_index()][column]
    }

    /// Whether a logical row is empty. An empty row is one whose grand total
    /// is non-positive - explicit zeros count as empty, matching the
    /// documented display policy.
    pub fn is_row_empty(&self, shape: &GridShape, row: usize) -> bool {
        self.row_total(shape, row) <= 0.0
    }

    pub fn is_column_empty(&self, shape: &GridShape, column: usize) -> bool {
        self.column_total(shape, column) <= 0.0
    }
}

/// Builds the id-combination addressing one leaf cell: column-axis ids first,
/// then row-axis ids.
pub fn leaf_id_combination(
    row_axis: &AxisDescriptor,
    col_axis: &AxisDescriptor,
    leaf_row: usize,
    leaf_col: usize,
) -> IdCombination {
    let mut ids = IdCombination::new();
    if col_axis.present {
        ids.extend_from(&col_axis.leaf_ids[leaf_col]);
    }
    if row_axis.present {
        ids.extend_from(&row_axis.leaf_ids[leaf_row]);
    }
    ids
}

/// Builds both lookups in one pass each.
///
/// Values are accumulated in leaf row-major order so floating-point summation
/// is deterministic.
pub fn build_lookups(
    shape: &GridShape,
    row_axis: &AxisDescriptor,
    col_axis: &AxisDescriptor,
    response: &AggregationResponse,
) -> LookupTables {
    let rows = shape.table_row_size();
    let cols = shape.table_column_size();

    let mut values = vec![vec![0.0f64; cols]; rows];

    let mut y = 0;
    for i in 0..shape.row_leaf_count {
        if shape.col_sub_totals && (y + 1) % (shape.row_unique_factor + 1) == 0 {
            y += 1;
        }

        let mut x = 0;
        for j in 0..shape.col_leaf_count {
            if shape.row_sub_totals && (x + 1) % (shape.col_unique_factor + 1) == 0 {
                x += 1;
            }

            let ids = leaf_id_combination(row_axis, col_axis, i, j);
            let value = match response.raw_value(&ids.key()) {
                Some(raw) => parse_value(raw),
                None => EMPTY_VALUE,
            };

            values[y][x] = value;

            // Absent cells keep the sentinel in place but add nothing to any
            // aggregate.
            let contribution = if value == EMPTY_VALUE { 0.0 } else { value };

            if shape.col_sub_totals {
                values[shape.next_sub_row_index(i)][x] += contribution;
            }
            if shape.row_sub_totals {
                values[y][shape.next_sub_column_index(j)] += contribution;
            }
            if shape.col_totals {
                values[shape.total_row_index()][x] += contribution;
            }
            if shape.row_totals {
                values[y][shape.total_column_index()] += contribution;
            }
            if shape.row_totals && shape.col_totals {
                values[shape.total_row_index()][shape.total_column_index()] += contribution;
            }
            if shape.col_sub_totals && shape.row_sub_totals {
                values[shape.next_sub_row_index(i)][shape.next_sub_column_index(j)] += contribution;
            }
            if shape.row_totals && shape.row_sub_totals {
                values[shape.total_row_index()][shape.next_sub_column_index(j)] += contribution;
            }
            if shape.col_sub_totals && shape.row_totals {
                values[shape.next_sub_row_index(i)][shape.total_column_index()] += contribution;
            }

            x += 1;
        }
        y += 1;
    }

    let mut types = vec![vec![ValueType::Value; cols]; rows];
    for (y, row) in types.iter_mut().enumerate() {
        for (x, tag) in row.iter_mut().enumerate() {
            if shape.is_row_sub_total(y) {
                *tag = ValueType::RowSubtotal;
            }
            if shape.is_column_sub_total(x) {
                *tag = ValueType::ColumnSubtotal;
            }
            if shape.is_row_grand_total(y) {
                *tag = ValueType::RowTotal;
            }
            if shape.is_column_grand_total(x) {
                *tag = ValueType::ColumnTotal;
            }
            if shape.is_column_sub_total(x) && shape.is_row_sub_total(y) {
                *tag = ValueType::IntersectSubtotal;
            }
            if shape.is_column_grand_total(x) && shape.is_row_grand_total(y) {
                *tag = ValueType::IntersectTotal;
            }
        }
    }

    log::debug!("built {}x{} value and type lookups", rows, cols);

    LookupTables { values, types }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_model::axis::AxisDescriptor;
    use pivot_model::layout::Layout;
    use pivot_model::response::AggregationResponse;

    fn create_test_axes() -> (AxisDescriptor, AxisDescriptor) {
        let row_axis = AxisDescriptor::from_leaf_paths(
            vec!["dim_row".to_string()],
            &[vec!["r1"], vec!["r2"]],
        );
        let col_axis = AxisDescriptor::from_leaf_paths(
            vec!["dim_col".to_string()],
            &[vec!["c1"], vec!["c2"], vec!["c3"]],
        );
        (row_axis, col_axis)
    }

    fn create_test_response() -> AggregationResponse {
        let mut response = AggregationResponse::new();
        let values = [
            ("c1-r1", 1.0),
            ("c2-r1", 2.0),
            ("c3-r1", 3.0),
            ("c1-r2", 4.0),
            ("c2-r2", 5.0),
            ("c3-r2", 6.0),
        ];
        for (key, value) in values {
            response.seed_value(key, value);
        }
        response
    }

    #[test]
    fn test_grand_totals_2x3() {
        let (row_axis, col_axis) = create_test_axes();
        let response = create_test_response();
        let shape = GridShape::new(&Layout::default(), &row_axis, &col_axis);

        assert_eq!(shape.table_row_size(), 3);
        assert_eq!(shape.table_column_size(), 4);

        let lookups = build_lookups(&shape, &row_axis, &col_axis, &response);

        assert_eq!(lookups.values[0], vec![1.0, 2.0, 3.0, 6.0]);
        assert_eq!(lookups.values[1], vec![4.0, 5.0, 6.0, 15.0]);
        // Grand-total row, with the intersection in the corner.
        assert_eq!(lookups.values[2], vec![5.0, 7.0, 9.0, 21.0]);
    }

    #[test]
    fn test_type_lookup_classification() {
        let (row_axis, col_axis) = create_test_axes();
        let response = create_test_response();
        let shape = GridShape::new(&Layout::default(), &row_axis, &col_axis);
        let lookups = build_lookups(&shape, &row_axis, &col_axis, &response);

        assert_eq!(lookups.types[0][0], ValueType::Value);
        assert_eq!(lookups.types[2][1], ValueType::RowTotal);
        assert_eq!(lookups.types[1][3], ValueType::ColumnTotal);
        assert_eq!(lookups.types[2][3], ValueType::IntersectTotal);
    }

    #[test]
    fn test_missing_leaf_keeps_sentinel_but_contributes_zero() {
        let (row_axis, col_axis) = create_test_axes();
        let mut response = create_test_response();
        response.remove_value("c1-r1");

        let shape = GridShape::new(&Layout::default(), &row_axis, &col_axis);
        let lookups = build_lookups(&shape, &row_axis, &col_axis, &response);

        assert_eq!(lookups.values[0][0], EMPTY_VALUE);
        // Row 0 total is 2+3, column 0 total is 4, intersection 20.
        assert_eq!(lookups.values[0][3], 5.0);
        assert_eq!(lookups.values[2][0], 4.0);
        assert_eq!(lookups.values[2][3], 20.0);
    }

    #[test]
    fn test_subtotals_two_level_axis() {
        let row_axis = AxisDescriptor::from_leaf_paths(
            vec!["d1".to_string(), "d2".to_string()],
            &[
                vec!["A", "a1"],
                vec!["A", "a2"],
                vec!["B", "b1"],
                vec!["B", "b2"],
            ],
        );
        let col_axis = AxisDescriptor::from_leaf_paths(
            vec!["dc".to_string()],
            &[vec!["c1"], vec!["c2"]],
        );
        let mut response = AggregationResponse::new();
        for (key, value) in [
            ("c1-A-a1", 1.0),
            ("c2-A-a1", 2.0),
            ("c1-A-a2", 3.0),
            ("c2-A-a2", 4.0),
            ("c1-B-b1", 5.0),
            ("c2-B-b1", 6.0),
            ("c1-B-b2", 7.0),
            ("c2-B-b2", 8.0),
        ] {
            response.seed_value(key, value);
        }

        let shape = GridShape::new(&Layout::default(), &row_axis, &col_axis);

        // unique_factor * group count == leaf count.
        assert_eq!(row_axis.unique_factor, 2);
        assert_eq!(row_axis.unique_factor * row_axis.level_count(0), row_axis.leaf_count);

        // 4 leaves + 2 subtotal rows + 1 total row.
        assert_eq!(shape.table_row_size(), 7);
        assert!(shape.is_row_sub_total(2));
        assert!(shape.is_row_sub_total(5));
        assert!(shape.is_row_grand_total(6));

        let lookups = build_lookups(&shape, &row_axis, &col_axis, &response);

        // Subtotal rows cover exactly their group's leaves.
        assert_eq!(lookups.values[2][0], 4.0);
        assert_eq!(lookups.values[2][1], 6.0);
        assert_eq!(lookups.values[5][0], 12.0);
        assert_eq!(lookups.values[5][1], 14.0);
        // Grand totals and the row-total column.
        assert_eq!(lookups.values[6][0], 16.0);
        assert_eq!(lookups.values[6][2], 36.0);
        assert_eq!(lookups.values[2][2], 10.0);

        assert_eq!(lookups.types[2][0], ValueType::RowSubtotal);
        assert_eq!(lookups.types[2][2], ValueType::ColumnTotal);
    }

    #[test]
    fn test_zero_rows_count_as_empty() {
        // Documented policy: an explicit zero total is "empty", the same as
        // no data at all.
        let (row_axis, col_axis) = create_test_axes();
        let mut response = AggregationResponse::new();
        for key in ["c1-r1", "c2-r1", "c3-r1"] {
            response.seed_value(key, 0.0);
        }

        let shape = GridShape::new(&Layout::default(), &row_axis, &col_axis);
        let lookups = build_lookups(&shape, &row_axis, &col_axis, &response);

        assert!(lookups.is_row_empty(&shape, 0));
        assert!(lookups.is_row_empty(&shape, 1));
        assert!(lookups.is_column_empty(&shape, 0));
    }
}
