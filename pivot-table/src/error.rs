//! FILENAME: pivot-table/src/error.rs

use thiserror::Error;

/// Construction-time contract violations. Everything else degrades to an
/// empty or placeholder cell instead of failing.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("axis '{axis}' node table is {actual_levels} levels x {actual_leaves} leaves but the descriptor declares {expected_levels} x {expected_leaves}")]
    AxisShapeMismatch {
        axis: &'static str,
        expected_levels: usize,
        expected_leaves: usize,
        actual_levels: usize,
        actual_leaves: usize,
    },

    #[error("axis '{axis}' has {leaf_ids} leaf id-combinations for {leaves} leaves")]
    AxisLeafIdMismatch {
        axis: &'static str,
        leaves: usize,
        leaf_ids: usize,
    },

    #[error("value lookup is {actual_rows}x{actual_cols} but the logical grid requires {expected_rows}x{expected_cols}")]
    LookupShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },
}
