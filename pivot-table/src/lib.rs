//! FILENAME: pivot-table/src/lib.rs
//! Virtualized pivot-grid rendering engine.
//!
//! The pipeline: an aggregation result and two axis descriptors are
//! flattened into dense value/type lookups (`lookup`), a builder composes
//! any window of cells from them (`builder`, `cells`), and `PivotTable`
//! owns the current window, moving it incrementally on scroll and
//! serializing it to markup (`table`, `html`).

mod builder;
pub mod cells;
pub mod error;
mod html;
pub mod lookup;
pub mod table;

pub use html::pretty_print;

pub use cells::{CellType, TableCell, CELL_HEIGHT, CELL_WIDTH};
pub use error::TableError;
pub use lookup::{build_lookups, GridShape, LookupTables, ValueType, EMPTY_VALUE};
pub use table::PivotTable;
