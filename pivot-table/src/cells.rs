//! FILENAME: pivot-table/src/cells.rs
//! Cell model and factory constructors.
//!
//! Every grid position - header, value, padding - is one `TableCell`. The
//! factories fix the class, sizing and emptiness policy per cell kind so the
//! builders only supply content and coordinates. Cell content is a pure
//! function of its inputs: the same coordinates and value always produce an
//! equal cell, including its id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pivot_model::axis::NodeId;
use pivot_model::key::IdCombination;

use crate::lookup::EMPTY_VALUE;

/// Base cell width in pixels.
pub const CELL_WIDTH: u32 = 120;

/// Base cell height in pixels.
pub const CELL_HEIGHT: u32 = 25;

/// Namespace fixing the deterministic cell-id derivation.
const CELL_ID_NAMESPACE: Uuid = Uuid::NAMESPACE_OID;

/// The kind of a table cell. Drives class assignment, hiding rules and the
/// span-adjustment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CellType {
    #[default]
    Value,
    ValueSubtotal,
    ValueGrandTotal,
    RowAxis,
    ColumnAxis,
    DimensionSubtotal,
    DimensionGrandTotal,
    DimensionEmpty,
    DimensionLabel,
    Padding,
    Title,
}

/// One renderable cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub cell_type: CellType,

    /// Numeric value behind a value cell; 0 elsewhere.
    pub value: f64,

    /// Markup content. `&nbsp;` for blank cells so the cell still renders.
    pub html_value: String,

    /// Base css class list.
    pub cls: String,

    pub col_span: usize,
    pub row_span: usize,

    pub width: u32,
    pub height: u32,

    /// Hidden cells emit no markup at all.
    pub hidden: bool,

    /// Collapsed cells emit no markup; set by empty-row/column hiding.
    pub collapsed: bool,

    /// Whether the cell holds no displayable data.
    pub empty: bool,

    /// Whether an axis cell sits at the first leaf of its node's run.
    pub oldest: bool,

    /// Axis node behind an axis cell.
    pub node: Option<NodeId>,

    /// Hierarchy level of an axis cell.
    pub level: Option<usize>,

    /// Leaf index of an axis cell.
    pub leaf: Option<usize>,

    /// Deterministic element id, present on clickable cells.
    pub uuid: Option<String>,

    /// Dimension-item ids behind a value cell.
    pub item_ids: Vec<String>,

    /// Sort key for sortable column headers; `"total"` on the total header.
    pub sort: Option<String>,

    /// Tooltip text.
    pub title: Option<String>,
}

impl Default for TableCell {
    fn default() -> Self {
        TableCell {
            cell_type: CellType::Value,
            value: 0.0,
            html_value: "&nbsp;".to_string(),
            cls: String::new(),
            col_span: 1,
            row_span: 1,
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
            hidden: false,
            collapsed: false,
            empty: false,
            oldest: false,
            node: None,
            level: None,
            leaf: None,
            uuid: None,
            item_ids: Vec::new(),
            sort: None,
            title: None,
        }
    }
}

/// Rounds to two decimals and prints without trailing zeros.
pub fn fmt_rounded(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{}", rounded)
}

/// Formats `value` as a percentage of `total`, rounded to two decimals.
pub fn percentage_html(value: f64, total: f64) -> String {
    format!("{}%", fmt_rounded(100.0 * value / total))
}

impl TableCell {
    /// A leaf value cell. The sentinel for an absent combination renders as
    /// blank with value 0; an explicit value renders as-is, zero included.
    pub fn value_cell(value: f64, ids: &IdCombination, row: usize, col: usize) -> TableCell {
        let empty = value == EMPTY_VALUE;
        let value = if empty { 0.0 } else { value };
        let html_value = if empty {
            "&nbsp;".to_string()
        } else {
            format!("{}", value)
        };
        let seed = format!("{}:{}:{}", row, col, ids.key());
        TableCell {
            cell_type: CellType::Value,
            value,
            html_value,
            cls: "pivot-value cursor-default".to_string(),
            empty,
            uuid: Some(Uuid::new_v5(&CELL_ID_NAMESPACE, seed.as_bytes()).to_string()),
            item_ids: ids.ids().to_vec(),
            ..TableCell::default()
        }
    }

    /// A subtotal value cell. Non-positive totals display as blank.
    pub fn value_sub_total(value: f64) -> TableCell {
        let empty = value <= 0.0;
        TableCell {
            cell_type: CellType::ValueSubtotal,
            value,
            html_value: if empty { "&nbsp;".to_string() } else { fmt_rounded(value) },
            cls: "pivot-value-subtotal".to_string(),
            empty,
            ..TableCell::default()
        }
    }

    /// A grand-total value cell. Non-positive totals display as blank.
    pub fn value_grand_total(value: f64) -> TableCell {
        let empty = value <= 0.0;
        TableCell {
            cell_type: CellType::ValueGrandTotal,
            value,
            html_value: if empty { "&nbsp;".to_string() } else { fmt_rounded(value) },
            cls: "pivot-value-total-subgrandtotal".to_string(),
            empty,
            ..TableCell::default()
        }
    }

    /// A row-axis header cell.
    pub fn row_axis(
        node: NodeId,
        level: usize,
        leaf: usize,
        span: usize,
        display_name: &str,
        oldest: bool,
    ) -> TableCell {
        TableCell {
            cell_type: CellType::RowAxis,
            html_value: display_name.to_string(),
            cls: "pivot-dim td-nobreak".to_string(),
            row_span: span,
            oldest,
            hidden: !oldest,
            node: Some(node),
            level: Some(level),
            leaf: Some(leaf),
            ..TableCell::default()
        }
    }

    /// A column-axis header cell. `sort` carries the leaf key when the header
    /// is sortable.
    pub fn column_axis(
        node: NodeId,
        level: usize,
        leaf: usize,
        span: usize,
        display_name: &str,
        oldest: bool,
        sort: Option<String>,
    ) -> TableCell {
        let uuid = sort
            .as_deref()
            .map(|key| Uuid::new_v5(&CELL_ID_NAMESPACE, key.as_bytes()).to_string());
        TableCell {
            cell_type: CellType::ColumnAxis,
            html_value: display_name.to_string(),
            cls: "pivot-dim".to_string(),
            col_span: span,
            oldest,
            hidden: !oldest,
            node: Some(node),
            level: Some(level),
            leaf: Some(leaf),
            sort,
            uuid,
            ..TableCell::default()
        }
    }

    /// A subtotal header cell in an axis block.
    pub fn dimension_sub_total(
        col_span: usize,
        row_span: usize,
        empty: bool,
        hidden: bool,
    ) -> TableCell {
        TableCell {
            cell_type: CellType::DimensionSubtotal,
            cls: "pivot-dim-subtotal".to_string(),
            col_span,
            row_span,
            empty,
            hidden,
            ..TableCell::default()
        }
    }

    /// A grand-total header cell. The total header is sortable when the
    /// surrounding layout supports sorting.
    pub fn dimension_grand_total(
        text: &str,
        col_span: usize,
        row_span: usize,
        sortable: bool,
    ) -> TableCell {
        let (sort, uuid) = if sortable {
            let id = Uuid::new_v5(&CELL_ID_NAMESPACE, b"total").to_string();
            (Some("total".to_string()), Some(id))
        } else {
            (None, None)
        };
        TableCell {
            cell_type: CellType::DimensionGrandTotal,
            html_value: text.to_string(),
            cls: "pivot-dim-total".to_string(),
            col_span,
            row_span,
            sort,
            uuid,
            ..TableCell::default()
        }
    }

    /// A blank filler cell in the corner block or under a total header.
    pub fn dimension_empty(col_span: usize, row_span: usize, hidden: bool) -> TableCell {
        TableCell {
            cell_type: CellType::DimensionEmpty,
            cls: "pivot-empty".to_string(),
            col_span,
            row_span,
            hidden,
            ..TableCell::default()
        }
    }

    /// A dimension-name label in the corner block.
    pub fn dimension_label(text: &str) -> TableCell {
        TableCell {
            cell_type: CellType::DimensionLabel,
            html_value: text.to_string(),
            cls: "pivot-dim-label".to_string(),
            ..TableCell::default()
        }
    }

    /// A padding cell standing in for off-window content.
    pub fn padding(width: u32, height: u32, col_span: usize, row_span: usize) -> TableCell {
        TableCell {
            cell_type: CellType::Padding,
            html_value: String::new(),
            cls: "pivot-padding".to_string(),
            width,
            height,
            col_span,
            row_span,
            hidden: width == 0 || height == 0,
            ..TableCell::default()
        }
    }

    /// The title cell spanning the top of the table.
    pub fn title_cell(text: &str, col_span: usize) -> TableCell {
        TableCell {
            cell_type: CellType::Title,
            html_value: text.to_string(),
            cls: "pivot-filter cursor-default".to_string(),
            col_span,
            ..TableCell::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_cell_is_deterministic() {
        let ids = IdCombination::from_ids(["c1", "r1"]);
        let first = TableCell::value_cell(3.0, &ids, 2, 5);
        let second = TableCell::value_cell(3.0, &ids, 2, 5);
        assert_eq!(first, second);
        assert!(first.uuid.is_some());

        // A different coordinate yields a different id.
        let other = TableCell::value_cell(3.0, &ids, 2, 6);
        assert_ne!(first.uuid, other.uuid);
    }

    #[test]
    fn test_value_cell_sentinel_renders_blank() {
        let ids = IdCombination::from_ids(["c1", "r1"]);
        let cell = TableCell::value_cell(EMPTY_VALUE, &ids, 0, 0);
        assert!(cell.empty);
        assert_eq!(cell.value, 0.0);
        assert_eq!(cell.html_value, "&nbsp;");

        // An explicit zero is a real value for leaf cells.
        let zero = TableCell::value_cell(0.0, &ids, 0, 0);
        assert!(!zero.empty);
        assert_eq!(zero.html_value, "0");
    }

    #[test]
    fn test_total_cells_blank_on_non_positive() {
        assert!(TableCell::value_grand_total(0.0).empty);
        assert!(TableCell::value_sub_total(-2.0).empty);
        let filled = TableCell::value_grand_total(12.344);
        assert!(!filled.empty);
        assert_eq!(filled.html_value, "12.34");
    }

    #[test]
    fn test_fmt_rounded() {
        assert_eq!(fmt_rounded(1.234), "1.23");
        assert_eq!(fmt_rounded(2.0), "2");
        assert_eq!(fmt_rounded(16.666666), "16.67");
    }

    #[test]
    fn test_percentage_html() {
        assert_eq!(percentage_html(1.0, 6.0), "16.67%");
        assert_eq!(percentage_html(3.0, 6.0), "50%");
        assert_eq!(percentage_html(6.0, 6.0), "100%");
    }
}
