//! FILENAME: pivot-model/src/layout.rs
//! Layout options and the legend model.
//!
//! The layout is one immutable record threaded explicitly through every
//! builder - no ambient option getters. Legend sets live in a registry keyed
//! by id and are consulted only through `get_legend_set_by_id`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// DISPLAY OPTION ENUMS
// ============================================================================

/// How numeric values are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumberType {
    #[default]
    None,
    PercentOfRow,
    PercentOfColumn,
}

/// Thousands separator inserted when pretty-printing numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DigitGroupSeparator {
    #[default]
    None,
    Space,
    Comma,
}

impl DigitGroupSeparator {
    /// Markup fragment inserted between digit groups.
    pub fn value(&self) -> &'static str {
        match self {
            DigitGroupSeparator::None => "",
            DigitGroupSeparator::Space => "&nbsp;",
            DigitGroupSeparator::Comma => ",",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DisplayDensity {
    Comfortable,
    #[default]
    Normal,
    Compact,
}

impl DisplayDensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayDensity::Comfortable => "comfortable",
            DisplayDensity::Normal => "normal",
            DisplayDensity::Compact => "compact",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FontSize {
    Large,
    #[default]
    Normal,
    Small,
}

impl FontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Large => "large",
            FontSize::Normal => "normal",
            FontSize::Small => "small",
        }
    }
}

/// How a matched legend colors a value cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LegendDisplayStyle {
    /// Background fill with contrast-picked text color.
    #[default]
    Fill,
    /// Colored text only.
    Text,
}

/// Which legend set applies to a value cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LegendDisplayStrategy {
    /// One fixed legend set for the whole table.
    #[default]
    Fixed,
    /// Each data item's own legend set.
    ByDataItem,
}

// ============================================================================
// LEGENDS
// ============================================================================

/// One legend range. A value in `[start_value, end_value]` matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub start_value: f64,
    pub end_value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LegendSet {
    pub id: String,
    pub legends: Vec<Legend>,
}

/// Registry of legend sets, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegendRegistry {
    sets: FxHashMap<String, LegendSet>,
}

impl LegendRegistry {
    pub fn new() -> Self {
        LegendRegistry::default()
    }

    pub fn insert(&mut self, set: LegendSet) {
        self.sets.insert(set.id.clone(), set);
    }

    pub fn get_legend_set_by_id(&self, id: &str) -> Option<&LegendSet> {
        self.sets.get(id)
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

/// The complete, immutable display configuration for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Show the grand-total row.
    pub show_col_totals: bool,

    /// Show the grand-total column.
    pub show_row_totals: bool,

    /// Show subtotal rows (requires a row axis deeper than one level).
    pub show_col_sub_totals: bool,

    /// Show subtotal columns (requires a column axis deeper than one level).
    pub show_row_sub_totals: bool,

    pub hide_empty_rows: bool,
    pub hide_empty_columns: bool,

    /// Render dimension-name labels in the corner block.
    pub show_dimension_labels: bool,

    /// Prefer hierarchy names for axis items.
    pub show_hierarchy: bool,

    pub number_type: NumberType,
    pub digit_group_separator: DigitGroupSeparator,

    pub display_density: Option<DisplayDensity>,
    pub font_size: Option<FontSize>,

    /// Fixed legend set applied under `LegendDisplayStrategy::Fixed`.
    pub legend_set_id: Option<String>,
    pub legend_display_style: LegendDisplayStyle,
    pub legend_display_strategy: LegendDisplayStrategy,

    /// Optional title row spanning the top of the table.
    pub title: Option<String>,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            show_col_totals: true,
            show_row_totals: true,
            show_col_sub_totals: true,
            show_row_sub_totals: true,
            hide_empty_rows: false,
            hide_empty_columns: false,
            show_dimension_labels: false,
            show_hierarchy: false,
            number_type: NumberType::None,
            digit_group_separator: DigitGroupSeparator::None,
            display_density: None,
            font_size: None,
            legend_set_id: None,
            legend_display_style: LegendDisplayStyle::Fill,
            legend_display_strategy: LegendDisplayStrategy::Fixed,
            title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_values() {
        assert_eq!(DigitGroupSeparator::None.value(), "");
        assert_eq!(DigitGroupSeparator::Space.value(), "&nbsp;");
        assert_eq!(DigitGroupSeparator::Comma.value(), ",");
    }

    #[test]
    fn test_legend_registry_lookup() {
        let mut registry = LegendRegistry::new();
        registry.insert(LegendSet {
            id: "ls1".to_string(),
            legends: vec![Legend { start_value: 0.0, end_value: 10.0, color: "#ff0000".to_string() }],
        });
        assert!(registry.get_legend_set_by_id("ls1").is_some());
        assert!(registry.get_legend_set_by_id("ls2").is_none());
    }
}
