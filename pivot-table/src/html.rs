//! FILENAME: pivot-table/src/html.rs
//! Serialization of an assembled cell grid into table markup.
//!
//! Hidden and collapsed cells emit nothing; a row whose cells all emit
//! nothing emits no `<tr>` at all. Every rendered cell carries fixed sizing
//! styles so the browser cannot reflow the virtualized window.

use pivot_model::layout::{
    DigitGroupSeparator, Layout, LegendDisplayStrategy, LegendDisplayStyle, LegendRegistry,
    LegendSet,
};
use pivot_model::response::AggregationResponse;

use crate::cells::{CellType, TableCell};

pub(crate) struct HtmlRenderer<'a> {
    pub layout: &'a Layout,
    pub legends: &'a LegendRegistry,
    pub response: &'a AggregationResponse,

    /// Suppresses the click-affordance class on value cells.
    pub unclickable: bool,
}

impl<'a> HtmlRenderer<'a> {
    /// Serializes the assembled grid. Sortable header cells encountered along
    /// the way are pushed onto `sortables` as `(sort key, element id)`.
    pub fn render_table(
        &self,
        table: &[Vec<TableCell>],
        top_bar_span: usize,
        sortables: &mut Vec<(String, String)>,
    ) -> String {
        let mut cls = String::from("pivot user-select");
        if let Some(density) = self.layout.display_density {
            cls.push_str(" displaydensity-");
            cls.push_str(density.as_str());
        }
        if let Some(size) = self.layout.font_size {
            cls.push_str(" fontsize-");
            cls.push_str(size.as_str());
        }

        let mut html = format!("<table class=\"{}\">", cls);

        if let Some(title) = &self.layout.title {
            let mut cell = TableCell::title_cell(title, top_bar_span);
            cell.title = Some(title.clone());
            if let Some(td) = self.render_cell(&cell, sortables) {
                html.push_str("<tr>");
                html.push_str(&td);
                html.push_str("</tr>");
            }
        }

        for row in table {
            let mut row_html = String::new();
            for cell in row {
                if let Some(td) = self.render_cell(cell, sortables) {
                    row_html.push_str(&td);
                }
            }
            if !row_html.is_empty() {
                html.push_str("<tr>");
                html.push_str(&row_html);
                html.push_str("</tr>");
            }
        }

        html.push_str("</table>");
        html
    }

    /// One `<td>`, or nothing for hidden and collapsed cells.
    fn render_cell(
        &self,
        cell: &TableCell,
        sortables: &mut Vec<(String, String)>,
    ) -> Option<String> {
        if cell.hidden || cell.collapsed {
            return None;
        }

        let is_value = cell.cell_type == CellType::Value && !cell.empty;

        let mut classes: Vec<&str> = cell.cls.split(' ').filter(|c| !c.is_empty()).collect();
        if is_value && !self.unclickable {
            classes.push("pointer");
        }
        if cell.sort.is_some() {
            classes.push("td-sortable");
        }

        if let (Some(sort), Some(uuid)) = (&cell.sort, &cell.uuid) {
            sortables.push((sort.clone(), uuid.clone()));
        }

        let mut style = String::new();
        if is_value {
            if let Some(color) = self.legend_color(cell) {
                match self.layout.legend_display_style {
                    LegendDisplayStyle::Fill => {
                        let text = match hex_to_rgb(&color) {
                            Some(rgb) if !is_color_bright(rgb) => "white",
                            _ => "black",
                        };
                        style.push_str(&format!(
                            "background-color:{}; color: {}; ",
                            color, text
                        ));
                    }
                    LegendDisplayStyle::Text => {
                        style.push_str(&format!("color:{}; ", color));
                    }
                }
            }
        }

        style.push_str(&format!("min-width:{}px!important;", cell.width));
        style.push_str(&format!("min-height:{}px!important;", cell.height));
        style.push_str(&format!("max-width:{}px!important;", cell.width));
        style.push_str(&format!("max-height:{}px!important;", cell.height));
        style.push_str(&format!("width:{}px!important;", cell.width));
        style.push_str(&format!("height:{}px!important;", cell.height));
        style.push_str("white-space: nowrap!important;");
        style.push_str("overflow: hidden!important;");
        style.push_str("text-overflow: ellipsis!important;");

        let content = match cell.cell_type {
            CellType::RowAxis | CellType::ColumnAxis | CellType::Title => {
                cell.html_value.clone()
            }
            _ => pretty_print(&cell.html_value, self.layout.digit_group_separator),
        };

        let mut td = String::from("<td");
        td.push_str(&format!(" class=\"{}\"", classes.join(" ")));
        td.push_str(&format!(" style=\"{}\"", style));
        if let Some(uuid) = &cell.uuid {
            td.push_str(&format!(" id=\"{}\"", uuid));
        }
        td.push_str(&format!(" colspan=\"{}\"", cell.col_span));
        td.push_str(&format!(" rowspan=\"{}\"", cell.row_span));
        if let Some(title) = &cell.title {
            td.push_str(&format!(" title=\"{}\"", title));
        }
        td.push('>');
        td.push_str(&content);
        td.push_str("</td>");
        Some(td)
    }

    /// Color of the last legend range containing the cell value, if any.
    fn legend_color(&self, cell: &TableCell) -> Option<String> {
        let set = self.legend_set_for(cell)?;
        let mut color = None;
        for legend in &set.legends {
            if cell.value >= legend.start_value && cell.value <= legend.end_value {
                color = Some(legend.color.clone());
            }
        }
        color
    }

    fn legend_set_for(&self, cell: &TableCell) -> Option<&LegendSet> {
        let id = match self.layout.legend_display_strategy {
            LegendDisplayStrategy::Fixed => self.layout.legend_set_id.as_deref()?,
            LegendDisplayStrategy::ByDataItem => cell
                .item_ids
                .iter()
                .find_map(|item| self.response.legend_set_for_item(item))?,
        };
        self.legends.get_legend_set_by_id(id)
    }
}

/// Groups the integer digits of a numeric string. Non-numeric content passes
/// through untouched.
pub fn pretty_print(html: &str, separator: DigitGroupSeparator) -> String {
    let sep = separator.value();
    if sep.is_empty() || html.parse::<f64>().is_err() {
        return html.to_string();
    }

    let (mantissa, fraction) = match html.split_once('.') {
        Some((m, f)) => (m, Some(f)),
        None => (html, None),
    };
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    let mut grouped = String::new();
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push_str(sep);
        }
        grouped.push(c);
    }

    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Parses `#rrggbb` into channel values.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Perceived-brightness test deciding the contrasting text color.
pub fn is_color_bright((r, g, b): (u8, u8, u8)) -> bool {
    (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000 > 125
}
