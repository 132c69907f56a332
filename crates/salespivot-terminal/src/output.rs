//! Output formatting module for salespivot
//!
//! This module provides formatters for displaying pivot tables in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! # Examples
//!
//! ```
//! use salespivot_core::pivot::PivotAggregator;
//! use salespivot_core::types::{AggregatedRecord, RowDimension};
//! use salespivot_core::view::visible_rows;
//! use salespivot_terminal::get_formatter;
//! use std::collections::HashSet;
//!
//! let records = vec![AggregatedRecord::new(2024, 1, 1250.0).with_labels("Revenue", "", "")];
//! let table = PivotAggregator::new(RowDimension::BusinessArea).aggregate(&records);
//! let rows = visible_rows(&table.roots, &HashSet::new());
//!
//! // Table formatter for human-readable output
//! let formatter = get_formatter(false, false);
//! println!("{}", formatter.format_pivot(&table, &rows));
//!
//! // JSON formatter for machine-readable output
//! let json_formatter = get_formatter(true, false);
//! println!("{}", json_formatter.format_pivot(&table, &rows));
//! ```

use colored::*;
use prettytable::{Cell, Row, Table, format, row};
use salespivot_core::delta::{Trend, YoyDelta, year_over_year};
use salespivot_core::pivot::PivotTable;
use salespivot_core::types::ColumnKey;
use salespivot_core::view::{ColumnHeader, VisibleRow, column_headers};
use serde_json::{Map, Value, json};

/// Trait for output formatters
///
/// Implementations render an aggregated pivot table plus the rows that are
/// currently visible.
pub trait OutputFormatter {
    /// Format the pivot table body for the visible rows
    fn format_pivot(&self, table: &PivotTable, rows: &[VisibleRow<'_>]) -> String;

    /// Format the column axis only
    fn format_columns(&self, headers: &[ColumnHeader]) -> String;
}

/// The column used for the year-over-year comparison
fn comparison_key(table: &PivotTable) -> Option<ColumnKey> {
    table.col_keys.last().copied()
}

/// Table formatter for human-readable output
///
/// Produces ASCII tables suitable for terminal display. Amounts are shown
/// with thousands separators and two decimals.
pub struct TableFormatter {
    /// Whether to add a year-over-year column
    pub show_yoy: bool,
    /// Whether to use colored output (respects NO_COLOR environment variable)
    colored_output: bool,
}

impl TableFormatter {
    /// Create a new TableFormatter
    pub fn new(show_yoy: bool) -> Self {
        Self {
            show_yoy,
            colored_output: std::env::var("NO_COLOR").is_err(),
        }
    }

    /// Disable or enable colors explicitly
    pub fn with_colors(mut self, colored_output: bool) -> Self {
        self.colored_output = colored_output;
        self
    }

    /// Format an amount with thousands separators
    fn format_amount(amount: f64) -> String {
        let formatted = format!("{:.2}", amount.abs());
        let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

        let mut grouped = String::new();
        for (count, ch) in whole.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let whole: String = grouped.chars().rev().collect();

        // -0.00 renders as 0.00
        let sign = if amount < 0.0 && formatted != "0.00" {
            "-"
        } else {
            ""
        };
        format!("{sign}{whole}.{fraction}")
    }

    /// Row label with indentation and expand marker
    fn format_row_label(row: &VisibleRow<'_>) -> String {
        let marker = if row.node.has_children() {
            if row.expanded { "▾ " } else { "▸ " }
        } else {
            "  "
        };
        format!("{}{}{}", "  ".repeat(row.node.level), marker, row.node.label)
    }

    fn yoy_cell(&self, delta: YoyDelta) -> Cell {
        let text = delta.to_string();
        let text = match delta.trend() {
            Some(Trend::Up) if self.colored_output => text.green().to_string(),
            Some(Trend::Down) if self.colored_output => text.red().to_string(),
            _ => text,
        };
        Cell::new(&text).style_spec("r")
    }

    fn title_row(&self, table: &PivotTable, compare: Option<ColumnKey>) -> Row {
        let mut cells = vec![Cell::new(&table.dimension.to_string()).style_spec("b")];
        for header in column_headers(&table.col_keys) {
            cells.push(Cell::new(&header.label).style_spec("bc"));
        }
        cells.push(Cell::new("Total").style_spec("bc"));
        if let Some(key) = compare {
            cells.push(Cell::new(&format!("YoY {key}")).style_spec("bc"));
        }
        Row::new(cells)
    }

    fn summary_line(&self, table: &PivotTable) -> Option<String> {
        let unlabeled = table.unlabeled_total();
        if unlabeled == 0.0 {
            return None;
        }
        let line = format!(
            "Amount without a row for {}: {}",
            table.dimension,
            Self::format_amount(unlabeled)
        );
        Some(if self.colored_output {
            line.yellow().to_string()
        } else {
            line
        })
    }
}

impl OutputFormatter for TableFormatter {
    fn format_pivot(&self, table: &PivotTable, rows: &[VisibleRow<'_>]) -> String {
        if table.is_empty() {
            return "No records to display".to_string();
        }

        let compare = if self.show_yoy {
            comparison_key(table)
        } else {
            None
        };

        let mut output = Table::new();
        output.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        output.set_titles(self.title_row(table, compare));

        for visible in rows {
            let node = visible.node;
            let mut cells = vec![Cell::new(&Self::format_row_label(visible))];
            for key in &table.col_keys {
                let text = node
                    .values
                    .get(key)
                    .map(|v| Self::format_amount(*v))
                    .unwrap_or_default();
                cells.push(Cell::new(&text).style_spec("r"));
            }
            cells.push(Cell::new(&Self::format_amount(node.row_total)).style_spec("r"));
            if let Some(key) = compare {
                cells.push(self.yoy_cell(year_over_year(node, &key)));
            }
            output.add_row(Row::new(cells));
        }

        // Add separator
        let width = table.col_keys.len() + 2 + usize::from(compare.is_some());
        output.add_row(Row::new(vec![Cell::new(""); width]));

        // Add totals row
        let mut totals = vec![Cell::new("TOTAL").style_spec("b")];
        for key in &table.col_keys {
            totals.push(Cell::new(&Self::format_amount(table.col_total(key))).style_spec("br"));
        }
        totals.push(Cell::new(&Self::format_amount(table.grand_total)).style_spec("br"));
        if let Some(key) = compare {
            totals.push(self.yoy_cell(YoyDelta::between(
                table.col_total(&key),
                table.col_total(&key.prior_year()),
            )));
        }
        output.add_row(Row::new(totals));

        let mut rendered = output.to_string();
        if let Some(line) = self.summary_line(table) {
            rendered.push_str(&line);
            rendered.push('\n');
        }
        rendered
    }

    fn format_columns(&self, headers: &[ColumnHeader]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "Key", b -> "Kind", b -> "Label", b -> "Year"]);

        for header in headers {
            let kind = serde_json::to_value(header.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            table.add_row(row![header.key, kind, header.label, header.parent]);
        }

        table.to_string()
    }
}

/// JSON formatter for machine-readable output
///
/// Produces structured JSON output that can be easily parsed by other tools.
/// Values are keyed by their column key string.
pub struct JsonFormatter {
    /// Whether to add a year-over-year entry per row
    pub show_yoy: bool,
}

impl JsonFormatter {
    fn values_json(values: impl Iterator<Item = (ColumnKey, f64)>) -> Value {
        let map: Map<String, Value> = values.map(|(k, v)| (k.to_string(), json!(v))).collect();
        Value::Object(map)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_pivot(&self, table: &PivotTable, rows: &[VisibleRow<'_>]) -> String {
        let compare = if self.show_yoy {
            comparison_key(table)
        } else {
            None
        };

        let output = json!({
            "dimension": table.dimension,
            "col_keys": table.col_keys,
            "headers": column_headers(&table.col_keys),
            "rows": rows.iter().map(|visible| {
                let node = visible.node;
                let mut row_json = json!({
                    "id": node.id,
                    "label": node.label,
                    "level": node.level,
                    "is_leaf": node.is_leaf,
                    "expanded": visible.expanded,
                    "values": Self::values_json(node.values.iter().map(|(k, v)| (*k, *v))),
                    "row_total": node.row_total,
                });

                if let Some(key) = compare {
                    row_json["yoy"] = json!({
                        "column": key,
                        "prior_column": key.prior_year(),
                        "delta": year_over_year(node, &key),
                    });
                }

                row_json
            }).collect::<Vec<_>>(),
            "col_totals": Self::values_json(table.col_totals.iter().map(|(k, v)| (*k, *v))),
            "grand_total": table.grand_total,
            "unlabeled_total": table.unlabeled_total(),
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
    }

    fn format_columns(&self, headers: &[ColumnHeader]) -> String {
        let output = json!({ "columns": headers });
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
    }
}

/// Get the appropriate formatter based on output format preference
pub fn get_formatter(json: bool, show_yoy: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter { show_yoy })
    } else {
        Box::new(TableFormatter::new(show_yoy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salespivot_core::pivot::aggregate;
    use salespivot_core::types::{AggregatedRecord, NodeId, RowDimension};
    use salespivot_core::view::visible_rows;
    use std::collections::{BTreeSet, HashSet};

    fn sample_table() -> PivotTable {
        let data = vec![
            AggregatedRecord::new(2023, 1, 100.0).with_labels("A", "X", ""),
            AggregatedRecord::new(2023, 2, 50.0).with_labels("A", "Y", ""),
            AggregatedRecord::new(2024, 1, 200.0).with_labels("A", "X", ""),
            AggregatedRecord::new(2024, 1, 1000.0).with_labels("-", "", ""),
        ];
        aggregate(&data, RowDimension::HierarchyBaPss, &BTreeSet::new())
    }

    #[test]
    fn test_amount_formatting() {
        assert_eq!(TableFormatter::format_amount(1234567.891), "1,234,567.89");
        assert_eq!(TableFormatter::format_amount(999.0), "999.00");
        assert_eq!(TableFormatter::format_amount(0.0), "0.00");
        assert_eq!(TableFormatter::format_amount(-1500.5), "-1,500.50");
        assert_eq!(TableFormatter::format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_table_output_collapsed() {
        let table = sample_table();
        let rows = visible_rows(&table.roots, &HashSet::new());
        let output = TableFormatter::new(false)
            .with_colors(false)
            .format_pivot(&table, &rows);

        assert!(output.contains("▸ A"));
        assert!(!output.contains("X"));
        assert!(output.contains("TOTAL"));
        assert!(output.contains("1,350.00"));
        assert!(output.contains("Amount without a row for hierarchy_ba_pss: 1,000.00"));
    }

    #[test]
    fn test_no_unlabeled_line_for_fully_labelled_table() {
        let data = vec![
            AggregatedRecord::new(2024, 1, 25.51).with_labels("C", "", ""),
            AggregatedRecord::new(2024, 1, 49.54).with_labels("B", "", ""),
            AggregatedRecord::new(2024, 1, 44.95).with_labels("A", "", ""),
        ];
        let table = aggregate(&data, RowDimension::BusinessArea, &BTreeSet::new());
        let rows = visible_rows(&table.roots, &HashSet::new());
        let output = TableFormatter::new(false)
            .with_colors(false)
            .format_pivot(&table, &rows);

        assert!(output.contains("TOTAL"));
        assert!(!output.contains("Amount without a row"));
    }

    #[test]
    fn test_table_output_expanded_rows() {
        let table = sample_table();
        let expanded: HashSet<NodeId> = [NodeId::new("A")].into_iter().collect();
        let rows = visible_rows(&table.roots, &expanded);
        let output = TableFormatter::new(false)
            .with_colors(false)
            .format_pivot(&table, &rows);

        assert!(output.contains("▾ A"));
        assert!(output.contains("    X"));
        assert!(output.contains("    Y"));
    }

    #[test]
    fn test_table_output_with_yoy() {
        let table = sample_table();
        let rows = visible_rows(&table.roots, &HashSet::new());
        let output = TableFormatter::new(true)
            .with_colors(false)
            .format_pivot(&table, &rows);

        assert!(output.contains("YoY 2024"));
        assert!(output.contains("+33.3%"));
    }

    #[test]
    fn test_empty_table_output() {
        let table = PivotTable::default();
        let output = TableFormatter::new(false).format_pivot(&table, &[]);
        assert_eq!(output, "No records to display");
    }

    #[test]
    fn test_json_output_structure() {
        let table = sample_table();
        let rows = visible_rows(&table.roots, &HashSet::new());
        let output = JsonFormatter { show_yoy: true }.format_pivot(&table, &rows);

        let json: serde_json::Value =
            serde_json::from_str(&output).expect("Failed to parse JSON output");
        assert_eq!(json["dimension"], "hierarchy_ba_pss");
        assert_eq!(json["col_keys"][0], "2023");
        assert_eq!(json["headers"][1]["kind"], "year");
        assert_eq!(json["rows"][0]["id"], "A");
        assert_eq!(json["rows"][0]["expanded"], false);
        assert_eq!(json["rows"][0]["values"]["2023-Total"], 150.0);
        assert_eq!(json["rows"][0]["row_total"], 350.0);
        assert_eq!(json["rows"][0]["yoy"]["prior_column"], "2023");
        assert_eq!(json["rows"][0]["yoy"]["delta"]["kind"], "change");
        assert_eq!(json["col_totals"]["2024"], 1200.0);
        assert_eq!(json["grand_total"], 1350.0);
        assert_eq!(json["unlabeled_total"], 1000.0);
    }

    #[test]
    fn test_json_columns() {
        let table = sample_table();
        let headers = column_headers(&table.col_keys);
        let output = JsonFormatter { show_yoy: false }.format_columns(&headers);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["columns"][0]["key"], "2023");
        assert_eq!(json["columns"][0]["label"], "2023");
    }

    #[test]
    fn test_table_columns() {
        let keys = vec![
            ColumnKey::Month { year: 2023, month: 4 },
            ColumnKey::YearTotal(2023),
        ];
        let output = TableFormatter::new(false).format_columns(&column_headers(&keys));
        assert!(output.contains("2023-04"));
        assert!(output.contains("Apr"));
        assert!(output.contains("subtotal"));
    }
}
