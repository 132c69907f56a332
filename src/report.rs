//! Report rendering shared by the one-shot commands and watch mode

use crate::cli::Cli;
use crate::output::get_formatter;
use crate::session::PivotSession;
use crate::types::NodeId;
use crate::view::column_headers;

/// Presentation options for a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Output as JSON
    pub json: bool,
    /// Add a year-over-year column
    pub yoy: bool,
    /// Expand every row that has children before rendering
    pub expand_all: bool,
}

impl From<&Cli> for ReportOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            yoy: cli.yoy,
            expand_all: cli.expand_all,
        }
    }
}

/// Render the pivot table for the session's current state
pub fn render_pivot(session: &mut PivotSession, options: ReportOptions) -> String {
    if options.expand_all {
        session.expand_all_rows();
    }
    let formatter = get_formatter(options.json, options.yoy);
    let (table, rows) = session.view();
    formatter.format_pivot(table, &rows)
}

/// Render the column axis for the session's current state
pub fn render_columns(session: &mut PivotSession, options: ReportOptions) -> String {
    let formatter = get_formatter(options.json, options.yoy);
    let headers = column_headers(&session.table().col_keys);
    formatter.format_columns(&headers)
}

/// Expanded row ids that match no node in the current table
pub fn missing_rows(session: &mut PivotSession) -> Vec<NodeId> {
    let expanded: Vec<NodeId> = session.expansion().rows().iter().cloned().collect();
    let table = session.table();
    let mut missing: Vec<NodeId> = expanded
        .into_iter()
        .filter(|id| table.find_node(id.as_str()).is_none())
        .collect();
    missing.sort();
    missing
}
