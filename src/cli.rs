//! CLI interface for salespivot
//!
//! This module defines the command-line interface using clap. Every flag is
//! global so it can be given before or after the subcommand, and the
//! subcommand defaults to `report`.
//!
//! # Example
//!
//! ```bash
//! # Collapsed pivot by account hierarchy
//! salespivot --data ./records
//!
//! # Months of 2024 with the first hierarchy level opened
//! salespivot report --expand-year 2024 --expand-row Revenue
//!
//! # Business areas with a year-over-year column, as JSON
//! salespivot --dimension business_area --yoy --json
//!
//! # Keep the table on screen and redraw when files change
//! salespivot watch --interval 10
//! ```

use crate::error::{PivotError, Result};
use crate::filters::{RecordFilter, parse_period};
use crate::source::RecordQuery;
use crate::types::{NodeId, RowDimension};
use clap::{Parser, Subcommand};
use salespivot_core::expansion::ExpansionState;
use std::path::PathBuf;

/// Pivot monthly sales and accounting aggregates by label hierarchy
#[derive(Parser, Debug, Clone)]
#[command(name = "salespivot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Row hierarchy (hierarchy_account, hierarchy_ba_pss, business_area, product)
    #[arg(long, short = 'd', default_value = "hierarchy_account", global = true)]
    pub dimension: RowDimension,

    /// Show the months of a year (repeatable)
    #[arg(long = "expand-year", value_name = "YEAR", global = true)]
    pub expand_year: Vec<i32>,

    /// Expand a row by id, e.g. "Revenue|Hardware" (repeatable)
    #[arg(long = "expand-row", value_name = "ID", global = true)]
    pub expand_row: Vec<String>,

    /// Expand every row that has children
    #[arg(long, global = true)]
    pub expand_all: bool,

    /// Add a year-over-year column for the last column
    #[arg(long, global = true)]
    pub yoy: bool,

    /// Only include these years (repeatable)
    #[arg(long, value_name = "YEAR", global = true)]
    pub year: Vec<i32>,

    /// Only include these months (repeatable)
    #[arg(long, value_name = "MONTH", value_parser = clap::value_parser!(u32).range(1..=12), global = true)]
    pub month: Vec<u32>,

    /// Only include records carrying this label at any level
    #[arg(long, global = true)]
    pub area: Option<String>,

    /// Filter by start period (YYYY-MM)
    #[arg(long, global = true)]
    pub since: Option<String>,

    /// Filter by end period (YYYY-MM)
    #[arg(long, global = true)]
    pub until: Option<String>,

    /// Record file or directory
    #[arg(long, env = "SALESPIVOT_DATA_DIR", global = true)]
    pub data: Option<PathBuf>,

    /// Aggregation endpoint URL; takes precedence over --data
    #[arg(long, env = "SALESPIVOT_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the pivot table
    Report,

    /// List the column keys and their header classification
    Columns,

    /// Redraw the pivot table whenever the records change
    Watch {
        /// Refresh interval in seconds
        #[arg(long, default_value = "5")]
        interval: u64,
    },
}

impl Cli {
    /// Subcommand to run, `report` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Report)
    }

    /// Build the record filter from the filter flags
    pub fn record_filter(&self) -> Result<RecordFilter> {
        let mut filter = RecordFilter::new();

        if !self.year.is_empty() {
            filter = filter.with_years(self.year.iter().copied());
        }
        if !self.month.is_empty() {
            filter = filter.with_months(self.month.iter().copied());
        }
        if let Some(area) = &self.area {
            filter = filter.with_area(area.clone());
        }
        if let Some(since) = &self.since {
            let (year, month) = parse_period(since)?;
            filter = filter.with_since(year, month);
        }
        if let Some(until) = &self.until {
            let (year, month) = parse_period(until)?;
            filter = filter.with_until(year, month);
        }

        if let (Some(since), Some(until)) = (filter.since, filter.until)
            && since > until
        {
            return Err(PivotError::InvalidArgument(format!(
                "--since {}-{:02} is after --until {}-{:02}",
                since.0, since.1, until.0, until.1
            )));
        }

        Ok(filter)
    }

    /// Query handed to the record source
    pub fn query(&self) -> Result<RecordQuery> {
        Ok(RecordQuery::new(self.dimension).with_filter(self.record_filter()?))
    }

    /// Initial expansion state from the expand flags
    ///
    /// `--expand-all` needs the built table and is applied by the report.
    pub fn expansion(&self) -> ExpansionState {
        let mut state = ExpansionState::new();
        for year in &self.expand_year {
            state.expand_column_year(year.to_string());
        }
        for id in &self.expand_row {
            state.expand_row(NodeId::new(id.trim()));
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["salespivot"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.command(), Command::Report);
        assert_eq!(cli.dimension, RowDimension::HierarchyAccount);
        assert!(!cli.json);
        assert!(cli.record_filter().unwrap().is_empty());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "salespivot",
            "columns",
            "--json",
            "--dimension",
            "business-area",
            "--expand-year",
            "2024",
        ]);
        assert_eq!(cli.command(), Command::Columns);
        assert!(cli.json);
        assert_eq!(cli.dimension, RowDimension::BusinessArea);
        assert!(cli.expansion().is_year_expanded("2024"));
    }

    #[test]
    fn test_watch_interval() {
        let cli = Cli::parse_from(["salespivot", "watch", "--interval", "30"]);
        assert_eq!(cli.command(), Command::Watch { interval: 30 });

        let cli = Cli::parse_from(["salespivot", "watch"]);
        assert_eq!(cli.command(), Command::Watch { interval: 5 });
    }

    #[test]
    fn test_unknown_dimension_rejected() {
        assert!(Cli::try_parse_from(["salespivot", "--dimension", "region"]).is_err());
    }

    #[test]
    fn test_month_range_rejected() {
        assert!(Cli::try_parse_from(["salespivot", "--month", "13"]).is_err());
    }

    #[test]
    fn test_record_filter() {
        let cli = Cli::parse_from([
            "salespivot",
            "--year",
            "2023",
            "--year",
            "2024",
            "--area",
            "EMEA",
            "--since",
            "2023-06",
        ]);
        let filter = cli.record_filter().unwrap();
        assert_eq!(filter.years.unwrap().len(), 2);
        assert_eq!(filter.area.as_deref(), Some("EMEA"));
        assert_eq!(filter.since, Some((2023, 6)));
        assert_eq!(filter.until, None);
    }

    #[test]
    fn test_invalid_period() {
        let cli = Cli::parse_from(["salespivot", "--until", "June"]);
        assert!(matches!(
            cli.record_filter(),
            Err(PivotError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_inverted_period() {
        let cli = Cli::parse_from(["salespivot", "--since", "2024-05", "--until", "2024-01"]);
        assert!(matches!(
            cli.record_filter(),
            Err(PivotError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_expand_rows() {
        let cli = Cli::parse_from([
            "salespivot",
            "--expand-row",
            "Revenue",
            "--expand-row",
            "Revenue|Hardware",
        ]);
        let state = cli.expansion();
        assert!(state.is_row_expanded("Revenue"));
        assert!(state.is_row_expanded("Revenue|Hardware"));
        assert!(state.column_years().is_empty());
    }
}
