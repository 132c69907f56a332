//! salespivot - Pivot monthly sales and accounting aggregates
//!
//! This library provides functionality to:
//! - Load aggregated records from local JSON/JSONL files or an HTTP endpoint
//! - Build a row hierarchy by label path with year and month columns
//! - Flatten the hierarchy into visible rows for a given expansion state
//! - Compute year-over-year deltas
//! - Generate reports in table and JSON formats
//! - Redraw the report when the record files change
//!
//! # Examples
//!
//! ```no_run
//! use salespivot::{
//!     data_loader::DataLoader,
//!     session::PivotSession,
//!     source::{RecordQuery, RecordSource},
//!     types::RowDimension,
//! };
//!
//! #[tokio::main]
//! async fn main() -> salespivot::Result<()> {
//!     let loader = DataLoader::new(None)?;
//!     let records = loader
//!         .load_all(&RecordQuery::new(RowDimension::HierarchyAccount))
//!         .await?;
//!
//!     let mut session = PivotSession::new(RowDimension::HierarchyAccount);
//!     session.replace_data(records);
//!     println!("Grand total: {}", session.table().grand_total);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod data_loader;
pub mod http_source;
pub mod live_monitor;
pub mod report;

// Re-export modules from workspace crates
pub use salespivot_core::{
    delta, error, expansion, filters, pivot, session, source, types, view,
};
pub use salespivot_terminal::output;

// Re-export commonly used types
pub use error::{PivotError, Result};
pub use pivot::{PivotAggregator, PivotNode, PivotTable};
pub use types::{AggregatedRecord, ColumnKey, NodeId, RowDimension};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
