//! Core types, pivot engine, and record sources for salespivot
//!
//! This crate provides the record and column types, the pivot aggregation
//! engine with its derived views, year-over-year deltas, filters, and the
//! record source trait used by the other salespivot crates.

pub mod delta;
pub mod error;
pub mod expansion;
pub mod filters;
pub mod pivot;
pub mod session;
pub mod source;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use error::{PivotError, Result};
pub use pivot::{PivotAggregator, PivotNode, PivotTable};
pub use types::{AggregatedRecord, ColumnKey, NodeId, RowDimension};
