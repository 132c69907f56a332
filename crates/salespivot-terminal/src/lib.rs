//! Terminal output for salespivot
//!
//! Table and JSON renderers for pivot tables and column axes.

pub mod output;

pub use output::{JsonFormatter, OutputFormatter, TableFormatter, get_formatter};
