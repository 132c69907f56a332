//! Error types for salespivot
//!
//! This module defines the error types used throughout the salespivot crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! The pivot engine itself never fails; errors only come from the edges
//! (loading records, talking to an endpoint, parsing user input).
//!
//! # Example
//!
//! ```
//! use salespivot_core::error::{PivotError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to PivotError
//!     let _file = std::fs::read_to_string("nonexistent.json")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for salespivot operations
#[derive(Error, Debug)]
pub enum PivotError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// No record files found at the configured location
    #[error("No record files found in {0}")]
    NoRecordFiles(PathBuf),

    /// A record failed ingestion validation
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Unknown row dimension name
    #[error("Unknown row dimension: {0}")]
    UnknownDimension(String),

    /// Malformed column key
    #[error("Invalid column key: {0}")]
    InvalidColumnKey(String),

    /// Invalid date or period format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Parse error with file context
    #[error("Parse error in {file}: {error}")]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("Endpoint returned HTTP {status}: {url}")]
    Endpoint {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for Results in salespivot
///
/// # Example
///
/// ```
/// use salespivot_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, PivotError>;
