//! Data loader module for record files
//!
//! Reads aggregated records from local files. The data path is either a
//! single file or a directory whose `.json` and `.jsonl` files are read in
//! name order (not recursively).
//!
//! - `.json`: a JSON array of records
//! - `.jsonl`: one record per line
//!
//! Unreadable files, malformed lines and records that fail validation are
//! logged and skipped so one bad export does not hide the rest.
//!
//! # Examples
//!
//! ```no_run
//! use salespivot::data_loader::DataLoader;
//! use salespivot::source::{RecordQuery, RecordSource};
//! use salespivot::types::RowDimension;
//!
//! # async fn example() -> salespivot::Result<()> {
//! let loader = DataLoader::new(None)?;
//! let records = loader.load_all(&RecordQuery::new(RowDimension::Product)).await?;
//! println!("Loaded {} records from {}", records.len(), loader.describe());
//! # Ok(())
//! # }
//! ```

use crate::error::{PivotError, Result};
use crate::source::{RecordQuery, RecordSource, RecordStream};
use crate::types::AggregatedRecord;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the default data directory
pub const DATA_DIR_ENV: &str = "SALESPIVOT_DATA_DIR";

/// Kind of record file, by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordFormat {
    JsonArray,
    JsonLines,
}

impl RecordFormat {
    fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Self::JsonArray),
            Some("jsonl") => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// File-backed record source
pub struct DataLoader {
    /// Record file or directory
    path: PathBuf,
    /// Whether to show a spinner while loading
    show_progress: bool,
}

impl DataLoader {
    /// Create a loader for a path, or for the default data directory
    ///
    /// The default is `$SALESPIVOT_DATA_DIR`, then `<data dir>/salespivot`.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined or the path
    /// does not exist
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if !path.exists() {
            return Err(PivotError::NoRecordFiles(path));
        }

        debug!("Using record path {}", path.display());
        Ok(Self {
            path,
            show_progress: false,
        })
    }

    fn default_path() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        dirs::data_dir()
            .map(|dir| dir.join("salespivot"))
            .ok_or_else(|| PivotError::Config("Cannot determine data directory".into()))
    }

    /// Enable or disable the progress spinner
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Paths to watch for changes
    pub fn paths(&self) -> &[PathBuf] {
        std::slice::from_ref(&self.path)
    }

    /// Record files under the data path, sorted by name
    pub fn find_record_files(&self) -> Result<Vec<PathBuf>> {
        if self.path.is_file() {
            return match RecordFormat::of(&self.path) {
                Some(_) => Ok(vec![self.path.clone()]),
                None => Err(PivotError::NoRecordFiles(self.path.clone())),
            };
        }

        let files: Vec<PathBuf> = walkdir::WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| RecordFormat::of(path).is_some())
            .collect();

        info!("Found {} record files to process", files.len());
        Ok(files)
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Loading records");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Parse one file's contents, skipping bad entries
    fn parse_records(path: &Path, content: &str) -> Vec<AggregatedRecord> {
        let parsed: Vec<(usize, serde_json::Result<AggregatedRecord>)> =
            match RecordFormat::of(path) {
                Some(RecordFormat::JsonArray) => {
                    match serde_json::from_str::<Vec<serde_json::Value>>(content) {
                        Ok(values) => values
                            .into_iter()
                            .enumerate()
                            .map(|(i, value)| (i + 1, serde_json::from_value(value)))
                            .collect(),
                        Err(e) => {
                            warn!("Failed to parse record file {}: {}", path.display(), e);
                            return Vec::new();
                        }
                    }
                }
                Some(RecordFormat::JsonLines) => content
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| (i + 1, serde_json::from_str(line)))
                    .collect(),
                None => return Vec::new(),
            };

        validated_records(parsed, &path.display().to_string())
    }
}

/// Keep the records that decoded and validated, warning about the rest
///
/// `position` is the 1-based index or line number reported in the warning.
pub(crate) fn validated_records(
    parsed: impl IntoIterator<Item = (usize, serde_json::Result<AggregatedRecord>)>,
    origin: &str,
) -> Vec<AggregatedRecord> {
    let mut records = Vec::new();
    for (position, result) in parsed {
        match result.map_err(PivotError::from).and_then(|record| {
            record.validate()?;
            Ok(record)
        }) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping record {} in {}: {}", position, origin, e),
        }
    }
    records
}

#[async_trait]
impl RecordSource for DataLoader {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load_records(&self, query: &RecordQuery) -> RecordStream<'_> {
        let filter = query.filter.clone();
        let records = async_stream::try_stream! {
            let files = self.find_record_files()?;
            let progress = self.spinner();
            let mut loaded = 0usize;

            for path in files {
                if let Some(pb) = &progress {
                    pb.set_message(format!("Loading {}", path.display()));
                }

                let content = match tokio::fs::read_to_string(&path).await {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Failed to read record file {}: {}", path.display(), e);
                        continue;
                    }
                };

                for record in Self::parse_records(&path, &content) {
                    loaded += 1;
                    yield record;
                }
            }

            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
            debug!("Loaded {} records from {}", loaded, self.path.display());
        };
        Box::pin(filter.filter_stream(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::RecordFilter;
    use crate::types::RowDimension;
    use tempfile::TempDir;

    #[test]
    fn test_parse_json_array_skips_invalid() {
        let content = r#"[
            {"year": 2024, "month": 1, "col_label_1": "A", "total_amount": 10.0},
            {"year": 2024, "month": 13, "col_label_1": "A", "total_amount": 5.0},
            {"year": 2024, "col_label_1": "A"},
            {"year": 2023, "month": 12, "total_amount": -2.5}
        ]"#;
        let records = DataLoader::parse_records(Path::new("r.json"), content);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].col_label_1, "A");
        assert_eq!(records[1].col_label_1, "");
        assert_eq!(records[1].total_amount, -2.5);
    }

    #[test]
    fn test_parse_json_lines() {
        let content = "{\"year\":2024,\"month\":2,\"total_amount\":1.0}\n\nnot json\n{\"year\":2024,\"month\":3,\"total_amount\":2.0}\n";
        let records = DataLoader::parse_records(Path::new("r.jsonl"), content);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].month, 3);
    }

    #[test]
    fn test_parse_malformed_array() {
        let records = DataLoader::parse_records(Path::new("r.json"), "{not an array");
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let result = DataLoader::new(Some(dir.path().join("missing")));
        assert!(matches!(result, Err(PivotError::NoRecordFiles(_))));
    }

    #[test]
    fn test_find_record_files_is_flat_and_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.jsonl"), "").unwrap();
        std::fs::write(dir.path().join("a.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.json"), "[]").unwrap();

        let loader = DataLoader::new(Some(dir.path().to_path_buf())).unwrap();
        let files = loader.find_record_files().unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.json", "b.jsonl"]);
    }

    #[test]
    fn test_single_file_with_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(&path, "").unwrap();
        let loader = DataLoader::new(Some(path)).unwrap();
        assert!(matches!(
            loader.find_record_files(),
            Err(PivotError::NoRecordFiles(_))
        ));
    }

    #[tokio::test]
    async fn test_load_all_applies_filter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("records.jsonl"),
            "{\"year\":2023,\"month\":1,\"col_label_1\":\"A\",\"total_amount\":1.0}\n\
             {\"year\":2024,\"month\":1,\"col_label_1\":\"A\",\"total_amount\":2.0}\n",
        )
        .unwrap();

        let loader = DataLoader::new(Some(dir.path().to_path_buf())).unwrap();
        let query = RecordQuery::new(RowDimension::BusinessArea)
            .with_filter(RecordFilter::new().with_years([2024]));
        let records = loader.load_all(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_amount, 2.0);
    }
}
