//! Common test utilities and helpers for salespivot tests
//!
//! Record builders and helpers that write record files into temporary
//! directories.

#![allow(dead_code)]

use salespivot::types::AggregatedRecord;
use std::path::Path;
use tempfile::TempDir;

/// Shorthand for a record with up to three labels
pub fn record(year: i32, month: u32, labels: [&str; 3], amount: f64) -> AggregatedRecord {
    AggregatedRecord::new(year, month, amount).with_labels(labels[0], labels[1], labels[2])
}

/// A small ledger with two account hierarchies across two years
pub fn sample_ledger() -> Vec<AggregatedRecord> {
    vec![
        record(2023, 1, ["Revenue", "Hardware", "EMEA"], 1200.0),
        record(2023, 2, ["Revenue", "Hardware", "APAC"], 800.0),
        record(2023, 2, ["Revenue", "Services", "EMEA"], 500.0),
        record(2023, 3, ["Expenses", "Payroll", "EMEA"], -900.0),
        record(2024, 1, ["Revenue", "Hardware", "EMEA"], 1500.0),
        record(2024, 1, ["Revenue", "Services", "APAC"], 700.0),
        record(2024, 2, ["Expenses", "Payroll", "EMEA"], -1000.0),
        record(2024, 2, ["Expenses", "Travel", "-"], -150.0),
        record(2024, 3, ["-", "", ""], 42.0),
    ]
}

/// Serialize records as JSON lines
pub fn to_jsonl(records: &[AggregatedRecord]) -> String {
    records
        .iter()
        .map(|r| serde_json::to_string(r).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write records as a JSON array file
pub fn write_json(dir: &Path, name: &str, records: &[AggregatedRecord]) {
    std::fs::write(dir.join(name), serde_json::to_string(records).unwrap()).unwrap();
}

/// Write records as a JSONL file
pub fn write_jsonl(dir: &Path, name: &str, records: &[AggregatedRecord]) {
    std::fs::write(dir.join(name), to_jsonl(records)).unwrap();
}

/// Temporary data directory holding the sample ledger split over two files
pub fn sample_data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let ledger = sample_ledger();
    let (first, second) = ledger.split_at(4);
    write_json(dir.path(), "2023.json", first);
    write_jsonl(dir.path(), "2024.jsonl", second);
    dir
}
