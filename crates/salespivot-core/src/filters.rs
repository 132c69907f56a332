//! Filtering module for aggregated records
//!
//! Mirrors the filter parameters the aggregation endpoint accepts: year,
//! business area and month. Sources apply the same filter locally so a
//! file-backed report and an endpoint-backed report agree.
//!
//! # Examples
//!
//! ```
//! use salespivot_core::filters::RecordFilter;
//! use salespivot_core::types::AggregatedRecord;
//!
//! // Q1 2024 for one business area
//! let filter = RecordFilter::new()
//!     .with_since(2024, 1)
//!     .with_until(2024, 3)
//!     .with_area("EMEA".to_string());
//!
//! let record = AggregatedRecord::new(2024, 2, 10.0).with_labels("Revenue", "Hardware", "EMEA");
//! assert!(filter.matches(&record));
//! ```

use crate::error::{PivotError, Result};
use crate::types::AggregatedRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Filter configuration for aggregated records
///
/// All filters are optional and combine with AND.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    /// Allowed years
    pub years: Option<BTreeSet<i32>>,
    /// Allowed months (1-12)
    pub months: Option<BTreeSet<u32>>,
    /// Label that must appear at any hierarchy level
    pub area: Option<String>,
    /// Start period (year, month), inclusive
    pub since: Option<(i32, u32)>,
    /// End period (year, month), inclusive
    pub until: Option<(i32, u32)>,
}

impl RecordFilter {
    /// Create a new filter with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a set of years
    pub fn with_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = Some(years.into_iter().collect());
        self
    }

    /// Restrict to a set of months
    pub fn with_months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.months = Some(months.into_iter().collect());
        self
    }

    /// Restrict to records carrying an area label
    pub fn with_area(mut self, area: String) -> Self {
        self.area = Some(area);
        self
    }

    /// Set the start period
    pub fn with_since(mut self, year: i32, month: u32) -> Self {
        self.since = Some((year, month));
        self
    }

    /// Set the end period
    pub fn with_until(mut self, year: i32, month: u32) -> Self {
        self.until = Some((year, month));
        self
    }

    /// Whether no restriction is configured
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check if a record passes the filter
    pub fn matches(&self, record: &AggregatedRecord) -> bool {
        if let Some(years) = &self.years
            && !years.contains(&record.year)
        {
            return false;
        }

        if let Some(months) = &self.months
            && !months.contains(&record.month)
        {
            return false;
        }

        if let Some(area) = &self.area
            && !record.labels().contains(&area.as_str())
        {
            return false;
        }

        let period = (record.year, record.month);
        if let Some(since) = self.since
            && period < since
        {
            return false;
        }
        if let Some(until) = self.until
            && period > until
        {
            return false;
        }

        true
    }

    /// Filter a stream of records
    ///
    /// Errors pass through untouched so the consumer still sees them.
    pub fn filter_stream<S>(self, stream: S) -> impl futures::Stream<Item = Result<AggregatedRecord>>
    where
        S: futures::Stream<Item = Result<AggregatedRecord>>,
    {
        use futures::StreamExt;

        stream.filter(move |result| {
            let keep = match result {
                Ok(record) => self.matches(record),
                Err(_) => true,
            };
            futures::future::ready(keep)
        })
    }
}

/// Parse a `YYYY-MM` period
///
/// # Example
///
/// ```
/// use salespivot_core::filters::parse_period;
///
/// assert_eq!(parse_period("2024-03").unwrap(), (2024, 3));
/// assert!(parse_period("2024-13").is_err());
/// assert!(parse_period("March").is_err());
/// ```
pub fn parse_period(period: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{period}-01"), "%Y-%m-%d").map_err(|_| {
        PivotError::InvalidDate(format!("Invalid period '{period}', expected YYYY-MM"))
    })?;
    Ok((date.year(), date.month()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn record(year: i32, month: u32, labels: [&str; 3]) -> AggregatedRecord {
        AggregatedRecord::new(year, month, 1.0).with_labels(labels[0], labels[1], labels[2])
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = RecordFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&record(1999, 12, ["", "", ""])));
    }

    #[test]
    fn test_year_and_month_sets() {
        let filter = RecordFilter::new().with_years([2023, 2024]).with_months([1, 2]);
        assert!(filter.matches(&record(2023, 2, ["A", "", ""])));
        assert!(!filter.matches(&record(2022, 2, ["A", "", ""])));
        assert!(!filter.matches(&record(2024, 3, ["A", "", ""])));
    }

    #[test]
    fn test_area_matches_any_level() {
        let filter = RecordFilter::new().with_area("EMEA".to_string());
        assert!(filter.matches(&record(2024, 1, ["EMEA", "", ""])));
        assert!(filter.matches(&record(2024, 1, ["Revenue", "HW", "EMEA"])));
        assert!(!filter.matches(&record(2024, 1, ["Revenue", "HW", "APAC"])));
    }

    #[test]
    fn test_period_range_is_inclusive() {
        let filter = RecordFilter::new().with_since(2023, 11).with_until(2024, 2);
        assert!(!filter.matches(&record(2023, 10, ["A", "", ""])));
        assert!(filter.matches(&record(2023, 11, ["A", "", ""])));
        assert!(filter.matches(&record(2024, 2, ["A", "", ""])));
        assert!(!filter.matches(&record(2024, 3, ["A", "", ""])));
    }

    #[tokio::test]
    async fn test_filter_stream_keeps_errors() {
        let items = vec![
            Ok(record(2023, 1, ["A", "", ""])),
            Err(PivotError::InvalidRecord("bad".to_string())),
            Ok(record(2024, 1, ["A", "", ""])),
        ];
        let filtered: Vec<_> = RecordFilter::new()
            .with_years([2024])
            .filter_stream(futures::stream::iter(items))
            .collect()
            .await;

        assert_eq!(filtered.len(), 2);
        assert!(filtered[0].is_err());
        assert_eq!(filtered[1].as_ref().unwrap().year, 2024);
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("2023-01").unwrap(), (2023, 1));
        assert!(parse_period("2023").is_err());
        assert!(parse_period("2023-00").is_err());
    }
}
