//! Record source trait
//!
//! Every place records can come from (local files, the remote aggregation
//! endpoint) implements [`RecordSource`] so reports and the live monitor
//! can load through generic code.

use crate::error::Result;
use crate::filters::RecordFilter;
use crate::types::{AggregatedRecord, RowDimension};
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;

/// Parameters of one load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Row dimension the records are aggregated for
    pub dimension: RowDimension,
    /// Filters to apply
    pub filter: RecordFilter,
}

impl RecordQuery {
    /// Query for a dimension without filters
    pub fn new(dimension: RowDimension) -> Self {
        Self {
            dimension,
            filter: RecordFilter::new(),
        }
    }

    /// Attach a filter
    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Boxed stream of records
pub type RecordStream<'a> = Pin<Box<dyn Stream<Item = Result<AggregatedRecord>> + Send + 'a>>;

/// Trait for record sources
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short description used in log lines
    fn describe(&self) -> String;

    /// Stream all records matching the query
    fn load_records(&self, query: &RecordQuery) -> RecordStream<'_>;

    /// Load the full record set into memory
    ///
    /// The first error aborts the load; the caller keeps its previous
    /// record set in that case.
    async fn load_all(&self, query: &RecordQuery) -> Result<Vec<AggregatedRecord>> {
        let mut records = Vec::new();
        let mut stream = self.load_records(query);
        while let Some(record) = stream.next().await {
            records.push(record?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PivotError;

    struct StaticSource(Vec<AggregatedRecord>);

    impl RecordSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }

        fn load_records(&self, query: &RecordQuery) -> RecordStream<'_> {
            let filter = query.filter.clone();
            let items: Vec<_> = self.0.iter().cloned().map(Ok).collect();
            Box::pin(filter.filter_stream(futures::stream::iter(items)))
        }
    }

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        fn load_records(&self, _query: &RecordQuery) -> RecordStream<'_> {
            let items: Vec<Result<AggregatedRecord>> =
                vec![Err(PivotError::InvalidRecord("broken".to_string()))];
            Box::pin(futures::stream::iter(items))
        }
    }

    #[tokio::test]
    async fn test_load_all_applies_filter() {
        let source = StaticSource(vec![
            AggregatedRecord::new(2023, 1, 1.0),
            AggregatedRecord::new(2024, 1, 2.0),
        ]);
        let query = RecordQuery::new(RowDimension::Product)
            .with_filter(RecordFilter::new().with_years([2024]));
        let records = source.load_all(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_amount, 2.0);
    }

    #[tokio::test]
    async fn test_load_all_propagates_errors() {
        let result = FailingSource
            .load_all(&RecordQuery::new(RowDimension::Product))
            .await;
        assert!(matches!(result, Err(PivotError::InvalidRecord(_))));
    }
}
