//! Memoized pivot state
//!
//! [`PivotSession`] owns the current record set, the active row dimension
//! and the expansion state. The aggregated table is cached and rebuilt only
//! when the record set, the dimension or the expanded column years change;
//! toggling rows never triggers a rebuild.

use crate::expansion::ExpansionState;
use crate::pivot::{PivotAggregator, PivotTable};
use crate::types::{AggregatedRecord, NodeId, RowDimension};
use crate::view::{VisibleRow, visible_rows};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    generation: u64,
    dimension: RowDimension,
    expanded_years: BTreeSet<String>,
}

/// Record set, configuration, and the cached table derived from them
///
/// # Examples
/// ```
/// use salespivot_core::session::PivotSession;
/// use salespivot_core::types::{AggregatedRecord, NodeId, RowDimension};
///
/// let mut session = PivotSession::new(RowDimension::HierarchyBaPss);
/// session.replace_data(vec![
///     AggregatedRecord::new(2024, 1, 10.0).with_labels("A", "B", ""),
/// ]);
///
/// assert_eq!(session.visible_rows().len(), 1);
/// session.toggle_row(NodeId::new("A"));
/// assert_eq!(session.visible_rows().len(), 2);
/// assert_eq!(session.rebuilds(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PivotSession {
    data: Arc<[AggregatedRecord]>,
    generation: u64,
    dimension: RowDimension,
    expansion: ExpansionState,
    cached: Option<CacheKey>,
    table: PivotTable,
    rebuilds: u64,
}

impl PivotSession {
    /// Create an empty session
    pub fn new(dimension: RowDimension) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    /// Replace the whole record set
    ///
    /// Expansion state is kept; node ids are derived from labels only.
    pub fn replace_data(&mut self, data: impl Into<Arc<[AggregatedRecord]>>) {
        self.data = data.into();
        self.generation += 1;
        debug!(
            "Replaced record set (generation {}, {} records)",
            self.generation,
            self.data.len()
        );
    }

    /// Current record set
    pub fn data(&self) -> &Arc<[AggregatedRecord]> {
        &self.data
    }

    /// Active row dimension
    pub fn dimension(&self) -> RowDimension {
        self.dimension
    }

    /// Switch the row dimension
    pub fn set_dimension(&mut self, dimension: RowDimension) {
        self.dimension = dimension;
    }

    /// Current expansion state
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Mutable expansion state
    pub fn expansion_mut(&mut self) -> &mut ExpansionState {
        &mut self.expansion
    }

    /// Flip a row's expansion
    pub fn toggle_row(&mut self, id: NodeId) -> bool {
        self.expansion.toggle_row(id)
    }

    /// Flip a column year's expansion
    pub fn toggle_column_year(&mut self, year: impl Into<String>) -> bool {
        self.expansion.toggle_column_year(year)
    }

    /// Number of times the table has been rebuilt
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey {
            generation: self.generation,
            dimension: self.dimension,
            expanded_years: self.expansion.column_years().clone(),
        }
    }

    /// The pivot table for the current configuration
    pub fn table(&mut self) -> &PivotTable {
        let key = self.cache_key();
        if self.cached.as_ref() != Some(&key) {
            self.table = PivotAggregator::new(key.dimension)
                .with_expanded_years(key.expanded_years.iter().cloned())
                .aggregate(&self.data);
            self.cached = Some(key);
            self.rebuilds += 1;
        }
        &self.table
    }

    /// The table together with the rows to render
    pub fn view(&mut self) -> (&PivotTable, Vec<VisibleRow<'_>>) {
        self.table();
        let rows = visible_rows(&self.table.roots, self.expansion.rows());
        (&self.table, rows)
    }

    /// Rows to render for the current configuration
    pub fn visible_rows(&mut self) -> Vec<VisibleRow<'_>> {
        self.view().1
    }

    /// Expand every row that has children in the current table
    pub fn expand_all_rows(&mut self) {
        self.table();
        self.expansion.expand_all_rows(&self.table);
    }
}
