//! Caller-owned expansion state
//!
//! Which rows and which column years are expanded is UI state, not
//! aggregation state. It is keyed by node id and year string so it survives
//! a full rebuild of the pivot table.

use crate::pivot::PivotTable;
use crate::types::{ColumnKey, NodeId};
use std::collections::{BTreeSet, HashSet};

/// Expanded rows and expanded column years
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    rows: HashSet<NodeId>,
    column_years: BTreeSet<String>,
}

impl ExpansionState {
    /// Everything collapsed
    pub fn new() -> Self {
        Self::default()
    }

    /// Expanded row ids
    pub fn rows(&self) -> &HashSet<NodeId> {
        &self.rows
    }

    /// Expanded column years
    pub fn column_years(&self) -> &BTreeSet<String> {
        &self.column_years
    }

    /// Whether a row is expanded
    pub fn is_row_expanded(&self, id: &str) -> bool {
        self.rows.contains(id)
    }

    /// Whether a column year is expanded
    pub fn is_year_expanded(&self, year: &str) -> bool {
        self.column_years.contains(year)
    }

    /// Flip a row; returns the new state
    pub fn toggle_row(&mut self, id: NodeId) -> bool {
        if self.rows.remove(&id) {
            false
        } else {
            self.rows.insert(id);
            true
        }
    }

    /// Flip a column year; returns the new state
    pub fn toggle_column_year(&mut self, year: impl Into<String>) -> bool {
        let year = year.into();
        if self.column_years.remove(&year) {
            false
        } else {
            self.column_years.insert(year);
            true
        }
    }

    /// Expand a row
    pub fn expand_row(&mut self, id: NodeId) {
        self.rows.insert(id);
    }

    /// Expand a column year
    pub fn expand_column_year(&mut self, year: impl Into<String>) {
        self.column_years.insert(year.into());
    }

    /// Expand every node that has children
    pub fn expand_all_rows(&mut self, table: &PivotTable) {
        self.expand_to_level(table, usize::MAX);
    }

    /// Expand every node with children above `level`
    ///
    /// `expand_to_level(table, 1)` opens the roots and shows their children.
    pub fn expand_to_level(&mut self, table: &PivotTable, level: usize) {
        self.rows.extend(
            table
                .nodes()
                .filter(|node| node.has_children() && node.level < level)
                .map(|node| node.id.clone()),
        );
    }

    /// Collapse every row
    pub fn collapse_all_rows(&mut self) {
        self.rows.clear();
    }

    /// Expand every year present in the given column keys
    pub fn expand_all_years(&mut self, keys: &[ColumnKey]) {
        self.column_years
            .extend(keys.iter().map(|key| key.year().to_string()));
    }

    /// Collapse every column year
    pub fn collapse_all_years(&mut self) {
        self.column_years.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::aggregate;
    use crate::types::{AggregatedRecord, RowDimension};

    fn table() -> PivotTable {
        let data = vec![
            AggregatedRecord::new(2023, 1, 1.0).with_labels("A", "B", "C"),
            AggregatedRecord::new(2024, 1, 1.0).with_labels("D", "", ""),
        ];
        aggregate(&data, RowDimension::HierarchyAccount, &BTreeSet::new())
    }

    #[test]
    fn test_toggle_row() {
        let mut state = ExpansionState::new();
        assert!(state.toggle_row(NodeId::new("A")));
        assert!(state.is_row_expanded("A"));
        assert!(!state.toggle_row(NodeId::new("A")));
        assert!(!state.is_row_expanded("A"));
    }

    #[test]
    fn test_toggle_column_year() {
        let mut state = ExpansionState::new();
        assert!(state.toggle_column_year("2023"));
        assert!(state.is_year_expanded("2023"));
        assert!(!state.toggle_column_year("2023"));
        assert!(state.column_years().is_empty());
    }

    #[test]
    fn test_expand_all_skips_leaves() {
        let mut state = ExpansionState::new();
        state.expand_all_rows(&table());
        let mut ids: Vec<&str> = state.rows().iter().map(|id| id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["A", "A|B"]);

        state.collapse_all_rows();
        assert!(state.rows().is_empty());
    }

    #[test]
    fn test_expand_to_level() {
        let mut state = ExpansionState::new();
        state.expand_to_level(&table(), 1);
        assert!(state.is_row_expanded("A"));
        assert!(!state.is_row_expanded("A|B"));
    }

    #[test]
    fn test_expand_all_years() {
        let table = table();
        let mut state = ExpansionState::new();
        state.expand_all_years(&table.col_keys);
        assert!(state.is_year_expanded("2023"));
        assert!(state.is_year_expanded("2024"));
        state.collapse_all_years();
        assert!(!state.is_year_expanded("2023"));
    }
}
