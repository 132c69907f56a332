//! Renderable views derived from a pivot table
//!
//! Two pure functions sit on top of the aggregation result: flattening the
//! forest into the rows a table body shows for a given expansion state, and
//! classifying column keys into header cells.

use crate::error::Result;
use crate::pivot::PivotNode;
use crate::types::{ColumnKey, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Month number → abbreviation
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Abbreviation for a 1-based month number
pub fn month_abbreviation(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_ABBREVIATIONS.get(index).copied()
}

/// One row of the rendered table body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRow<'a> {
    /// The node shown on this row
    pub node: &'a PivotNode,
    /// Whether the node's children follow it
    pub expanded: bool,
}

/// Flatten the forest into visible rows
///
/// Depth-first pre-order. A node's children are only visited when the node
/// has children and its id is in `expanded`; a collapsed subtree contributes
/// no rows.
///
/// # Examples
/// ```
/// use salespivot_core::pivot::PivotAggregator;
/// use salespivot_core::types::{AggregatedRecord, NodeId, RowDimension};
/// use salespivot_core::view::visible_rows;
/// use std::collections::HashSet;
///
/// let records = vec![AggregatedRecord::new(2024, 1, 5.0).with_labels("A", "B", "")];
/// let table = PivotAggregator::new(RowDimension::HierarchyBaPss).aggregate(&records);
///
/// assert_eq!(visible_rows(&table.roots, &HashSet::new()).len(), 1);
///
/// let expanded: HashSet<NodeId> = [NodeId::new("A")].into_iter().collect();
/// assert_eq!(visible_rows(&table.roots, &expanded).len(), 2);
/// ```
pub fn visible_rows<'a>(roots: &'a [PivotNode], expanded: &HashSet<NodeId>) -> Vec<VisibleRow<'a>> {
    let mut rows = Vec::new();
    push_visible(roots, expanded, &mut rows);
    rows
}

fn push_visible<'a>(
    nodes: &'a [PivotNode],
    expanded: &HashSet<NodeId>,
    rows: &mut Vec<VisibleRow<'a>>,
) {
    for node in nodes {
        let is_expanded = node.has_children() && expanded.contains(&node.id);
        rows.push(VisibleRow {
            node,
            expanded: is_expanded,
        });
        if is_expanded {
            push_visible(&node.children, expanded, rows);
        }
    }
}

/// Kind of a column header cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Collapsed year
    Year,
    /// Month within an expanded year
    Month,
    /// Subtotal after the months of an expanded year
    Subtotal,
}

/// Header cell for a column key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeader {
    /// The column key this header belongs to
    pub key: ColumnKey,
    /// Header kind, driving style and comparisons
    pub kind: ColumnKind,
    /// Display label
    pub label: String,
    /// Year the column belongs to
    pub parent: String,
}

impl From<ColumnKey> for ColumnHeader {
    fn from(key: ColumnKey) -> Self {
        let parent = key.year().to_string();
        match key {
            ColumnKey::Year(_) => Self {
                key,
                kind: ColumnKind::Year,
                label: parent.clone(),
                parent,
            },
            ColumnKey::Month { month, .. } => Self {
                key,
                kind: ColumnKind::Month,
                label: month_abbreviation(month)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{month:02}")),
                parent,
            },
            ColumnKey::YearTotal(_) => Self {
                key,
                kind: ColumnKind::Subtotal,
                label: format!("{parent} Total"),
                parent,
            },
        }
    }
}

/// Classify a raw column key string
///
/// `"YYYY-Total"` is a subtotal, `"YYYY-MM"` a month, `"YYYY"` a year.
pub fn classify_column(key: &str) -> Result<ColumnHeader> {
    let key: ColumnKey = key.parse()?;
    Ok(key.into())
}

/// Header cells for an ordered list of column keys
pub fn column_headers(keys: &[ColumnKey]) -> Vec<ColumnHeader> {
    keys.iter().copied().map(ColumnHeader::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::aggregate;
    use crate::types::{AggregatedRecord, RowDimension};
    use std::collections::BTreeSet;

    fn forest() -> crate::pivot::PivotTable {
        let data = vec![
            AggregatedRecord::new(2024, 1, 1.0).with_labels("A", "B", "C"),
            AggregatedRecord::new(2024, 1, 1.0).with_labels("A", "B", "D"),
            AggregatedRecord::new(2024, 1, 1.0).with_labels("A", "E", ""),
            AggregatedRecord::new(2024, 1, 1.0).with_labels("F", "G", ""),
        ];
        aggregate(&data, RowDimension::HierarchyAccount, &BTreeSet::new())
    }

    fn ids(rows: &[VisibleRow<'_>]) -> Vec<String> {
        rows.iter().map(|r| r.node.id.to_string()).collect()
    }

    fn expanded(list: &[&str]) -> HashSet<NodeId> {
        list.iter().map(|id| NodeId::new(*id)).collect()
    }

    #[test]
    fn test_collapsed_forest_shows_roots() {
        let table = forest();
        let rows = visible_rows(&table.roots, &HashSet::new());
        assert_eq!(ids(&rows), vec!["A", "F"]);
        assert!(rows.iter().all(|r| !r.expanded));
    }

    #[test]
    fn test_nested_expansion() {
        let table = forest();
        let rows = visible_rows(&table.roots, &expanded(&["A", "A|B"]));
        assert_eq!(ids(&rows), vec!["A", "A|B", "A|B|C", "A|B|D", "A|E", "F"]);
        assert!(rows[0].expanded);
        assert!(rows[1].expanded);
        assert!(!rows[2].expanded);
    }

    #[test]
    fn test_expanded_child_of_collapsed_parent_is_hidden() {
        let table = forest();
        let rows = visible_rows(&table.roots, &expanded(&["A|B"]));
        assert_eq!(ids(&rows), vec!["A", "F"]);
    }

    #[test]
    fn test_expanding_leaf_is_noop() {
        let table = forest();
        let rows = visible_rows(&table.roots, &expanded(&["A", "A|E"]));
        assert_eq!(ids(&rows), vec!["A", "A|B", "A|E", "F"]);
        assert!(!rows[2].expanded);
    }

    #[test]
    fn test_classify_year() {
        let header = classify_column("2023").unwrap();
        assert_eq!(header.kind, ColumnKind::Year);
        assert_eq!(header.label, "2023");
        assert_eq!(header.parent, "2023");
    }

    #[test]
    fn test_classify_month() {
        let header = classify_column("2023-03").unwrap();
        assert_eq!(header.kind, ColumnKind::Month);
        assert_eq!(header.label, "Mar");
        assert_eq!(header.parent, "2023");
    }

    #[test]
    fn test_classify_subtotal() {
        let header = classify_column("2023-Total").unwrap();
        assert_eq!(header.kind, ColumnKind::Subtotal);
        assert_eq!(header.parent, "2023");
        assert_eq!(header.label, "2023 Total");
    }

    #[test]
    fn test_classify_rejects_garbage() {
        assert!(classify_column("total").is_err());
        assert!(classify_column("2023-00").is_err());
    }

    #[test]
    fn test_month_abbreviation_bounds() {
        assert_eq!(month_abbreviation(1), Some("Jan"));
        assert_eq!(month_abbreviation(12), Some("Dec"));
        assert_eq!(month_abbreviation(0), None);
        assert_eq!(month_abbreviation(13), None);
    }
}
