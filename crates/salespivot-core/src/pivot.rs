//! Pivot aggregation engine
//!
//! Turns a flat list of [`AggregatedRecord`]s into a forest of row nodes
//! with per-column values, plus column totals and a grand total.
//!
//! The build runs in two phases. A single pass over the records interns
//! nodes into a flat arena, with a separate per-node child index (label →
//! arena slot) for O(1) find-or-create. A finalization pass then turns the
//! arena into the public tree, sorting each level by label.
//!
//! # Examples
//!
//! ```
//! use salespivot_core::pivot::PivotAggregator;
//! use salespivot_core::types::{AggregatedRecord, ColumnKey, RowDimension};
//!
//! let records = vec![
//!     AggregatedRecord::new(2023, 1, 100.0).with_labels("A", "", ""),
//!     AggregatedRecord::new(2023, 2, 50.0).with_labels("A", "", ""),
//!     AggregatedRecord::new(2024, 1, 200.0).with_labels("A", "", ""),
//! ];
//!
//! let table = PivotAggregator::new(RowDimension::BusinessArea).aggregate(&records);
//! assert_eq!(table.col_keys, vec![ColumnKey::Year(2023), ColumnKey::Year(2024)]);
//! assert_eq!(table.roots[0].row_total, 350.0);
//! assert_eq!(table.grand_total, 350.0);
//! ```

use crate::types::{AggregatedRecord, ColumnKey, NodeId, RowDimension};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Column key → summed amount
pub type Values = BTreeMap<ColumnKey, f64>;

/// One row group in the pivot forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotNode {
    /// Fully qualified hierarchy path
    pub id: NodeId,
    /// Display label (last path segment)
    pub label: String,
    /// Zero-based depth
    pub level: usize,
    /// Whether the node has no hierarchy level beneath it
    pub is_leaf: bool,
    /// Summed amounts per year, month and year-subtotal bucket
    pub values: Values,
    /// Sum of every contributing record's amount
    pub row_total: f64,
    /// Children sorted by label; empty on leaves
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PivotNode>,
}

impl PivotNode {
    /// Value for a column key, zero when the node has no data there
    pub fn value(&self, key: &ColumnKey) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// Whether the node can be expanded
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Depth-first pre-order walk over this node and its subtree
    pub fn walk(&self) -> DepthFirst<'_> {
        DepthFirst { stack: vec![self] }
    }
}

/// Depth-first pre-order iterator over pivot nodes
pub struct DepthFirst<'a> {
    stack: Vec<&'a PivotNode>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a PivotNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Result of one aggregation run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PivotTable {
    /// Row hierarchy the forest was built for
    pub dimension: RowDimension,
    /// Ordered column keys to render
    pub col_keys: Vec<ColumnKey>,
    /// Root row nodes sorted by label
    pub roots: Vec<PivotNode>,
    /// Per-column totals over every record, regardless of row expansion
    pub col_totals: Values,
    /// Sum of every record's amount
    pub grand_total: f64,
    /// Sum of the amounts of records with an empty label path
    #[serde(default)]
    pub unlabeled: f64,
}

impl PivotTable {
    /// Depth-first pre-order walk over the whole forest
    pub fn nodes(&self) -> DepthFirst<'_> {
        DepthFirst {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Find a node by id
    pub fn find_node(&self, id: &str) -> Option<&PivotNode> {
        self.nodes().find(|node| node.id.as_str() == id)
    }

    /// Column total for a key, zero when absent
    pub fn col_total(&self, key: &ColumnKey) -> f64 {
        self.col_totals.get(key).copied().unwrap_or(0.0)
    }

    /// Amount counted in the totals but attached to no row
    ///
    /// Records whose label path is empty still feed the grand total and
    /// column totals; this is their combined amount.
    pub fn unlabeled_total(&self) -> f64 {
        self.unlabeled
    }

    /// Whether the table holds no data at all
    pub fn is_empty(&self) -> bool {
        self.col_keys.is_empty()
    }
}

/// Compare labels the way a locale-aware UI sort would
///
/// Case-insensitive first; on a tie lowercase sorts before uppercase.
/// Lowercased labels compare by code point, so non-ASCII letters sort after
/// `z` ("Éclair" follows "Fudge") instead of next to their base letter.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Derive the ordered column keys for a record set
///
/// Years ascend (compared as strings; four-digit years sort numerically).
/// A year listed in `expanded_years` becomes one key per month present in
/// that year followed by its subtotal; any other year is a single key.
pub fn column_keys<'a>(
    data: impl IntoIterator<Item = &'a AggregatedRecord>,
    expanded_years: &BTreeSet<String>,
) -> Vec<ColumnKey> {
    let mut months_by_year: BTreeMap<String, (i32, BTreeSet<u32>)> = BTreeMap::new();
    for record in data {
        months_by_year
            .entry(record.year.to_string())
            .or_insert_with(|| (record.year, BTreeSet::new()))
            .1
            .insert(record.month);
    }

    let mut keys = Vec::new();
    for (year_str, (year, months)) in months_by_year {
        if expanded_years.contains(&year_str) {
            keys.extend(
                months
                    .into_iter()
                    .map(|month| ColumnKey::Month { year, month }),
            );
            keys.push(ColumnKey::YearTotal(year));
        } else {
            keys.push(ColumnKey::Year(year));
        }
    }
    keys
}

fn accumulate(values: &mut Values, record: &AggregatedRecord) {
    for key in ColumnKey::buckets(record.year, record.month) {
        *values.entry(key).or_insert(0.0) += record.total_amount;
    }
}

/// Node under construction; children live in the builder's index
struct PendingNode {
    id: NodeId,
    label: String,
    level: usize,
    is_leaf: bool,
    values: Values,
    row_total: f64,
}

/// Arena plus per-level child index used during the single pass
#[derive(Default)]
struct ForestBuilder {
    nodes: Vec<PendingNode>,
    roots: HashMap<String, usize>,
    child_index: Vec<HashMap<String, usize>>,
}

impl ForestBuilder {
    fn insert(&mut self, record: &AggregatedRecord, path: &[&str]) {
        let mut parent: Option<usize> = None;

        for (depth, label) in path.iter().enumerate() {
            let existing = match parent {
                None => self.roots.get(*label),
                Some(p) => self.child_index[p].get(*label),
            }
            .copied();

            let slot = match existing {
                Some(slot) => slot,
                None => {
                    let slot = self.nodes.len();
                    self.nodes.push(PendingNode {
                        id: NodeId::from_path(&path[..=depth]),
                        label: (*label).to_string(),
                        level: depth,
                        is_leaf: depth + 1 == path.len(),
                        values: Values::new(),
                        row_total: 0.0,
                    });
                    self.child_index.push(HashMap::new());
                    match parent {
                        None => self.roots.insert((*label).to_string(), slot),
                        Some(p) => self.child_index[p].insert((*label).to_string(), slot),
                    };
                    slot
                }
            };

            let node = &mut self.nodes[slot];
            accumulate(&mut node.values, record);
            node.row_total += record.total_amount;
            parent = Some(slot);
        }
    }

    fn finish(self) -> Vec<PivotNode> {
        let ForestBuilder {
            nodes,
            roots,
            child_index,
        } = self;
        let mut slots: Vec<Option<PendingNode>> = nodes.into_iter().map(Some).collect();
        Self::finish_level(&mut slots, &child_index, roots.values())
    }

    fn finish_level<'a>(
        slots: &mut [Option<PendingNode>],
        child_index: &[HashMap<String, usize>],
        level: impl Iterator<Item = &'a usize>,
    ) -> Vec<PivotNode> {
        let indices: Vec<usize> = level.copied().collect();
        let mut finished: Vec<PivotNode> = indices
            .into_iter()
            .filter_map(|slot| Self::finish_node(slots, child_index, slot))
            .collect();
        finished.sort_by(|a, b| compare_labels(&a.label, &b.label));
        finished
    }

    fn finish_node(
        slots: &mut [Option<PendingNode>],
        child_index: &[HashMap<String, usize>],
        slot: usize,
    ) -> Option<PivotNode> {
        let pending = slots.get_mut(slot)?.take()?;
        let children = Self::finish_level(slots, child_index, child_index[slot].values());

        Some(PivotNode {
            id: pending.id,
            label: pending.label,
            level: pending.level,
            // A node first seen as a path end can still gain children later
            is_leaf: pending.is_leaf && children.is_empty(),
            values: pending.values,
            row_total: pending.row_total,
            children,
        })
    }
}

/// Main aggregation engine
///
/// Holds the caller's current configuration: which row hierarchy to build
/// and which column years are expanded into months. Each call to
/// [`PivotAggregator::aggregate`] rebuilds the table from scratch.
#[derive(Debug, Clone, Default)]
pub struct PivotAggregator {
    dimension: RowDimension,
    expanded_years: BTreeSet<String>,
}

impl PivotAggregator {
    /// Create a new aggregator for a row dimension
    pub fn new(dimension: RowDimension) -> Self {
        Self {
            dimension,
            expanded_years: BTreeSet::new(),
        }
    }

    /// Set the years expanded into monthly columns
    pub fn with_expanded_years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expanded_years = years.into_iter().map(Into::into).collect();
        self
    }

    /// Get the row dimension
    pub fn dimension(&self) -> RowDimension {
        self.dimension
    }

    /// Get the expanded column years
    pub fn expanded_years(&self) -> &BTreeSet<String> {
        &self.expanded_years
    }

    /// Aggregate records into a pivot table
    pub fn aggregate(&self, data: &[AggregatedRecord]) -> PivotTable {
        let mut builder = ForestBuilder::default();
        let mut col_totals = Values::new();
        let mut grand_total = 0.0;
        let mut unlabeled = 0usize;
        let mut unlabeled_amount = 0.0;

        for record in data {
            accumulate(&mut col_totals, record);
            grand_total += record.total_amount;

            let path = record.label_path(self.dimension);
            if path.is_empty() {
                unlabeled += 1;
                unlabeled_amount += record.total_amount;
                continue;
            }
            builder.insert(record, &path);
        }

        let node_count = builder.nodes.len();
        let roots = builder.finish();

        debug!(
            "Aggregated {} records into {} nodes ({} roots, {} unlabeled) for {}",
            data.len(),
            node_count,
            roots.len(),
            unlabeled,
            self.dimension
        );

        PivotTable {
            dimension: self.dimension,
            col_keys: column_keys(data, &self.expanded_years),
            roots,
            col_totals,
            grand_total,
            unlabeled: unlabeled_amount,
        }
    }
}

/// Aggregate records with an explicit configuration
pub fn aggregate(
    data: &[AggregatedRecord],
    dimension: RowDimension,
    expanded_years: &BTreeSet<String>,
) -> PivotTable {
    PivotAggregator {
        dimension,
        expanded_years: expanded_years.clone(),
    }
    .aggregate(data)
}
