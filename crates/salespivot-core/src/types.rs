//! Core domain types for salespivot
//!
//! This module contains the fundamental types used throughout the salespivot
//! crates: the input record shape delivered by the aggregation endpoint, the
//! row hierarchy selector, node identifiers, and typed column keys.

use crate::error::{PivotError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Placeholder label meaning "this hierarchy level does not apply"
pub const SENTINEL_LABEL: &str = "-";

/// Separator joining hierarchy levels into a node id
pub const PATH_SEPARATOR: char = '|';

/// Maximum number of label levels a record can carry
pub const MAX_LABEL_DEPTH: usize = 3;

/// Label path of a single record, borrowed from the record itself
pub type LabelPath<'a> = SmallVec<[&'a str; MAX_LABEL_DEPTH]>;

/// One pre-aggregated bucket as delivered by the aggregation endpoint
///
/// Each record is the summed amount for a (year, month, label path)
/// combination. Label fields default to empty when missing from the
/// source document.
///
/// # Examples
/// ```
/// use salespivot_core::types::{AggregatedRecord, RowDimension};
///
/// let record = AggregatedRecord::new(2024, 3, 125.0).with_labels("Revenue", "-", "");
/// assert_eq!(record.label_path(RowDimension::HierarchyAccount).as_slice(), &["Revenue"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
    /// First hierarchy level
    #[serde(default)]
    pub col_label_1: String,
    /// Second hierarchy level
    #[serde(default)]
    pub col_label_2: String,
    /// Third hierarchy level
    #[serde(default)]
    pub col_label_3: String,
    /// Summed measure for this bucket (may be negative)
    pub total_amount: f64,
}

impl AggregatedRecord {
    /// Create a record with empty labels
    pub fn new(year: i32, month: u32, total_amount: f64) -> Self {
        Self {
            year,
            month,
            col_label_1: String::new(),
            col_label_2: String::new(),
            col_label_3: String::new(),
            total_amount,
        }
    }

    /// Set all three label levels
    pub fn with_labels(
        mut self,
        label_1: impl Into<String>,
        label_2: impl Into<String>,
        label_3: impl Into<String>,
    ) -> Self {
        self.col_label_1 = label_1.into();
        self.col_label_2 = label_2.into();
        self.col_label_3 = label_3.into();
        self
    }

    /// Label fields in hierarchy order
    pub fn labels(&self) -> [&str; MAX_LABEL_DEPTH] {
        [&self.col_label_1, &self.col_label_2, &self.col_label_3]
    }

    /// Ordered label path for the given row dimension
    ///
    /// The first empty or sentinel segment terminates the path; nothing
    /// below it is used even if deeper labels are present.
    pub fn label_path(&self, dimension: RowDimension) -> LabelPath<'_> {
        self.labels()
            .into_iter()
            .take(dimension.depth())
            .take_while(|label| !is_blank_label(label))
            .collect()
    }

    /// Check the record at the ingestion boundary
    ///
    /// The pivot engine assumes well-formed numbers; sources call this
    /// before handing records over.
    pub fn validate(&self) -> Result<()> {
        if !self.total_amount.is_finite() {
            return Err(PivotError::InvalidRecord(format!(
                "non-finite amount {} for {}-{:02}",
                self.total_amount, self.year, self.month
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(PivotError::InvalidRecord(format!(
                "month must be between 1-12, got {}",
                self.month
            )));
        }
        // Years are compared as strings when deriving columns
        if !(1000..=9999).contains(&self.year) {
            return Err(PivotError::InvalidRecord(format!(
                "year must have four digits, got {}",
                self.year
            )));
        }
        Ok(())
    }
}

/// Whether a label terminates a hierarchy path
pub fn is_blank_label(label: &str) -> bool {
    label.is_empty() || label == SENTINEL_LABEL
}

/// Row hierarchy selector
///
/// Chooses how many of the record's label fields nest into row groups.
///
/// # Examples
/// ```
/// use salespivot_core::types::RowDimension;
/// use std::str::FromStr;
///
/// let dimension = RowDimension::from_str("hierarchy_ba_pss").unwrap();
/// assert_eq!(dimension.depth(), 2);
/// assert_eq!(RowDimension::Product.to_string(), "product");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowDimension {
    /// Account > Group > Business Area
    #[default]
    HierarchyAccount,
    /// Business Area > Product/Service
    HierarchyBaPss,
    /// Business area only
    BusinessArea,
    /// Product only
    Product,
}

impl RowDimension {
    /// All dimensions in display order
    pub const ALL: [RowDimension; 4] = [
        Self::HierarchyAccount,
        Self::HierarchyBaPss,
        Self::BusinessArea,
        Self::Product,
    ];

    /// Number of label fields composing the row hierarchy
    pub fn depth(self) -> usize {
        match self {
            Self::HierarchyAccount => 3,
            Self::HierarchyBaPss => 2,
            Self::BusinessArea | Self::Product => 1,
        }
    }

    /// Wire name used by the aggregation endpoint
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HierarchyAccount => "hierarchy_account",
            Self::HierarchyBaPss => "hierarchy_ba_pss",
            Self::BusinessArea => "business_area",
            Self::Product => "product",
        }
    }
}

impl fmt::Display for RowDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowDimension {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.as_str() == normalized)
            .ok_or_else(|| PivotError::UnknownDimension(s.to_string()))
    }
}

/// Fully qualified hierarchy path identifying a pivot node
///
/// Levels are joined with [`PATH_SEPARATOR`]. The id only depends on the raw
/// labels, so it stays stable across re-aggregation.
///
/// # Examples
/// ```
/// use salespivot_core::types::NodeId;
///
/// let id = NodeId::from_path(&["Revenue", "Hardware"]);
/// assert_eq!(id.as_str(), "Revenue|Hardware");
/// assert_eq!(id.depth(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from an already joined path
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Join path segments into a NodeId
    pub fn from_path(segments: &[&str]) -> Self {
        let mut id = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                id.push(PATH_SEPARATOR);
            }
            id.push_str(segment);
        }
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of levels in the path
    pub fn depth(&self) -> usize {
        self.0.split(PATH_SEPARATOR).count()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A time bucket in the column axis
///
/// Rendered as `"YYYY"`, `"YYYY-MM"` or `"YYYY-Total"`. Keys order
/// chronologically: months of a year, then its subtotal, then the plain
/// year bucket.
///
/// # Examples
/// ```
/// use salespivot_core::types::ColumnKey;
///
/// let key: ColumnKey = "2024-03".parse().unwrap();
/// assert_eq!(key, ColumnKey::Month { year: 2024, month: 3 });
/// assert_eq!(key.to_string(), "2024-03");
/// assert_eq!(key.prior_year().to_string(), "2023-03");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    /// Whole-year bucket, shown when the year is collapsed
    Year(i32),
    /// Single month of a year
    Month {
        /// Calendar year
        year: i32,
        /// Calendar month, 1-12
        month: u32,
    },
    /// Year subtotal, shown after the months of an expanded year
    YearTotal(i32),
}

impl ColumnKey {
    /// The three buckets one record contributes to
    pub fn buckets(year: i32, month: u32) -> [ColumnKey; 3] {
        [
            Self::Year(year),
            Self::Month { year, month },
            Self::YearTotal(year),
        ]
    }

    /// Year portion of the key
    pub fn year(&self) -> i32 {
        match *self {
            Self::Year(year) | Self::YearTotal(year) | Self::Month { year, .. } => year,
        }
    }

    /// Same-shaped key one year earlier
    pub fn prior_year(&self) -> ColumnKey {
        match *self {
            Self::Year(year) => Self::Year(year.saturating_sub(1)),
            Self::Month { year, month } => Self::Month {
                year: year.saturating_sub(1),
                month,
            },
            Self::YearTotal(year) => Self::YearTotal(year.saturating_sub(1)),
        }
    }

    fn sort_slot(&self) -> u32 {
        match *self {
            Self::Month { month, .. } => month,
            Self::YearTotal(_) => 13,
            Self::Year(_) => 14,
        }
    }
}

impl PartialOrd for ColumnKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ColumnKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year()
            .cmp(&other.year())
            .then_with(|| self.sort_slot().cmp(&other.sort_slot()))
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Month { year, month } => write!(f, "{year}-{month:02}"),
            Self::YearTotal(year) => write!(f, "{year}-Total"),
        }
    }
}

impl FromStr for ColumnKey {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PivotError::InvalidColumnKey(s.to_string());
        match s.split_once('-') {
            None => s.parse::<i32>().map(Self::Year).map_err(|_| invalid()),
            Some((year, "Total")) => year
                .parse::<i32>()
                .map(Self::YearTotal)
                .map_err(|_| invalid()),
            Some((year, month)) => {
                let year = year.parse::<i32>().map_err(|_| invalid())?;
                let month = month.parse::<u32>().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
                Ok(Self::Month { year, month })
            }
        }
    }
}

impl Serialize for ColumnKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColumnKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
