//! Year-over-year comparison for pivot cells
//!
//! A cell is compared against the same-shaped column one year earlier in the
//! same node: `2024-03` against `2023-03`, `2024-Total` against
//! `2023-Total`, `2024` against `2023`.

use crate::error::Result;
use crate::pivot::PivotNode;
use crate::types::ColumnKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Current value above prior
    Up,
    /// Current value below prior
    Down,
    /// No change
    Flat,
}

/// Year-over-year outcome for one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YoyDelta {
    /// Current value is zero; shown as a neutral placeholder
    Placeholder,
    /// Prior value is zero or missing; no percentage
    NotApplicable,
    /// Relative change against the prior year
    Change {
        /// Change in percent of the prior value's magnitude
        percent: f64,
        /// Direction of the change
        trend: Trend,
    },
}

impl YoyDelta {
    /// Compare a current value against the prior-year value
    ///
    /// # Examples
    /// ```
    /// use salespivot_core::delta::{Trend, YoyDelta};
    ///
    /// let delta = YoyDelta::between(200.0, 150.0);
    /// assert_eq!(delta.to_string(), "+33.3%");
    /// assert!(matches!(delta, YoyDelta::Change { trend: Trend::Up, .. }));
    ///
    /// assert_eq!(YoyDelta::between(0.0, 150.0), YoyDelta::Placeholder);
    /// assert_eq!(YoyDelta::between(80.0, 0.0), YoyDelta::NotApplicable);
    /// ```
    pub fn between(current: f64, prior: f64) -> Self {
        if current == 0.0 {
            return Self::Placeholder;
        }
        if prior == 0.0 {
            return Self::NotApplicable;
        }

        let diff = current - prior;
        let trend = if diff > 0.0 {
            Trend::Up
        } else if diff < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        };

        Self::Change {
            percent: diff / prior.abs() * 100.0,
            trend,
        }
    }

    /// Trend of the change, if there is one
    pub fn trend(&self) -> Option<Trend> {
        match self {
            Self::Change { trend, .. } => Some(*trend),
            _ => None,
        }
    }
}

impl fmt::Display for YoyDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => f.write_str("—"),
            Self::NotApplicable => f.write_str("n/a"),
            Self::Change { percent, .. } => write!(f, "{percent:+.1}%"),
        }
    }
}

/// Year-over-year delta for a node's cell
pub fn year_over_year(node: &PivotNode, key: &ColumnKey) -> YoyDelta {
    YoyDelta::between(node.value(key), node.value(&key.prior_year()))
}

/// Prior-year column key for a raw key string
///
/// ```
/// use salespivot_core::delta::prior_column_key;
///
/// assert_eq!(prior_column_key("2024-Total").unwrap(), "2023-Total");
/// assert_eq!(prior_column_key("2024-01").unwrap(), "2023-01");
/// ```
pub fn prior_column_key(key: &str) -> Result<String> {
    let key: ColumnKey = key.parse()?;
    Ok(key.prior_year().to_string())
}
