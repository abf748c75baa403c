//! Reductions applied within a group of values.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// A named aggregate function.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Aggregation {
    /// Sum of values. An empty group sums to zero.
    #[default]
    Sum,
    /// Arithmetic mean
    Mean,
    /// Minimum
    Min,
    /// Maximum
    Max,
    /// Number of valid values
    Count,
    /// Median
    Median,
    /// Sample standard deviation (one delta degree of freedom)
    Std,
}

impl Aggregation {
    /// Reduce a group of valid values.
    ///
    /// Returns `None` when the reduction is undefined for the group, for example the mean of no
    /// values or the standard deviation of a single value.
    pub fn reduce(self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Sum => Some(values.iter().fold(0.0, |acc, v| acc + v)),
            Self::Count => Some(values.len() as f64),
            Self::Mean => mean(values),
            Self::Min => values.iter().copied().reduce(f64::min),
            Self::Max => values.iter().copied().reduce(f64::max),
            Self::Median => median(values),
            Self::Std => std_dev(values),
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}
