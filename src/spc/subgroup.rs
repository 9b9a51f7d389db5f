//! Subgroup aggregation.
//!
//! Splits an ordered stream of observations into consecutive, non-overlapping
//! subgroups of a fixed size and computes the per-subgroup statistics charted
//! by the X-bar, R and S charts. A trailing partial subgroup is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use u_numflow::stats;

use crate::error::{Result, SpcError};

/// A single recorded measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Measured value.
    pub value: f64,
    /// When the value was recorded.
    pub timestamp: DateTime<Utc>,
    /// Zero-based position within its subgroup (traceability only).
    pub subgroup_index: usize,
}

impl Measurement {
    /// Create a measurement that does not belong to a subgroup.
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp,
            subgroup_index: 0,
        }
    }
}

/// Anything that can be aggregated into subgroups.
pub trait Observation {
    /// The measured value.
    fn value(&self) -> f64;

    /// The time the value was recorded, if known.
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Observation for f64 {
    fn value(&self) -> f64 {
        *self
    }
}

impl Observation for Measurement {
    fn value(&self) -> f64 {
        self.value
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }
}

/// Statistics of one complete subgroup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupStatistic {
    /// One-based position of the subgroup in the stream.
    pub index: usize,
    /// Arithmetic mean (X-bar).
    pub mean: f64,
    /// max - min.
    pub range: f64,
    /// Sample standard deviation (n - 1 denominator); `None` when n = 1.
    pub sample_std_dev: Option<f64>,
    /// Timestamp of the middle element (position n / 2).
    pub timestamp: DateTime<Utc>,
}

impl SubgroupStatistic {
    /// Compute the statistics of one subgroup.
    ///
    /// Non-finite values propagate as NaN statistics.
    fn from_chunk<T: Observation>(index: usize, chunk: &[T]) -> Self {
        let values: Vec<f64> = chunk.iter().map(Observation::value).collect();
        let mean = stats::mean(&values).unwrap_or(f64::NAN);
        let range = match (stats::max(&values), stats::min(&values)) {
            (Some(max), Some(min)) => max - min,
            _ => f64::NAN,
        };
        let sample_std_dev = if values.len() >= 2 {
            Some(stats::std_dev(&values).unwrap_or(f64::NAN))
        } else {
            None
        };
        let timestamp = chunk
            .get(chunk.len() / 2)
            .and_then(Observation::timestamp)
            .unwrap_or_else(Utc::now);

        Self {
            index,
            mean,
            range,
            sample_std_dev,
            timestamp,
        }
    }
}

/// Lazy iterator over the complete subgroups of a slice.
///
/// Created by [`aggregate`].
pub struct Subgroups<'a, T> {
    chunks: std::iter::Enumerate<std::slice::ChunksExact<'a, T>>,
}

impl<T: Observation> Iterator for Subgroups<'_, T> {
    type Item = SubgroupStatistic;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks
            .next()
            .map(|(i, chunk)| SubgroupStatistic::from_chunk(i + 1, chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<T: Observation> ExactSizeIterator for Subgroups<'_, T> {}

/// Partition `values` into subgroups of exactly `n` observations.
///
/// Yields `values.len() / n` subgroups in input order; trailing values that
/// do not fill a subgroup are discarded.
///
/// # Errors
///
/// [`SpcError::InvalidSubgroupSize`] if `n == 0`.
///
/// # Examples
///
/// ```
/// use u_spc::spc::aggregate;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
/// let groups: Vec<_> = aggregate(&values, 4).unwrap().collect();
/// assert_eq!(groups.len(), 2);
/// assert!((groups[0].mean - 2.5).abs() < 1e-12);
/// assert!((groups[1].range - 3.0).abs() < 1e-12);
/// ```
pub fn aggregate<T: Observation>(values: &[T], n: usize) -> Result<Subgroups<'_, T>> {
    if n == 0 {
        return Err(SpcError::InvalidSubgroupSize(n));
    }
    Ok(Subgroups {
        chunks: values.chunks_exact(n).enumerate(),
    })
}
