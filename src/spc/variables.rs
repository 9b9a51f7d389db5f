//! Control limits for variables charts: Individual, X-bar, R and S.
//!
//! Every function here is a pure function of already-aggregated statistics.
//! Subgroup statistics come from [`aggregate`](super::aggregate); factors come
//! from the [constants table](super::constants).
//!
//! # Algorithm
//!
//! 1. Individual: CL = window mean, UCL/LCL = CL +/- 3 * stdDev.
//! 2. X-bar: CL = X-double-bar, UCL/LCL = CL +/- A2 * R-bar.
//! 3. R: CL = R-bar, UCL = D4 * R-bar, LCL = D3 * R-bar.
//! 4. S: CL = S-bar, UCL = B4 * S-bar, LCL = B3 * S-bar.
//!
//! R and S charts whose lower factor is 0 have no lower limit.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - Shewhart, W.A. (1931). *Economic Control of Quality of Manufactured Product*.

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use super::chart::ControlLimits;
use super::constants::{lookup, ChartConstants};
use super::subgroup::SubgroupStatistic;
use crate::error::{Result, SpcError};

/// Default trailing window for Individual charts.
pub const DEFAULT_WINDOW: usize = 30;

/// Mean and population standard deviation of a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStatistics {
    /// Arithmetic mean of the window.
    pub mean: f64,
    /// Population standard deviation, sqrt(E[x^2] - E[x]^2).
    pub std_dev: f64,
    /// Number of values in the window.
    pub count: usize,
}

/// Mean and population standard deviation over the last `window` values.
///
/// Returns `None` if `values` is empty, `window` is 0, or the window holds a
/// non-finite value.
pub fn window_statistics(values: &[f64], window: usize) -> Option<WindowStatistics> {
    if window == 0 {
        return None;
    }
    let tail = &values[values.len().saturating_sub(window)..];
    let mean = stats::mean(tail)?;
    let count = tail.len();
    let std_dev = if count < 2 {
        0.0
    } else {
        // Sample variance rescaled to the population denominator.
        let variance = stats::variance(tail)? * (count - 1) as f64 / count as f64;
        variance.max(0.0).sqrt()
    };
    Some(WindowStatistics {
        mean,
        std_dev,
        count,
    })
}

/// Limits for an Individual chart: `mean +/- 3 * std_dev`.
pub fn individual_limits(mean: f64, std_dev: f64) -> ControlLimits {
    ControlLimits::symmetric(mean, 3.0 * std_dev)
}

/// Grand statistics over a set of subgroups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupSummary {
    /// Subgroup size n.
    pub subgroup_size: usize,
    /// Number of subgroups summarized.
    pub count: usize,
    /// Average of subgroup means.
    pub grand_mean: f64,
    /// Average subgroup range.
    pub r_bar: f64,
    /// Average subgroup sample standard deviation; `None` when n = 1.
    pub s_bar: Option<f64>,
    /// Chart constants for `subgroup_size`, looked up once.
    pub constants: ChartConstants,
}

impl SubgroupSummary {
    /// Summarize subgroup statistics of size `subgroup_size`.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_statistics(statistics: &[SubgroupStatistic], subgroup_size: usize) -> Option<Self> {
        let means: Vec<f64> = statistics.iter().map(|s| s.mean).collect();
        let ranges: Vec<f64> = statistics.iter().map(|s| s.range).collect();
        let grand_mean = average(&means)?;
        let r_bar = average(&ranges)?;
        let s_bar = statistics
            .iter()
            .map(|s| s.sample_std_dev)
            .collect::<Option<Vec<f64>>>()
            .and_then(|sds| average(&sds));

        Some(Self {
            subgroup_size,
            count: statistics.len(),
            grand_mean,
            r_bar,
            s_bar,
            constants: lookup(subgroup_size),
        })
    }

    /// Chart constants for this subgroup size.
    pub fn constants(&self) -> ChartConstants {
        self.constants
    }

    /// S-bar, or an error when the subgroups have no sample standard deviation.
    pub fn require_s_bar(&self) -> Result<f64> {
        self.s_bar.ok_or(SpcError::SampleStdDevUndefined)
    }
}

// Plain mean that lets NaN through instead of rejecting it.
fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(stats::mean(values).unwrap_or(f64::NAN))
}

/// X-bar chart limits: `X-double-bar +/- A2 * R-bar`.
pub fn xbar_limits(summary: &SubgroupSummary) -> ControlLimits {
    let a2 = summary.constants().a2;
    ControlLimits::symmetric(summary.grand_mean, a2 * summary.r_bar)
}

/// R chart limits: `D3 * R-bar .. D4 * R-bar` around `R-bar`.
pub fn range_limits(summary: &SubgroupSummary) -> ControlLimits {
    let c = summary.constants();
    let limits = ControlLimits::new(c.d4 * summary.r_bar, summary.r_bar, c.d3 * summary.r_bar);
    if c.has_range_lower_limit() {
        limits
    } else {
        limits.without_lower_limit()
    }
}

/// S chart limits: `B3 * S-bar .. B4 * S-bar` around `S-bar`.
///
/// # Errors
///
/// [`SpcError::SampleStdDevUndefined`] when the subgroups have size 1.
pub fn sigma_limits(summary: &SubgroupSummary) -> Result<ControlLimits> {
    let s_bar = summary.require_s_bar()?;
    let c = summary.constants();
    let limits = ControlLimits::new(c.b4 * s_bar, s_bar, c.b3 * s_bar);
    Ok(if c.has_sigma_lower_limit() {
        limits
    } else {
        limits.without_lower_limit()
    })
}

/// Range-based sigma estimate: `R-bar / d2`.
pub fn range_sigma(summary: &SubgroupSummary) -> f64 {
    (summary.r_bar / summary.constants().d2).max(0.0)
}

/// Standard-deviation-based sigma estimate: `S-bar / c4`.
///
/// # Errors
///
/// [`SpcError::SampleStdDevUndefined`] when the subgroups have size 1.
pub fn std_dev_sigma(summary: &SubgroupSummary) -> Result<f64> {
    let s_bar = summary.require_s_bar()?;
    Ok((s_bar / summary.constants().c4).max(0.0))
}
