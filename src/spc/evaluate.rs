//! Chart evaluation entry points.
//!
//! Ties the pipeline together: aggregation, limits, run rules and capability.
//! Results are plain records; rounding for display is applied separately via
//! `rounded()`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use super::chart::{round_to, ChartPoint, ChartResult, ChartStatus, ControlLimits};
use super::rules::{individual_status, DispersionRules, RuleId, RuleSet, WesternElectricRules, Zones};
use super::subgroup::{aggregate, Observation, SubgroupStatistic};
use super::variables::{
    individual_limits, range_limits, range_sigma, sigma_limits, std_dev_sigma, xbar_limits,
    SubgroupSummary,
};
use crate::capability::SpecLimits;
use crate::error::{Result, SpcError};

/// Decimal places used when rounding results for output.
pub const OUTPUT_DECIMALS: u32 = 4;

/// Decimal places used for the Individual chart Cpk.
pub const CPK_DECIMALS: u32 = 3;

// ---------------------------------------------------------------------------
// Individual chart
// ---------------------------------------------------------------------------

/// Evaluation of an Individual chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualEvaluation {
    /// Control status.
    pub status: ChartStatus,
    /// Rules that fired.
    pub violated_rules: Vec<RuleId>,
    /// Capability; absent when the window has no spread.
    pub cpk: Option<f64>,
    /// Window mean.
    pub mean: f64,
    /// Window population standard deviation.
    pub std_dev: f64,
    /// Upper control limit; absent when there is too little data.
    pub ucl: Option<f64>,
    /// Lower control limit; absent when there is too little data.
    pub lcl: Option<f64>,
}

impl IndividualEvaluation {
    /// Neutral result for a stream with a single measurement.
    pub fn insufficient(value: f64) -> Self {
        Self {
            status: ChartStatus::Ok,
            violated_rules: Vec::new(),
            cpk: None,
            mean: value,
            std_dev: 0.0,
            ucl: None,
            lcl: None,
        }
    }

    /// Copy rounded for output: 4 decimals, 3 for Cpk.
    pub fn rounded(&self) -> Self {
        Self {
            status: self.status,
            violated_rules: self.violated_rules.clone(),
            cpk: self.cpk.map(|c| round_to(c, CPK_DECIMALS)),
            mean: round_to(self.mean, OUTPUT_DECIMALS),
            std_dev: round_to(self.std_dev, OUTPUT_DECIMALS),
            ucl: self.ucl.map(|v| round_to(v, OUTPUT_DECIMALS)),
            lcl: self.lcl.map(|v| round_to(v, OUTPUT_DECIMALS)),
        }
    }
}

/// Evaluate the latest values of an Individual chart.
///
/// `window_mean` and `window_std_dev` are the trailing-window statistics
/// (see [`window_statistics`](super::window_statistics)). Capability uses
/// the default `mean +/- 3 sigma` limits, so a non-zero spread always
/// reports Cpk = 1.0.
///
/// # Examples
///
/// ```
/// use u_spc::spc::{evaluate_individual, ChartStatus};
///
/// let values = [10.0, 10.2, 9.9, 10.1, 9.8];
/// let eval = evaluate_individual(&values, 10.0, 0.15);
/// assert_eq!(eval.status, ChartStatus::Ok);
/// assert!(eval.violated_rules.is_empty());
/// ```
pub fn evaluate_individual(values: &[f64], window_mean: f64, window_std_dev: f64) -> IndividualEvaluation {
    individual(values, window_mean, window_std_dev, None)
}

/// Like [`evaluate_individual`], with capability computed against `spec`.
pub fn evaluate_individual_against(
    values: &[f64],
    window_mean: f64,
    window_std_dev: f64,
    spec: &SpecLimits,
) -> IndividualEvaluation {
    individual(values, window_mean, window_std_dev, Some(spec))
}

fn individual(
    values: &[f64],
    mean: f64,
    std_dev: f64,
    spec: Option<&SpecLimits>,
) -> IndividualEvaluation {
    let limits = individual_limits(mean, std_dev);
    let zones = Zones::individual(limits.clone(), std_dev);
    let violated_rules = WesternElectricRules.check(values, &zones);
    let status = individual_status(values, &zones, &violated_rules);

    let cpk = (std_dev > 0.0).then(|| {
        spec.copied()
            .unwrap_or_else(|| SpecLimits::from_process(mean, std_dev))
            .capability(mean, std_dev)
    });

    tracing::debug!(
        points = values.len(),
        mean,
        std_dev,
        ucl = limits.ucl,
        lcl = limits.lcl,
        violations = violated_rules.len(),
        %status,
        "evaluated individual chart"
    );

    IndividualEvaluation {
        status,
        violated_rules,
        cpk,
        mean,
        std_dev,
        ucl: Some(limits.ucl),
        lcl: Some(limits.lcl),
    }
}

// ---------------------------------------------------------------------------
// Subgrouped charts
// ---------------------------------------------------------------------------

/// Dispersion chart paired with the X-bar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispersionChart {
    /// Range chart; sigma = R-bar / d2.
    #[default]
    #[serde(rename = "R")]
    Range,
    /// Standard deviation chart; sigma = S-bar / c4.
    #[serde(rename = "S")]
    Sigma,
}

impl FromStr for DispersionChart {
    type Err = SpcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "R" | "r" => Ok(Self::Range),
            "S" | "s" => Ok(Self::Sigma),
            other => Err(SpcError::UnknownChartType(other.to_string())),
        }
    }
}

impl std::fmt::Display for DispersionChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispersionChart::Range => write!(f, "R"),
            DispersionChart::Sigma => write!(f, "S"),
        }
    }
}

/// Evaluation of an X-bar chart and its dispersion chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupedEvaluation {
    /// X-bar chart; `capability` holds Cpk.
    pub xbar: ChartResult,
    /// R or S chart.
    pub dispersion: ChartResult,
    /// Which dispersion chart was evaluated.
    pub chart: DispersionChart,
    /// Grand mean; absent without a complete subgroup.
    pub overall_mean: Option<f64>,
    /// Within-subgroup sigma estimate; absent without a complete subgroup.
    pub overall_sigma: Option<f64>,
    /// Ppk from the overall sample standard deviation of the charted values.
    pub ppk: Option<f64>,
    /// Subgroup size n.
    pub subgroup_size: usize,
}

impl SubgroupedEvaluation {
    fn empty(subgroup_size: usize, chart: DispersionChart) -> Self {
        Self {
            xbar: ChartResult::empty(),
            dispersion: ChartResult::empty(),
            chart,
            overall_mean: None,
            overall_sigma: None,
            ppk: None,
            subgroup_size,
        }
    }

    /// Whether both charts are in control.
    pub fn is_in_control(&self) -> bool {
        self.xbar.is_in_control() && self.dispersion.is_in_control()
    }

    /// Copy rounded to 4 decimals for output.
    pub fn rounded(&self) -> Self {
        Self {
            xbar: self.xbar.rounded(OUTPUT_DECIMALS),
            dispersion: self.dispersion.rounded(OUTPUT_DECIMALS),
            chart: self.chart,
            overall_mean: self.overall_mean.map(|v| round_to(v, OUTPUT_DECIMALS)),
            overall_sigma: self.overall_sigma.map(|v| round_to(v, OUTPUT_DECIMALS)),
            ppk: self.ppk.map(|v| round_to(v, OUTPUT_DECIMALS)),
            subgroup_size: self.subgroup_size,
        }
    }
}

/// Evaluate X-bar and R/S charts over raw values grouped `subgroup_size` at a time.
///
/// Capability uses the default `mean +/- 3 sigma` limits.
///
/// # Errors
///
/// - [`SpcError::InvalidSubgroupSize`] if `subgroup_size == 0`
/// - [`SpcError::SampleStdDevUndefined`] for an S chart with `subgroup_size == 1`
///
/// # Examples
///
/// ```
/// use u_spc::spc::{evaluate_subgrouped, DispersionChart};
///
/// let values = [10.0, 10.4, 9.8, 10.1, 9.9, 10.2, 10.0, 9.7, 10.3];
/// let eval = evaluate_subgrouped(&values, 3, DispersionChart::Range).unwrap();
/// assert_eq!(eval.xbar.points.len(), 3);
/// assert!(eval.xbar.limits.ucl > eval.xbar.limits.cl);
/// ```
pub fn evaluate_subgrouped<T: Observation>(
    values: &[T],
    subgroup_size: usize,
    chart: DispersionChart,
) -> Result<SubgroupedEvaluation> {
    subgrouped(values, subgroup_size, chart, None)
}

/// Like [`evaluate_subgrouped`], with capability computed against `spec`.
pub fn evaluate_subgrouped_against<T: Observation>(
    values: &[T],
    subgroup_size: usize,
    chart: DispersionChart,
    spec: &SpecLimits,
) -> Result<SubgroupedEvaluation> {
    subgrouped(values, subgroup_size, chart, Some(spec))
}

fn subgrouped<T: Observation>(
    values: &[T],
    subgroup_size: usize,
    chart: DispersionChart,
    spec: Option<&SpecLimits>,
) -> Result<SubgroupedEvaluation> {
    if chart == DispersionChart::Sigma && subgroup_size == 1 {
        return Err(SpcError::SampleStdDevUndefined);
    }
    let statistics: Vec<SubgroupStatistic> = aggregate(values, subgroup_size)?.collect();
    let Some(summary) = SubgroupSummary::from_statistics(&statistics, subgroup_size) else {
        tracing::debug!(
            values = values.len(),
            subgroup_size,
            "no complete subgroup, returning neutral evaluation"
        );
        return Ok(SubgroupedEvaluation::empty(subgroup_size, chart));
    };

    let (dispersion_limits, sigma, dispersion_series): (ControlLimits, f64, Vec<f64>) = match chart {
        DispersionChart::Range => (
            range_limits(&summary),
            range_sigma(&summary),
            statistics.iter().map(|s| s.range).collect(),
        ),
        DispersionChart::Sigma => (
            sigma_limits(&summary)?,
            std_dev_sigma(&summary)?,
            statistics
                .iter()
                .map(|s| s.sample_std_dev.unwrap_or(0.0))
                .collect(),
        ),
    };

    let means: Vec<f64> = statistics.iter().map(|s| s.mean).collect();
    let xbar_limits = xbar_limits(&summary);
    let xbar_rules = WesternElectricRules.check(&means, &Zones::from_limits(xbar_limits.clone()));
    let dispersion_rules =
        DispersionRules.check(&dispersion_series, &Zones::from_limits(dispersion_limits.clone()));

    let grand_mean = summary.grand_mean;
    let spec_for = |sigma: f64| {
        spec.copied()
            .unwrap_or_else(|| SpecLimits::from_process(grand_mean, sigma))
    };
    let cpk = (sigma > 0.0).then(|| spec_for(sigma).capability(grand_mean, sigma));
    let ppk = overall_std_dev(values, statistics.len() * subgroup_size)
        .filter(|&overall| overall > 0.0 && sigma > 0.0)
        .map(|overall| spec_for(sigma).capability(grand_mean, overall));

    tracing::debug!(
        subgroups = statistics.len(),
        subgroup_size,
        %chart,
        grand_mean,
        sigma,
        xbar_violations = xbar_rules.len(),
        dispersion_violations = dispersion_rules.len(),
        "evaluated subgroup charts"
    );

    let xbar = ChartResult {
        status: ChartStatus::from_violations(&xbar_rules),
        violated_rules: xbar_rules,
        limits: xbar_limits,
        estimated_sigma: sigma,
        capability: cpk,
        points: chart_points(&statistics, &means),
    };
    let dispersion = ChartResult {
        status: ChartStatus::from_violations(&dispersion_rules),
        violated_rules: dispersion_rules,
        limits: dispersion_limits,
        estimated_sigma: sigma,
        capability: None,
        points: chart_points(&statistics, &dispersion_series),
    };

    Ok(SubgroupedEvaluation {
        xbar,
        dispersion,
        chart,
        overall_mean: Some(grand_mean),
        overall_sigma: Some(sigma),
        ppk,
        subgroup_size,
    })
}

fn chart_points(statistics: &[SubgroupStatistic], series: &[f64]) -> Vec<ChartPoint> {
    statistics
        .iter()
        .zip(series)
        .map(|(s, &value)| ChartPoint {
            index: s.index,
            value,
            timestamp: s.timestamp,
        })
        .collect()
}

// Sample standard deviation of the values that landed in complete subgroups.
fn overall_std_dev<T: Observation>(values: &[T], used: usize) -> Option<f64> {
    let charted: Vec<f64> = values.iter().take(used).map(Observation::value).collect();
    stats::std_dev(&charted)
}
