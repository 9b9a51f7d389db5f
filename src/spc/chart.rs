//! Core control chart types.
//!
//! Defines the building blocks shared by every chart: control limits, the
//! charted series, the control status and the per-chart result record.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::RuleId;

/// Control limits for a chart.
///
/// # Invariants
///
/// - `lcl <= cl <= ucl` for non-negative dispersion
/// - `lower_bounded == false` means the chart has no lower limit; `lcl` is
///   then reported (usually 0) but never checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    /// Upper control limit.
    pub ucl: f64,
    /// Center line.
    #[serde(rename = "center")]
    pub cl: f64,
    /// Lower control limit.
    pub lcl: f64,
    /// Whether points below `lcl` count as violations.
    #[serde(default = "default_lower_bounded")]
    pub lower_bounded: bool,
}

fn default_lower_bounded() -> bool {
    true
}

impl ControlLimits {
    /// Limits placed symmetrically at `cl +/- half_width`.
    pub fn symmetric(cl: f64, half_width: f64) -> Self {
        Self {
            ucl: cl + half_width,
            cl,
            lcl: cl - half_width,
            lower_bounded: true,
        }
    }

    /// Limits with an enforced lower bound.
    pub fn new(ucl: f64, cl: f64, lcl: f64) -> Self {
        Self {
            ucl,
            cl,
            lcl,
            lower_bounded: true,
        }
    }

    /// Marks the lower limit as "not applicable".
    pub fn without_lower_limit(mut self) -> Self {
        self.lower_bounded = false;
        self
    }

    /// One-sigma-equivalent width: (UCL - CL) / 3.
    pub fn sigma_width(&self) -> f64 {
        (self.ucl - self.cl) / 3.0
    }

    /// Whether `value` lies outside the limits that apply to this chart.
    pub fn is_beyond(&self, value: f64) -> bool {
        value > self.ucl || (self.lower_bounded && value < self.lcl)
    }
}

/// A single point on a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// One-based subgroup index.
    pub index: usize,
    /// The charted statistic (subgroup mean, range or standard deviation).
    pub value: f64,
    /// Representative timestamp of the subgroup.
    pub timestamp: DateTime<Utc>,
}

/// Process state reported for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChartStatus {
    /// No rule fired.
    #[default]
    Ok,
    /// No rule fired, but the latest point is beyond 2 sigma.
    Warning,
    /// At least one run rule fired.
    OutOfControl,
}

impl ChartStatus {
    /// Status implied by a rule evaluation alone (no warning zone).
    pub fn from_violations(violations: &[RuleId]) -> Self {
        if violations.is_empty() {
            Self::Ok
        } else {
            Self::OutOfControl
        }
    }
}

impl std::fmt::Display for ChartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartStatus::Ok => write!(f, "OK"),
            ChartStatus::Warning => write!(f, "WARNING"),
            ChartStatus::OutOfControl => write!(f, "OUT_OF_CONTROL"),
        }
    }
}

/// Evaluation of one chart (X-bar, R or S).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartResult {
    /// Control status.
    pub status: ChartStatus,
    /// Rules that fired, in rule order, each at most once.
    pub violated_rules: Vec<RuleId>,
    /// Center line and control limits.
    #[serde(flatten)]
    pub limits: ControlLimits,
    /// Process sigma estimate backing the chart (>= 0).
    pub estimated_sigma: f64,
    /// Capability index, when one applies to this chart.
    pub capability: Option<f64>,
    /// The charted series.
    pub points: Vec<ChartPoint>,
}

impl ChartResult {
    /// Result for a chart with no data: OK, no rules, zero limits.
    pub fn empty() -> Self {
        Self {
            status: ChartStatus::Ok,
            violated_rules: Vec::new(),
            limits: ControlLimits::new(0.0, 0.0, 0.0),
            estimated_sigma: 0.0,
            capability: None,
            points: Vec::new(),
        }
    }

    /// Whether the chart is in statistical control.
    pub fn is_in_control(&self) -> bool {
        self.status != ChartStatus::OutOfControl
    }

    /// Copy with limits, sigma, capability and point values rounded to
    /// `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Self {
        Self {
            status: self.status,
            violated_rules: self.violated_rules.clone(),
            limits: ControlLimits {
                ucl: round_to(self.limits.ucl, decimals),
                cl: round_to(self.limits.cl, decimals),
                lcl: round_to(self.limits.lcl, decimals),
                lower_bounded: self.limits.lower_bounded,
            },
            estimated_sigma: round_to(self.estimated_sigma, decimals),
            capability: self.capability.map(|c| round_to(c, decimals)),
            points: self
                .points
                .iter()
                .map(|p| ChartPoint {
                    value: round_to(p.value, decimals),
                    ..p.clone()
                })
                .collect(),
        }
    }
}

/// Round `value` half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_limits() {
        let limits = ControlLimits::symmetric(25.0, 5.0);
        assert!((limits.ucl - 30.0).abs() < f64::EPSILON);
        assert!((limits.cl - 25.0).abs() < f64::EPSILON);
        assert!((limits.lcl - 20.0).abs() < f64::EPSILON);
        assert!(limits.lower_bounded);
    }

    #[test]
    fn test_sigma_width() {
        let limits = ControlLimits::symmetric(25.0, 3.0);
        assert!((limits.sigma_width() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_is_beyond_respects_missing_lower_limit() {
        let limits = ControlLimits::new(10.0, 5.0, 0.0).without_lower_limit();
        assert!(limits.is_beyond(10.5));
        assert!(!limits.is_beyond(-1.0));

        let bounded = ControlLimits::new(10.0, 5.0, 0.0);
        assert!(bounded.is_beyond(-1.0));
    }

    #[test]
    fn test_on_limit_is_not_beyond() {
        let limits = ControlLimits::new(30.0, 25.0, 20.0);
        assert!(!limits.is_beyond(30.0));
        assert!(!limits.is_beyond(20.0));
    }

    #[test]
    fn test_status_from_violations() {
        assert_eq!(ChartStatus::from_violations(&[]), ChartStatus::Ok);
        assert_eq!(
            ChartStatus::from_violations(&[RuleId::Rule4]),
            ChartStatus::OutOfControl
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ChartStatus::Ok.to_string(), "OK");
        assert_eq!(ChartStatus::Warning.to_string(), "WARNING");
        assert_eq!(ChartStatus::OutOfControl.to_string(), "OUT_OF_CONTROL");
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ChartStatus::OutOfControl).unwrap();
        assert_eq!(json, "\"OUT_OF_CONTROL\"");
    }

    #[test]
    fn test_chart_result_wire_names() {
        let result = ChartResult {
            limits: ControlLimits::symmetric(100.0, 3.0),
            ..ChartResult::empty()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["center"], 100.0);
        assert_eq!(json["ucl"], 103.0);
        assert_eq!(json["status"], "OK");
        assert!(json["capability"].is_null());
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(2.291_287_8, 4) - 2.2913).abs() < 1e-12);
        assert!((round_to(0.99951, 3) - 1.0).abs() < 1e-12);
        assert!((round_to(-1.23456, 2) + 1.23).abs() < 1e-12);
    }

    #[test]
    fn test_rounded_keeps_status_and_rules() {
        let result = ChartResult {
            status: ChartStatus::OutOfControl,
            violated_rules: vec![RuleId::Rule1],
            limits: ControlLimits::symmetric(1.234_567, 0.5),
            estimated_sigma: 0.123_456,
            capability: Some(1.000_04),
            points: Vec::new(),
        };
        let r = result.rounded(4);
        assert_eq!(r.status, ChartStatus::OutOfControl);
        assert_eq!(r.violated_rules, vec![RuleId::Rule1]);
        assert!((r.limits.cl - 1.2346).abs() < 1e-12);
        assert!((r.estimated_sigma - 0.1235).abs() < 1e-12);
        assert!((r.capability.unwrap() - 1.0).abs() < 1e-12);
    }
}
