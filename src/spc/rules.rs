//! Western Electric run rules.
//!
//! Detects non-random patterns in a charted series given its center line,
//! control limits and a one-sigma dispersion unit.
//!
//! | Rule  | Pattern |
//! |-------|---------|
//! | Rule1 | latest point beyond the control limits |
//! | Rule2 | 2 of 3 consecutive points beyond 2 sigma, same side |
//! | Rule3 | 4 of 5 consecutive points beyond 1 sigma |
//! | Rule4 | latest 8 points all above or all below center |
//!
//! Rule 3 counts points beyond 1 sigma on either side of center; only Rule 2
//! requires the points to share a side.
//!
//! Evaluation needs at least [`MIN_POINTS`] points and a strictly positive
//! sigma; otherwise no rule fires.
//!
//! # References
//!
//! - Western Electric (1956). *Statistical Quality Control Handbook*.
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.

use serde::{Deserialize, Serialize};

use super::chart::{ChartStatus, ControlLimits};

/// Minimum series length for any rule to be evaluated.
pub const MIN_POINTS: usize = 3;

/// Run length for Rule 4.
pub const RUN_LENGTH: usize = 8;

/// Identifier of a Western Electric rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleId {
    /// Latest point beyond the control limits.
    Rule1,
    /// 2 of 3 consecutive points beyond 2 sigma on the same side.
    Rule2,
    /// 4 of 5 consecutive points beyond 1 sigma.
    Rule3,
    /// Latest 8 points on one side of center.
    Rule4,
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleId::Rule1 => "Rule1",
            RuleId::Rule2 => "Rule2",
            RuleId::Rule3 => "Rule3",
            RuleId::Rule4 => "Rule4",
        };
        f.write_str(name)
    }
}

/// Reference frame the rules are evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct Zones {
    /// Center line and control limits (Rule 1, Rule 4).
    pub limits: ControlLimits,
    /// One-sigma dispersion unit (Rules 2 and 3).
    pub sigma: f64,
}

impl Zones {
    /// Zones for an Individual chart, where sigma is the window std dev.
    pub fn individual(limits: ControlLimits, std_dev: f64) -> Self {
        Self {
            limits,
            sigma: std_dev,
        }
    }

    /// Zones for a subgroup chart, where sigma is (UCL - CL) / 3.
    pub fn from_limits(limits: ControlLimits) -> Self {
        let sigma = limits.sigma_width();
        Self { limits, sigma }
    }

    fn center(&self) -> f64 {
        self.limits.cl
    }

    fn can_evaluate(&self, series: &[f64]) -> bool {
        series.len() >= MIN_POINTS && self.sigma > 0.0
    }
}

/// A set of run rules.
pub trait RuleSet {
    /// Rules that fire on `series`, deduplicated, in rule order.
    fn check(&self, series: &[f64], zones: &Zones) -> Vec<RuleId>;
}

/// Western Electric Rules 1–4, used for Individual and X-bar charts.
pub struct WesternElectricRules;

/// Rules 1 and 4 only, used for R and S charts.
///
/// Dispersion statistics are skewed and often have no lower limit, so the
/// zone tests (Rules 2 and 3) are not applied to them.
pub struct DispersionRules;

// ---------------------------------------------------------------------------
// Individual rules
// ---------------------------------------------------------------------------

fn check_rule1(series: &[f64], zones: &Zones) -> bool {
    series
        .last()
        .is_some_and(|&last| zones.limits.is_beyond(last))
}

fn check_rule2(series: &[f64], zones: &Zones) -> bool {
    let upper = zones.center() + 2.0 * zones.sigma;
    let lower = zones.center() - 2.0 * zones.sigma;
    series.windows(3).enumerate().any(|(i, window)| {
        let above = window.iter().filter(|&&v| v > upper).count();
        let below = window.iter().filter(|&&v| v < lower).count();
        let hit = above >= 2 || below >= 2;
        if hit {
            tracing::trace!(window_start = i, above, below, "rule 2 window hit");
        }
        hit
    })
}

fn check_rule3(series: &[f64], zones: &Zones) -> bool {
    let upper = zones.center() + zones.sigma;
    let lower = zones.center() - zones.sigma;
    series.windows(5).enumerate().any(|(i, window)| {
        let beyond = window.iter().filter(|&&v| v > upper || v < lower).count();
        let hit = beyond >= 4;
        if hit {
            tracing::trace!(window_start = i, beyond, "rule 3 window hit");
        }
        hit
    })
}

fn check_rule4(series: &[f64], zones: &Zones) -> bool {
    if series.len() < RUN_LENGTH {
        return false;
    }
    let center = zones.center();
    let tail = &series[series.len() - RUN_LENGTH..];
    tail.iter().all(|&v| v > center) || tail.iter().all(|&v| v < center)
}

// ---------------------------------------------------------------------------
// RuleSet implementations
// ---------------------------------------------------------------------------

impl RuleSet for WesternElectricRules {
    fn check(&self, series: &[f64], zones: &Zones) -> Vec<RuleId> {
        if !zones.can_evaluate(series) {
            return Vec::new();
        }
        let checks: [(RuleId, fn(&[f64], &Zones) -> bool); 4] = [
            (RuleId::Rule1, check_rule1),
            (RuleId::Rule2, check_rule2),
            (RuleId::Rule3, check_rule3),
            (RuleId::Rule4, check_rule4),
        ];
        checks
            .into_iter()
            .filter(|(_, check)| check(series, zones))
            .map(|(id, _)| id)
            .collect()
    }
}

impl RuleSet for DispersionRules {
    fn check(&self, series: &[f64], zones: &Zones) -> Vec<RuleId> {
        if !zones.can_evaluate(series) {
            return Vec::new();
        }
        let mut violations = Vec::new();
        if check_rule1(series, zones) {
            violations.push(RuleId::Rule1);
        }
        if check_rule4(series, zones) {
            violations.push(RuleId::Rule4);
        }
        violations
    }
}

/// Status of an Individual chart.
///
/// - `OutOfControl` if any rule fired
/// - `Warning` if no rule fired, the series has at least [`MIN_POINTS`]
///   points and the latest point is more than 2 sigma from center
/// - `Ok` otherwise
pub fn individual_status(series: &[f64], zones: &Zones, violations: &[RuleId]) -> ChartStatus {
    if !violations.is_empty() {
        return ChartStatus::OutOfControl;
    }
    let near_boundary = series.len() >= MIN_POINTS
        && series
            .last()
            .is_some_and(|&last| (last - zones.center()).abs() > 2.0 * zones.sigma);
    if near_boundary {
        ChartStatus::Warning
    } else {
        ChartStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// CL = 25, sigma = 1, limits 22..28.
    fn unit_zones() -> Zones {
        Zones::from_limits(ControlLimits::new(28.0, 25.0, 22.0))
    }

    // --- Rule 1 ---

    #[test]
    fn test_rule1_latest_above_ucl() {
        let zones = unit_zones();
        assert!(check_rule1(&[25.0, 25.0, 28.5], &zones));
    }

    #[test]
    fn test_rule1_latest_below_lcl() {
        let zones = unit_zones();
        assert!(check_rule1(&[25.0, 25.0, 21.5], &zones));
    }

    #[test]
    fn test_rule1_only_latest_point_counts() {
        let zones = unit_zones();
        assert!(!check_rule1(&[30.0, 25.0, 25.0], &zones));
    }

    #[test]
    fn test_rule1_on_limit_is_not_violation() {
        let zones = unit_zones();
        assert!(!check_rule1(&[25.0, 25.0, 28.0], &zones));
        assert!(!check_rule1(&[25.0, 25.0, 22.0], &zones));
    }

    #[test]
    fn test_rule1_lower_check_skipped_without_lower_limit() {
        let zones = Zones::from_limits(ControlLimits::new(6.0, 3.0, 0.0).without_lower_limit());
        assert!(!check_rule1(&[3.0, 2.0, -1.0], &zones));
    }

    // --- Rule 2 ---

    #[test]
    fn test_rule2_two_of_three_above() {
        // 2 sigma line = 27
        let zones = unit_zones();
        assert!(check_rule2(&[27.5, 25.0, 27.5], &zones));
    }

    #[test]
    fn test_rule2_two_of_three_below() {
        let zones = unit_zones();
        assert!(check_rule2(&[22.5, 25.0, 22.5], &zones));
    }

    #[test]
    fn test_rule2_mixed_sides_do_not_count() {
        let zones = unit_zones();
        assert!(!check_rule2(&[27.5, 25.0, 22.5], &zones));
    }

    #[test]
    fn test_rule2_checks_every_window() {
        // The hit is at the start of the series, not the end.
        let zones = unit_zones();
        assert!(check_rule2(&[27.5, 27.5, 25.0, 25.0, 25.0, 25.0], &zones));
    }

    // --- Rule 3 ---

    #[test]
    fn test_rule3_four_of_five_above() {
        // 1 sigma line = 26
        let zones = unit_zones();
        assert!(check_rule3(&[26.5, 26.5, 25.0, 26.5, 26.5], &zones));
    }

    #[test]
    fn test_rule3_counts_either_side() {
        let zones = unit_zones();
        assert!(check_rule3(&[26.5, 23.5, 25.0, 26.5, 23.5], &zones));
    }

    #[test]
    fn test_rule3_three_of_five_not_enough() {
        let zones = unit_zones();
        assert!(!check_rule3(&[26.5, 25.0, 25.0, 26.5, 26.5], &zones));
    }

    // --- Rule 4 ---

    #[test]
    fn test_rule4_eight_above() {
        let zones = unit_zones();
        assert!(check_rule4(&[25.5; 8], &zones));
    }

    #[test]
    fn test_rule4_eight_below() {
        let zones = unit_zones();
        assert!(check_rule4(&[24.5; 8], &zones));
    }

    #[test]
    fn test_rule4_seven_not_enough() {
        let zones = unit_zones();
        assert!(!check_rule4(&[25.5; 7], &zones));
    }

    #[test]
    fn test_rule4_on_center_breaks_run() {
        let zones = unit_zones();
        assert!(!check_rule4(&[25.0; 8], &zones));
        let mut series = vec![25.5; 8];
        series[3] = 25.0;
        assert!(!check_rule4(&series, &zones));
    }

    #[test]
    fn test_rule4_uses_trailing_run() {
        let zones = unit_zones();
        let mut series = vec![24.0; 3];
        series.extend([25.5; 8]);
        assert!(check_rule4(&series, &zones));
    }

    // --- Rule sets ---

    #[test]
    fn test_western_electric_order_and_dedup() {
        let zones = unit_zones();
        // Many Rule 2 / Rule 3 windows, ends beyond UCL, 8 above center.
        let series = [27.5, 27.5, 27.5, 27.5, 27.5, 27.5, 27.5, 29.0];
        let rules = WesternElectricRules.check(&series, &zones);
        assert_eq!(
            rules,
            vec![RuleId::Rule1, RuleId::Rule2, RuleId::Rule3, RuleId::Rule4]
        );
    }

    #[test]
    fn test_fewer_than_three_points_never_fire() {
        let zones = unit_zones();
        assert!(WesternElectricRules.check(&[100.0, 100.0], &zones).is_empty());
        assert!(DispersionRules.check(&[100.0, 100.0], &zones).is_empty());
    }

    #[test]
    fn test_zero_sigma_never_fires() {
        let zones = Zones::individual(ControlLimits::symmetric(5.0, 0.0), 0.0);
        assert!(WesternElectricRules.check(&[5.0; 10], &zones).is_empty());
        assert!(WesternElectricRules.check(&[5.0, 5.0, 9.0], &zones).is_empty());
    }

    #[test]
    fn test_dispersion_rules_skip_zone_tests() {
        let zones = unit_zones();
        let series = [27.5, 27.5, 25.0];
        assert!(WesternElectricRules.check(&series, &zones).contains(&RuleId::Rule2));
        assert!(DispersionRules.check(&series, &zones).is_empty());
    }

    #[test]
    fn test_random_looking_data_is_clean() {
        let zones = unit_zones();
        let series = [25.5, 24.8, 25.2, 24.9, 25.1];
        assert!(WesternElectricRules.check(&series, &zones).is_empty());
    }

    // --- Status ---

    #[test]
    fn test_status_warning_beyond_two_sigma() {
        let zones = unit_zones();
        let series = [25.0, 25.1, 27.5];
        let rules = WesternElectricRules.check(&series, &zones);
        assert!(rules.is_empty());
        assert_eq!(individual_status(&series, &zones, &rules), ChartStatus::Warning);
    }

    #[test]
    fn test_status_warning_needs_three_points() {
        let zones = unit_zones();
        assert_eq!(individual_status(&[25.0, 27.5], &zones, &[]), ChartStatus::Ok);
    }

    #[test]
    fn test_status_violation_takes_precedence() {
        let zones = unit_zones();
        let series = [25.0, 25.0, 29.0];
        let rules = WesternElectricRules.check(&series, &zones);
        assert_eq!(
            individual_status(&series, &zones, &rules),
            ChartStatus::OutOfControl
        );
    }

    #[test]
    fn test_rule_id_display_and_wire_name() {
        assert_eq!(RuleId::Rule3.to_string(), "Rule3");
        assert_eq!(serde_json::to_string(&RuleId::Rule2).unwrap(), "\"Rule2\"");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn short_series_never_violate(
            series in proptest::collection::vec(-1e3_f64..1e3, 0..3),
            center in -10.0_f64..10.0,
            sigma in 0.001_f64..5.0,
        ) {
            let zones = Zones::individual(ControlLimits::symmetric(center, 3.0 * sigma), sigma);
            prop_assert!(WesternElectricRules.check(&series, &zones).is_empty());
        }

        #[test]
        fn output_is_sorted_and_unique(
            series in proptest::collection::vec(-10.0_f64..10.0, 3..60),
            sigma in 0.1_f64..3.0,
        ) {
            let zones = Zones::individual(ControlLimits::symmetric(0.0, 3.0 * sigma), sigma);
            let rules = WesternElectricRules.check(&series, &zones);
            prop_assert!(rules.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn warning_and_out_of_control_are_exclusive(
            series in proptest::collection::vec(-10.0_f64..10.0, 0..40),
            sigma in 0.1_f64..3.0,
        ) {
            let zones = Zones::individual(ControlLimits::symmetric(0.0, 3.0 * sigma), sigma);
            let rules = WesternElectricRules.check(&series, &zones);
            let status = individual_status(&series, &zones, &rules);
            prop_assert_eq!(status == ChartStatus::OutOfControl, !rules.is_empty());
        }
    }
}
