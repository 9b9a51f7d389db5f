//! Statistical Process Control (SPC) charts.
//!
//! # Pipeline
//!
//! raw values → [`aggregate`] (subgrouped charts only) → control limits →
//! run rules → capability → result record.
//!
//! # Charts
//!
//! - Individual — [`evaluate_individual`], limits at window mean +/- 3 stdDev
//! - X-bar with R or S — [`evaluate_subgrouped`], see [`DispersionChart`]
//!
//! # Run Rules
//!
//! - [`WesternElectricRules`] — Rules 1–4 (Individual and X-bar charts)
//! - [`DispersionRules`] — Rules 1 and 4 (R and S charts)
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - Western Electric (1956). *Statistical Quality Control Handbook*.

mod chart;
pub mod constants;
mod evaluate;
mod rules;
mod subgroup;
mod variables;

pub use chart::{round_to, ChartPoint, ChartResult, ChartStatus, ControlLimits};
pub use constants::{lookup, ChartConstants};
pub use evaluate::{
    evaluate_individual, evaluate_individual_against, evaluate_subgrouped,
    evaluate_subgrouped_against, DispersionChart, IndividualEvaluation, SubgroupedEvaluation,
    CPK_DECIMALS, OUTPUT_DECIMALS,
};
pub use rules::{individual_status, DispersionRules, RuleId, RuleSet, WesternElectricRules, Zones};
pub use subgroup::{aggregate, Measurement, Observation, SubgroupStatistic, Subgroups};
pub use variables::{
    individual_limits, range_limits, range_sigma, sigma_limits, std_dev_sigma, window_statistics,
    xbar_limits, SubgroupSummary, WindowStatistics, DEFAULT_WINDOW,
};
