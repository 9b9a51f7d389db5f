//! Synthetic measurement series.
//!
//! Draws normally distributed values with the Box–Muller transform and, with
//! a small probability, pushes a value several sigma away from target to
//! mimic an out-of-control event. Used to feed simulations and tests.
//!
//! The random source is injected, so a seeded generator reproduces the same
//! series.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::spc::{round_to, OUTPUT_DECIMALS};

/// Default probability that a draw carries an injected anomaly.
pub const DEFAULT_ANOMALY_PROBABILITY: f64 = 0.05;

/// Anomaly size, in target sigmas, for single values.
pub const SINGLE_ANOMALY_SIGMAS: f64 = 4.0;

/// Anomaly size, in target sigmas, for subgroup members.
pub const SUBGROUP_ANOMALY_SIGMAS: f64 = 3.0;

/// Generator of synthetic measurements.
///
/// # Examples
///
/// ```
/// use u_spc::simulation::SyntheticGenerator;
///
/// let mut a = SyntheticGenerator::seeded(7);
/// let mut b = SyntheticGenerator::seeded(7);
/// assert_eq!(a.subgroup(5, 100.0, 2.0), b.subgroup(5, 100.0, 2.0));
/// ```
pub struct SyntheticGenerator<R> {
    rng: R,
    anomaly_probability: f64,
}

impl SyntheticGenerator<StdRng> {
    /// Deterministic generator for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> SyntheticGenerator<R> {
    /// Wrap a random source, with the default anomaly probability.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            anomaly_probability: DEFAULT_ANOMALY_PROBABILITY,
        }
    }

    /// Set the per-draw anomaly probability (clamped to `[0, 1]`).
    pub fn with_anomaly_probability(mut self, probability: f64) -> Self {
        self.anomaly_probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    /// Per-draw anomaly probability.
    pub fn anomaly_probability(&self) -> f64 {
        self.anomaly_probability
    }

    /// One standard normal deviate.
    pub fn standard_normal(&mut self) -> f64 {
        // 1 - [0, 1) keeps u1 away from 0 so ln(u1) stays finite.
        let u1 = 1.0 - self.rng.random::<f64>();
        let u2 = 1.0 - self.rng.random::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).sin()
    }

    /// One value around `target_mean`, rounded to 4 decimals.
    ///
    /// Anomalies shift the value by 4 target sigmas.
    pub fn value(&mut self, target_mean: f64, target_std_dev: f64) -> f64 {
        self.draw(target_mean, target_std_dev, SINGLE_ANOMALY_SIGMAS, false)
    }

    /// Like [`value`](Self::value), always injecting an anomaly.
    pub fn anomalous_value(&mut self, target_mean: f64, target_std_dev: f64) -> f64 {
        self.draw(target_mean, target_std_dev, SINGLE_ANOMALY_SIGMAS, true)
    }

    /// `n` independent values around `target_mean`, rounded to 4 decimals.
    ///
    /// Each member has its own anomaly chance; anomalies shift by 3 target
    /// sigmas.
    pub fn subgroup(&mut self, n: usize, target_mean: f64, target_std_dev: f64) -> Vec<f64> {
        (0..n)
            .map(|_| self.draw(target_mean, target_std_dev, SUBGROUP_ANOMALY_SIGMAS, false))
            .collect()
    }

    /// Like [`subgroup`](Self::subgroup), with every member anomalous.
    pub fn anomalous_subgroup(&mut self, n: usize, target_mean: f64, target_std_dev: f64) -> Vec<f64> {
        (0..n)
            .map(|_| self.draw(target_mean, target_std_dev, SUBGROUP_ANOMALY_SIGMAS, true))
            .collect()
    }

    fn draw(&mut self, target_mean: f64, target_std_dev: f64, anomaly_sigmas: f64, force: bool) -> f64 {
        let mut value = target_mean + target_std_dev * self.standard_normal();
        if force || self.rng.random::<f64>() < self.anomaly_probability {
            let sign = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
            value += sign * anomaly_sigmas * target_std_dev;
        }
        round_to(value, OUTPUT_DECIMALS)
    }
}
