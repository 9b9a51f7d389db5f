//! Monitor configuration.
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```toml
//! window = 30
//! subgroup_size = 5
//! subgroup_count = 20
//! chart = "S"
//!
//! [spec_limits]
//! usl = 106.0
//! lsl = 94.0
//!
//! [simulation]
//! target_mean = 100.0
//! target_std_dev = 2.0
//! anomaly_probability = 0.05
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capability::SpecLimits;
use crate::error::Result;
use crate::simulation::DEFAULT_ANOMALY_PROBABILITY;
use crate::spc::{DispersionChart, DEFAULT_WINDOW};

/// Configuration for [`SpcMonitor`](crate::monitor::SpcMonitor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpcConfig {
    /// Trailing window for Individual chart statistics.
    pub window: usize,
    /// Default subgroup size for simulated subgroups.
    pub subgroup_size: usize,
    /// Number of most recent subgroups charted.
    pub subgroup_count: usize,
    /// Dispersion chart paired with X-bar.
    pub chart: DispersionChart,
    /// Engineering specification limits; `mean +/- 3 sigma` when absent.
    pub spec_limits: Option<SpecLimits>,
    /// Synthetic data settings.
    pub simulation: SimulationConfig,
}

impl Default for SpcConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            subgroup_size: 5,
            subgroup_count: 20,
            chart: DispersionChart::Range,
            spec_limits: None,
            simulation: SimulationConfig::default(),
        }
    }
}

/// Targets for simulated measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub target_mean: f64,
    pub target_std_dev: f64,
    pub anomaly_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            target_mean: 100.0,
            target_std_dev: 2.0,
            anomaly_probability: DEFAULT_ANOMALY_PROBABILITY,
        }
    }
}

impl SpcConfig {
    /// Parse a configuration from TOML text.
    ///
    /// Spec limits are validated the same way as [`SpecLimits::new`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if let Some(spec) = config.spec_limits {
            SpecLimits::new(spec.usl, spec.lsl)?;
        }
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
