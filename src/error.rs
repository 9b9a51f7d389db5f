//! Error types for the SPC engine.
//!
//! The engine degrades gracefully on data-quality problems (too few points,
//! zero dispersion, subgroup sizes outside the constants table). Only
//! caller-contract violations and configuration failures surface here.

use thiserror::Error;

/// Errors raised by the SPC engine and its collaborators.
#[derive(Debug, Error)]
pub enum SpcError {
    #[error("subgroup size must be at least 1, got {0}")]
    InvalidSubgroupSize(usize),

    #[error("sample standard deviation is undefined for subgroup size 1 (S chart requires n >= 2)")]
    SampleStdDevUndefined,

    #[error("invalid specification limits: USL={usl}, LSL={lsl} (both must be finite and USL > LSL)")]
    InvalidSpecLimits { usl: f64, lsl: f64 },

    #[error("unknown chart type '{0}' (expected \"R\" or \"S\")")]
    UnknownChartType(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("measurement store error: {0}")]
    Store(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpcError>;
