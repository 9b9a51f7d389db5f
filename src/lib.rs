//! # u-spc
//!
//! Statistical process control (SPC) engine: control limits, Western
//! Electric run rules, and process capability for streams of measurements.
//!
//! The engine is pure computation over `f64` series. [`monitor`] adds the
//! thin stateful layer that records measurements per (machine, item) stream
//! and re-evaluates the trailing window on every submission.
//!
//! ## Modules
//!
//! - [`spc`] — Individual and X-bar/R, X-bar/S charts, subgrouping, run rules
//! - [`capability`] — Process capability indices (Cp, Cpk, Pp, Ppk)
//! - [`simulation`] — Synthetic normal series with injected anomalies
//! - [`monitor`] — Measurement store and stream evaluation
//! - [`config`] — TOML configuration
//! - [`error`] — Error type
//!
//! ## Design Philosophy
//!
//! - **Numerical stability**: Leverages `u-numflow` for stable statistics
//! - **Research-backed**: Constants and rules follow the quality control literature
//! - **Injected randomness**: Generators take any `rand::Rng`, so runs are reproducible

pub mod capability;
pub mod config;
pub mod error;
pub mod monitor;
pub mod simulation;
pub mod spc;

pub use error::{Result, SpcError};
