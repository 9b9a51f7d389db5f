//! Process capability analysis.
//!
//! Computes capability indices relating specification limits to process
//! spread.
//!
//! # Indices
//!
//! - **Cp**, **Cpk** — Short-term capability (within-subgroup sigma)
//! - **Pp**, **Ppk** — Long-term performance (overall sigma)
//!
//! When no engineering specification is supplied, limits default to
//! `mean +/- 3 sigma` ([`SpecLimits::from_process`]), which pins Cpk to 1.0.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.

mod indices;

pub use indices::{capability, CapabilityIndices, SpecLimits};
