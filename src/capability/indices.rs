//! Process capability indices (Cp, Cpk, Pp, Ppk).
//!
//! Short-term indices (Cp, Cpk) use the within-subgroup sigma estimated from
//! a control chart (R-bar/d2 or S-bar/c4). Long-term indices (Pp, Ppk) use the
//! overall sigma of the data. Both families share one formula; only the sigma
//! argument differs.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.,
//!   Chapter 8.
//! - Kane (1986), "Process Capability Indices", *Journal of Quality Technology*
//!   18(1), pp. 41--52.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpcError};

/// Capability index `min(Cpu, Cpl)` for the given limits, mean and sigma.
///
/// Cpu = (USL - mean) / (3 sigma), Cpl = (mean - LSL) / (3 sigma).
///
/// Returns `0.0` when `sigma` is not strictly positive or not finite:
/// capability is undefined at zero dispersion.
///
/// Pass the within-subgroup sigma for Cpk and the overall sigma for Ppk.
///
/// # Examples
///
/// ```
/// use u_spc::capability::capability;
///
/// let cpk = capability(106.0, 94.0, 100.0, 2.0);
/// assert!((cpk - 1.0).abs() < 1e-12);
/// assert_eq!(capability(106.0, 94.0, 100.0, 0.0), 0.0);
/// ```
pub fn capability(usl: f64, lsl: f64, mean: f64, sigma: f64) -> f64 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0.0;
    }
    let cpu = (usl - mean) / (3.0 * sigma);
    let cpl = (mean - lsl) / (3.0 * sigma);
    cpu.min(cpl)
}

/// Two-sided specification limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecLimits {
    /// Upper specification limit.
    pub usl: f64,
    /// Lower specification limit.
    pub lsl: f64,
}

/// Computed capability indices.
///
/// | Index | Value | Interpretation |
/// |-------|-------|----------------|
/// | Cp/Pp | >= 1.33 | Process is capable |
/// | Cpk/Ppk | >= 1.33 | Process is capable and centered |
///
/// Reference: Montgomery (2019), Chapter 8, Table 8.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityIndices {
    /// Cp = (USL - LSL) / (6 * sigma_within); 0 at zero dispersion.
    pub cp: f64,
    /// Cpk = min(Cpu, Cpl) with sigma_within.
    pub cpk: f64,
    /// Pp = (USL - LSL) / (6 * sigma_overall); 0 at zero dispersion.
    pub pp: f64,
    /// Ppk = min(Ppu, Ppl) with sigma_overall.
    pub ppk: f64,
}

impl SpecLimits {
    /// Creates validated specification limits.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidSpecLimits`] if either limit is non-finite or
    /// `usl <= lsl`.
    pub fn new(usl: f64, lsl: f64) -> Result<Self> {
        if !usl.is_finite() || !lsl.is_finite() || usl <= lsl {
            return Err(SpcError::InvalidSpecLimits { usl, lsl });
        }
        Ok(Self { usl, lsl })
    }

    /// Limits synthesized as `mean +/- 3 * sigma`.
    ///
    /// This is a demonstration default for streams without engineering
    /// specifications, not a capability study: evaluated at the same mean and
    /// sigma it always yields Cpk = 1.0.
    pub fn from_process(mean: f64, sigma: f64) -> Self {
        Self {
            usl: mean + 3.0 * sigma,
            lsl: mean - 3.0 * sigma,
        }
    }

    /// Capability of a process with `mean` and `sigma` against these limits.
    pub fn capability(&self, mean: f64, sigma: f64) -> f64 {
        capability(self.usl, self.lsl, mean, sigma)
    }

    /// Cp, Cpk, Pp and Ppk for the given mean and sigma estimates.
    pub fn indices(&self, mean: f64, sigma_within: f64, sigma_overall: f64) -> CapabilityIndices {
        CapabilityIndices {
            cp: self.potential(sigma_within),
            cpk: self.capability(mean, sigma_within),
            pp: self.potential(sigma_overall),
            ppk: self.capability(mean, sigma_overall),
        }
    }

    fn potential(&self, sigma: f64) -> f64 {
        if !sigma.is_finite() || sigma <= 0.0 {
            return 0.0;
        }
        (self.usl - self.lsl) / (6.0 * sigma)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn default_limits_always_unit(
            mean in -1e3_f64..1e3,
            sigma in 1e-3_f64..1e3,
        ) {
            let cpk = capability(mean + 3.0 * sigma, mean - 3.0 * sigma, mean, sigma);
            prop_assert!((cpk - 1.0).abs() < 1e-9, "cpk = {}", cpk);
        }

        #[test]
        fn cpk_never_exceeds_cp(
            mean in -10.0_f64..10.0,
            sigma in 0.01_f64..5.0,
        ) {
            let spec = SpecLimits::new(12.0, -12.0).unwrap();
            let idx = spec.indices(mean, sigma, sigma);
            prop_assert!(idx.cpk <= idx.cp + 1e-12);
        }
    }
}
