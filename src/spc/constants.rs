//! Control chart factor table.
//!
//! Maps a subgroup size `n` to the bias-correction constants used by the
//! range-based (A2, D3, D4, d2) and sigma-based (B3, B4, c4) charts.
//!
//! Sizes outside `2..=10` resolve to [`FALLBACK`] (the n = 5 row) instead of
//! failing, so every chart computation stays total. A zero D3 or B3 means the
//! chart has no lower control limit.

use serde::{Deserialize, Serialize};

/// Chart constants for one subgroup size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartConstants {
    /// X-bar limit factor: limits = X-double-bar +/- A2 * R-bar.
    pub a2: f64,
    /// R chart lower limit factor (0 = no lower limit).
    pub d3: f64,
    /// R chart upper limit factor.
    pub d4: f64,
    /// Mean of the relative range; sigma-hat = R-bar / d2.
    pub d2: f64,
    /// S chart lower limit factor (0 = no lower limit).
    pub b3: f64,
    /// S chart upper limit factor.
    pub b4: f64,
    /// Bias correction for S; sigma-hat = S-bar / c4.
    pub c4: f64,
}

/// Smallest tabulated subgroup size.
pub const MIN_TABULATED: usize = 2;

/// Largest tabulated subgroup size.
pub const MAX_TABULATED: usize = 10;

/// Constants used for any subgroup size outside the table.
pub const FALLBACK: ChartConstants = ChartConstants {
    a2: 0.373,
    d3: 0.0,
    d4: 2.114,
    d2: 2.326,
    b3: 0.0,
    b4: 2.089,
    c4: 0.940,
};

// Index 0 corresponds to n = 2.
const TABLE: [ChartConstants; 9] = [
    row(0.577, 0.0, 3.267, 1.128, 0.0, 3.267, 0.7979),
    row(0.483, 0.0, 2.574, 1.693, 0.0, 2.568, 0.8862),
    row(0.419, 0.0, 2.282, 2.059, 0.0, 2.266, 0.9213),
    row(0.373, 0.0, 2.114, 2.326, 0.0, 2.089, 0.9400),
    row(0.337, 0.0, 2.004, 2.534, 0.030, 1.970, 0.9515),
    row(0.308, 0.076, 1.924, 2.704, 0.118, 1.882, 0.9594),
    row(0.285, 0.136, 1.864, 2.847, 0.185, 1.815, 0.9650),
    row(0.267, 0.184, 1.816, 2.970, 0.239, 1.761, 0.9693),
    row(0.253, 0.223, 1.777, 3.078, 0.284, 1.716, 0.9727),
];

const fn row(a2: f64, d3: f64, d4: f64, d2: f64, b3: f64, b4: f64, c4: f64) -> ChartConstants {
    ChartConstants {
        a2,
        d3,
        d4,
        d2,
        b3,
        b4,
        c4,
    }
}

/// Returns `true` if `n` has a dedicated row in the table.
pub fn is_tabulated(n: usize) -> bool {
    (MIN_TABULATED..=MAX_TABULATED).contains(&n)
}

/// Look up the chart constants for subgroup size `n`.
///
/// Never fails: sizes outside `2..=10` return [`FALLBACK`].
///
/// # Examples
///
/// ```
/// use u_spc::spc::constants::{lookup, FALLBACK};
///
/// assert!((lookup(7).d3 - 0.076).abs() < 1e-12);
/// assert_eq!(lookup(25), FALLBACK);
/// ```
pub fn lookup(n: usize) -> ChartConstants {
    if is_tabulated(n) {
        TABLE[n - MIN_TABULATED]
    } else {
        tracing::warn!(
            subgroup_size = n,
            "subgroup size outside constants table, using n=5 fallback"
        );
        FALLBACK
    }
}

impl ChartConstants {
    /// Whether the R chart has a lower control limit at this size.
    pub fn has_range_lower_limit(&self) -> bool {
        self.d3 > 0.0
    }

    /// Whether the S chart has a lower control limit at this size.
    pub fn has_sigma_lower_limit(&self) -> bool {
        self.b3 > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_n2() {
        let c = lookup(2);
        assert!((c.a2 - 0.577).abs() < 1e-12);
        assert!((c.d4 - 3.267).abs() < 1e-12);
        assert!((c.d2 - 1.128).abs() < 1e-12);
        assert!((c.c4 - 0.7979).abs() < 1e-12);
    }

    #[test]
    fn test_lookup_n10() {
        let c = lookup(10);
        assert!((c.d3 - 0.223).abs() < 1e-12);
        assert!((c.b3 - 0.284).abs() < 1e-12);
        assert!((c.b4 - 1.716).abs() < 1e-12);
        assert!((c.d2 - 3.078).abs() < 1e-12);
    }

    #[test]
    fn test_lookup_n5_matches_fallback() {
        let c = lookup(5);
        assert!((c.a2 - FALLBACK.a2).abs() < 1e-12);
        assert!((c.d4 - FALLBACK.d4).abs() < 1e-12);
        assert!((c.d2 - FALLBACK.d2).abs() < 1e-12);
        assert!((c.b4 - FALLBACK.b4).abs() < 1e-12);
        assert!((c.c4 - FALLBACK.c4).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_uses_fallback() {
        assert_eq!(lookup(0), FALLBACK);
        assert_eq!(lookup(1), FALLBACK);
        assert_eq!(lookup(11), FALLBACK);
        assert_eq!(lookup(100), FALLBACK);
    }

    #[test]
    fn test_no_lower_limit_up_to_six() {
        for n in 2..=6 {
            assert!(!lookup(n).has_range_lower_limit(), "n={n}");
        }
        for n in 7..=10 {
            assert!(lookup(n).has_range_lower_limit(), "n={n}");
        }
    }

    #[test]
    fn test_sigma_lower_limit_starts_at_six() {
        assert!(!lookup(5).has_sigma_lower_limit());
        assert!(lookup(6).has_sigma_lower_limit());
        assert!(!FALLBACK.has_sigma_lower_limit());
    }

    #[test]
    fn test_factors_monotonic() {
        for n in 2..10 {
            let (a, b) = (lookup(n), lookup(n + 1));
            assert!(b.d2 > a.d2, "d2 should grow with n");
            assert!(b.c4 > a.c4, "c4 should grow with n");
            assert!(b.d4 < a.d4, "D4 should shrink with n");
        }
    }
}
