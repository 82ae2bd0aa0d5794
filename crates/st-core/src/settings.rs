//! Lattice conventions.
//!
//! [`LatticeSettings`] collects the constants that lattice formulas would
//! otherwise hard-code: the year-length convention used to turn days into
//! year fractions, the Hull-White branching switch-over multiplier, and the
//! tolerances used by grid generation and no-arbitrage checks.
//!
//! Settings are plain values injected at construction of grids, propagators
//! and models; there is no process-wide singleton.

use crate::Real;

/// Calendar-free day count convention used throughout the lattice code.
pub const CALENDAR_DAYS_PER_YEAR: Real = 365.0;

/// Trading-day convention (a 256-day year makes one day `1/256` of a year).
pub const TRADING_DAYS_PER_YEAR: Real = 256.0;

/// Hull-White (1994) multiplier: `jMax = ceil(0.184 / (a·Δt))`.
pub const HULL_WHITE_BRANCHING_THRESHOLD: Real = 0.184;

/// Conventions and tolerances injected into lattice construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LatticeSettings {
    /// Number of days in a year; one day is `1 / days_per_year`.
    pub days_per_year: Real,
    /// Multiplier of `1 / (a·Δt)` that bounds trinomial slice growth.
    pub branching_threshold: Real,
    /// Relative tolerance of adaptive grid termination (scaled by grid size).
    pub grid_epsilon: Real,
    /// Slack before a risk-neutral probability is reported as out of range.
    pub probability_tolerance: Real,
}

impl Default for LatticeSettings {
    fn default() -> Self {
        Self {
            days_per_year: CALENDAR_DAYS_PER_YEAR,
            branching_threshold: HULL_WHITE_BRANCHING_THRESHOLD,
            grid_epsilon: f64::EPSILON,
            probability_tolerance: 1.0e-12,
        }
    }
}

impl LatticeSettings {
    /// Default settings with the 256-trading-day year.
    pub fn trading_days() -> Self {
        Self::default().with_days_per_year(TRADING_DAYS_PER_YEAR)
    }

    /// Replace the year-length convention.
    pub fn with_days_per_year(mut self, days: Real) -> Self {
        self.days_per_year = days;
        self
    }

    /// Replace the Hull-White branching threshold.
    pub fn with_branching_threshold(mut self, threshold: Real) -> Self {
        self.branching_threshold = threshold;
        self
    }

    /// Replace the adaptive-grid tolerance.
    pub fn with_grid_epsilon(mut self, epsilon: Real) -> Self {
        self.grid_epsilon = epsilon;
        self
    }

    /// Replace the no-arbitrage reporting tolerance.
    pub fn with_probability_tolerance(mut self, tolerance: Real) -> Self {
        self.probability_tolerance = tolerance;
        self
    }

    /// One day expressed in years.
    pub fn day(&self) -> Real {
        1.0 / self.days_per_year
    }

    /// Return `true` if `p` lies in `[0, 1]` up to the configured tolerance.
    pub fn is_valid_probability(&self, p: Real) -> bool {
        p >= -self.probability_tolerance && p <= 1.0 + self.probability_tolerance
    }
}
