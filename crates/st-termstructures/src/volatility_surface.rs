//! `VolatilitySurface` — the volatility capability consumed by lattices.
//!
//! A surface maps a time, or a time and a state (spot level), to a
//! volatility, and declares its [`SurfaceKind`]. The kind selects the time
//! grid a lattice is built on:
//!
//! | Kind | Grid |
//! |---|---|
//! | [`SurfaceKind::Flat`] | fixed step |
//! | [`SurfaceKind::StateDependent`] | fixed step |
//! | [`SurfaceKind::TermStructure`] | adaptive, constant `σ²·Δt` per step |

use st_core::{errors::Result, LatticeSettings, Real, Time, Volatility};
use st_math::{Interpolation1D, LinearInterpolation, TimeGrid};

/// How a surface varies, which drives time-grid construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Constant in time and state.
    Flat,
    /// Varies with time only.
    TermStructure,
    /// Varies with the state (local volatility / skew).
    StateDependent,
}

/// A volatility surface `σ(t)` or `σ(t, S)`.
pub trait VolatilitySurface: std::fmt::Debug + Send + Sync {
    /// The surface kind.
    fn kind(&self) -> SurfaceKind;

    /// Volatility at time `t` along the surface's reference state.
    fn volatility_at(&self, t: Time) -> Volatility;

    /// Volatility at time `t` and state `state`.
    ///
    /// Default: ignores the state.
    fn volatility(&self, t: Time, _state: Real) -> Volatility {
        self.volatility_at(t)
    }

    /// Time grid for a lattice of length `duration` with first step
    /// `initial_step`.
    fn time_grid(&self, duration: Time, initial_step: Time, settings: &LatticeSettings) -> TimeGrid {
        let kind = self.kind();
        let grid = match kind {
            SurfaceKind::TermStructure => TimeGrid::adaptive(
                duration,
                initial_step,
                |t| self.volatility_at(t),
                settings.grid_epsilon,
            ),
            SurfaceKind::Flat | SurfaceKind::StateDependent => {
                TimeGrid::fixed_step(duration, initial_step)
            }
        };
        tracing::debug!(
            ?kind,
            duration,
            initial_step,
            points = grid.size(),
            last = grid.last(),
            "time grid generated"
        );
        grid
    }
}

// ── FlatVol ───────────────────────────────────────────────────────────────────

/// A constant volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatVol {
    volatility: Volatility,
}

impl FlatVol {
    /// Create a flat surface.
    ///
    /// # Errors
    /// The volatility must be non-negative and finite.
    pub fn new(volatility: Volatility) -> Result<Self> {
        st_core::ensure!(
            volatility >= 0.0 && volatility.is_finite(),
            "volatility must be non-negative, got {volatility}"
        );
        Ok(Self { volatility })
    }

    /// The constant volatility value.
    pub fn value(&self) -> Volatility {
        self.volatility
    }
}

impl VolatilitySurface for FlatVol {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Flat
    }

    fn volatility_at(&self, _t: Time) -> Volatility {
        self.volatility
    }
}

// ── PiecewiseTermVol ──────────────────────────────────────────────────────────

/// Volatility term structure, linear in time between pillars and flat
/// outside them.
#[derive(Debug, Clone)]
pub struct PiecewiseTermVol {
    times: Vec<Time>,
    vols: Vec<Volatility>,
    interp: Option<LinearInterpolation>,
}

impl PiecewiseTermVol {
    /// Create from pillar times and volatilities.
    ///
    /// # Errors
    /// Needs at least one pillar, matching lengths, strictly increasing
    /// times and strictly positive volatilities.
    pub fn new(times: &[Time], vols: &[Volatility]) -> Result<Self> {
        st_core::ensure!(!times.is_empty(), "need at least one volatility pillar");
        st_core::ensure!(
            times.len() == vols.len(),
            "times and volatilities must have the same length"
        );
        st_core::ensure!(
            vols.iter().all(|&v| v > 0.0 && v.is_finite()),
            "term volatilities must be positive"
        );
        let interp = if times.len() > 1 {
            Some(LinearInterpolation::new(times, vols)?)
        } else {
            None
        };
        Ok(Self {
            times: times.to_vec(),
            vols: vols.to_vec(),
            interp,
        })
    }

    /// Pillar times.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Pillar volatilities.
    pub fn vols(&self) -> &[Volatility] {
        &self.vols
    }
}

impl VolatilitySurface for PiecewiseTermVol {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::TermStructure
    }

    fn volatility_at(&self, t: Time) -> Volatility {
        match &self.interp {
            Some(interp) => interp.operator_flat(t),
            None => self.vols[0],
        }
    }
}

// ── CevSkewVol ────────────────────────────────────────────────────────────────

/// State-dependent skew `σ(t, S) = σ_ref · (S / S_ref)^β`.
///
/// `β < 0` gives the usual equity skew (volatility rising as the spot
/// falls). Non-positive states fall back to `σ_ref`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CevSkewVol {
    reference_vol: Volatility,
    beta: Real,
    reference_level: Real,
}

impl CevSkewVol {
    /// Create a skew surface.
    ///
    /// # Errors
    /// The reference volatility and level must be strictly positive.
    pub fn new(reference_vol: Volatility, beta: Real, reference_level: Real) -> Result<Self> {
        st_core::ensure!(
            reference_vol > 0.0 && reference_vol.is_finite(),
            "reference volatility must be positive, got {reference_vol}"
        );
        st_core::ensure!(
            reference_level > 0.0,
            "reference level must be positive, got {reference_level}"
        );
        Ok(Self {
            reference_vol,
            beta,
            reference_level,
        })
    }

    /// Skew exponent β.
    pub fn beta(&self) -> Real {
        self.beta
    }

    /// Level at which the surface returns the reference volatility.
    pub fn reference_level(&self) -> Real {
        self.reference_level
    }
}

impl VolatilitySurface for CevSkewVol {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::StateDependent
    }

    fn volatility_at(&self, _t: Time) -> Volatility {
        self.reference_vol
    }

    fn volatility(&self, _t: Time, state: Real) -> Volatility {
        if !(state > 0.0) {
            tracing::trace!(state, "non-positive state, using the reference volatility");
            return self.reference_vol;
        }
        self.reference_vol * (state / self.reference_level).powf(self.beta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn flat_vol_uses_fixed_grid() {
        let vol = FlatVol::new(0.2).unwrap();
        assert_eq!(vol.kind(), SurfaceKind::Flat);
        assert_abs_diff_eq!(vol.volatility(1.0, 50.0), 0.2);
        let grid = vol.time_grid(0.5, 1.0 / 256.0, &LatticeSettings::default());
        assert_eq!(grid.size(), 129);
        assert!(FlatVol::new(-0.1).is_err());
    }

    #[test]
    fn term_vol_interpolates_and_adapts_grid() {
        let vol = PiecewiseTermVol::new(&[0.0, 1.0], &[0.1, 0.3]).unwrap();
        assert_eq!(vol.kind(), SurfaceKind::TermStructure);
        assert_abs_diff_eq!(vol.volatility_at(0.5), 0.2, epsilon = 1e-15);
        assert_abs_diff_eq!(vol.volatility_at(2.0), 0.3, epsilon = 1e-15);

        let grid = vol.time_grid(1.0, 0.05, &LatticeSettings::default());
        assert!(grid.last() >= 1.0);
        assert!(grid.last() - 1.0 < grid.dt(grid.steps() - 1));
        // steps shrink as volatility rises
        assert!(grid.dt(grid.steps() - 2) < grid.dt(0));
        assert!(grid.size() > TimeGrid::fixed_step(1.0, 0.05).size());
    }

    #[test]
    fn cev_skew_depends_on_state() {
        let vol = CevSkewVol::new(0.2, -0.5, 100.0).unwrap();
        assert_eq!(vol.kind(), SurfaceKind::StateDependent);
        assert_abs_diff_eq!(vol.volatility(0.0, 100.0), 0.2);
        assert_abs_diff_eq!(vol.volatility(0.0, 25.0), 0.4, epsilon = 1e-15);
        assert!(vol.volatility(0.0, 150.0) < 0.2);
        assert_abs_diff_eq!(vol.volatility(0.0, -1.0), 0.2);
        assert_abs_diff_eq!(vol.volatility(0.0, f64::NAN), 0.2);
        let grid = vol.time_grid(1.0, 0.25, &LatticeSettings::default());
        assert_eq!(grid.size(), 5);
    }
}
