//! # st-termstructures
//!
//! The two market capabilities a lattice consumes:
//!
//! * [`YieldTermStructure`] — discount factors and forward rates used for
//!   discounting during backward induction;
//! * [`VolatilitySurface`] — volatility as a function of time (and state),
//!   tagged with a [`SurfaceKind`] that decides how the lattice's time grid
//!   is generated.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `YieldTermStructure` — discount factors and forward rates.
pub mod yield_term_structure;

/// `FlatForward` — constant continuously-compounded rate.
pub mod flat_forward;

/// `InterpolatedZeroCurve` — zero rates at pillars with cached discount factors.
pub mod interpolated_zero_curve;

/// `InterpolatedDiscountCurve` — log-linear discount-factor curve.
pub mod interpolated_discount_curve;

/// `VolatilitySurface` — flat, term-structure and state-dependent volatility.
pub mod volatility_surface;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use flat_forward::FlatForward;
pub use interpolated_discount_curve::InterpolatedDiscountCurve;
pub use interpolated_zero_curve::InterpolatedZeroCurve;
pub use volatility_surface::{
    CevSkewVol, FlatVol, PiecewiseTermVol, SurfaceKind, VolatilitySurface,
};
pub use yield_term_structure::YieldTermStructure;
