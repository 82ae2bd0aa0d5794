//! # st-math
//!
//! Mathematical utilities shared by the lattice crates: the [`TimeGrid`]
//! every time-indexed structure is built on, 1-D interpolation used by term
//! structures, and the standard normal distribution used by closed-form
//! cross-checks.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// 1D interpolation schemes.
pub mod interpolations;

/// Standard normal distribution function.
pub mod normal;

/// Ordered time points with nearest-index lookup.
pub mod time_grid;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use interpolations::{Interpolation1D, LinearInterpolation, LogLinearInterpolation};
pub use normal::normal_cdf;
pub use time_grid::TimeGrid;
