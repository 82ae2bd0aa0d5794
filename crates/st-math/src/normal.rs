//! Standard normal distribution.
//!
//! `Φ` is evaluated through the `statrs` complementary error function, which
//! keeps relative precision in the far left tail. Absolute accuracy near the
//! centre is of order `1e-11`.

use st_core::Real;
use statrs::function::erf::erfc;
use std::f64::consts::FRAC_1_SQRT_2;

/// The standard normal cumulative distribution `Φ(x)`.
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}
