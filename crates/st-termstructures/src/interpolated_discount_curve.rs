//! `InterpolatedDiscountCurve` — a yield term structure from discount factors.
//!
//! Discount factors are interpolated log-linearly, which keeps the forward
//! rate piecewise constant between pillars; beyond the last pillar the last
//! forward rate is extended. This is the shape used for curves implied by
//! the Arrow-Debreu prices of a rate lattice.

use crate::yield_term_structure::YieldTermStructure;
use st_core::{errors::Result, DiscountFactor, Time};
use st_math::{Interpolation1D, LogLinearInterpolation};

/// A yield curve defined by discount factors at pillar times.
#[derive(Debug, Clone)]
pub struct InterpolatedDiscountCurve {
    times: Vec<Time>,
    discounts: Vec<DiscountFactor>,
    interp: LogLinearInterpolation,
}

impl InterpolatedDiscountCurve {
    /// Build from pillar times and discount factors.
    ///
    /// A pillar at `t = 0` with discount factor `1` is prepended when the
    /// first time is positive.
    ///
    /// # Errors
    /// Times must be strictly increasing and non-negative; discount factors
    /// strictly positive; a pillar at `t = 0` must have discount factor `1`.
    pub fn new(times: &[Time], discounts: &[DiscountFactor]) -> Result<Self> {
        st_core::ensure!(!times.is_empty(), "need at least one pillar");
        st_core::ensure!(
            times.len() == discounts.len(),
            "times and discount factors must have the same length"
        );
        st_core::ensure!(times[0] >= 0.0, "pillar times must be non-negative");

        let (times, discounts) = if times[0] > 0.0 {
            let mut t = Vec::with_capacity(times.len() + 1);
            let mut d = Vec::with_capacity(times.len() + 1);
            t.push(0.0);
            d.push(1.0);
            t.extend_from_slice(times);
            d.extend_from_slice(discounts);
            (t, d)
        } else {
            st_core::ensure!(
                (discounts[0] - 1.0).abs() < 1e-12,
                "discount factor at t = 0 must be 1, got {}",
                discounts[0]
            );
            (times.to_vec(), discounts.to_vec())
        };
        let interp = LogLinearInterpolation::new(&times, &discounts)?;
        Ok(Self {
            times,
            discounts,
            interp,
        })
    }

    /// Pillar times, including `t = 0`.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Pillar discount factors, including `P(0) = 1`.
    pub fn discounts(&self) -> &[DiscountFactor] {
        &self.discounts
    }
}

impl YieldTermStructure for InterpolatedDiscountCurve {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t <= 0.0 {
            return 1.0;
        }
        self.interp.operator(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reproduces_pillars_and_interpolates_log_linearly() {
        let d1 = (-0.02_f64).exp();
        let d2 = (-0.05_f64).exp();
        let curve = InterpolatedDiscountCurve::new(&[1.0, 2.0], &[d1, d2]).unwrap();
        assert_eq!(curve.times().len(), 3);
        assert_abs_diff_eq!(curve.discount(1.0), d1, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(2.0), d2, epsilon = 1e-15);
        // piecewise-flat forward: 3% between 1y and 2y
        assert_abs_diff_eq!(curve.forward_rate(1.0, 1.5), 0.03, epsilon = 1e-12);
        // extrapolated with the last forward
        assert_abs_diff_eq!(curve.discount(3.0), (-0.08_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_origin() {
        assert!(InterpolatedDiscountCurve::new(&[0.0, 1.0], &[0.9, 0.8]).is_err());
        assert!(InterpolatedDiscountCurve::new(&[0.0, 1.0], &[1.0, 0.0]).is_err());
        assert!(InterpolatedDiscountCurve::new(&[0.0, 1.0], &[1.0, 0.95]).is_ok());
    }
}
