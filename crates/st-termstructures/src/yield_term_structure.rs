//! `YieldTermStructure` — yield / interest-rate term structures.
//!
//! This module defines the `YieldTermStructure` trait together with the
//! quantities a lattice needs from a curve:
//!
//! * **discount factor** — `P(0,t)`
//! * **zero rate** — the continuously-compounded zero rate for maturity *t*
//! * **forward rate** — the continuously-compounded forward rate between two
//!   times, and the forward discount factor over the same period
//!
//! Times are year fractions from the curve's reference point; there is no
//! date or calendar handling.

use st_core::{DiscountFactor, Rate, Real, Time};

/// A yield (interest-rate) term structure.
///
/// Implementors must provide **exactly one** of the three low-level methods:
///
/// * [`discount_impl`](YieldTermStructure::discount_impl)
/// * [`zero_rate_impl`](YieldTermStructure::zero_rate_impl)
/// * [`forward_rate_impl`](YieldTermStructure::forward_rate_impl)
///
/// Default implementations of the other two are provided via the
/// mathematical relationships that connect them.
pub trait YieldTermStructure: std::fmt::Debug + Send + Sync {
    // ── Low-level impl hooks (override exactly one) ──────────────────────

    /// Return the discount factor for a given time `t`.
    ///
    /// Default: computed from `zero_rate_impl`.
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t == 0.0 {
            return 1.0;
        }
        let r = self.zero_rate_impl(t);
        (-r * t).exp()
    }

    /// Return the continuously-compounded zero rate for time `t`.
    ///
    /// Default: computed from `discount_impl`.
    fn zero_rate_impl(&self, t: Time) -> Rate {
        if t == 0.0 {
            return self.forward_rate_impl(0.0);
        }
        let df = self.discount_impl(t);
        -df.ln() / t
    }

    /// Return the instantaneous forward rate at time `t`.
    ///
    /// Default: central difference of `ln P`.
    fn forward_rate_impl(&self, t: Time) -> Rate {
        let t1 = (t - DT / 2.0).max(0.0);
        let t2 = t1 + DT;
        let df1 = self.discount_impl(t1);
        let df2 = self.discount_impl(t2);
        (df1.ln() - df2.ln()) / (t2 - t1)
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> DiscountFactor {
        self.discount_impl(t)
    }

    /// Continuously-compounded zero rate for time `t`.
    fn zero_rate(&self, t: Time) -> Rate {
        self.zero_rate_impl(t)
    }

    /// Instantaneous forward rate at time `t`.
    fn instantaneous_forward(&self, t: Time) -> Rate {
        self.forward_rate_impl(t)
    }

    /// Continuously-compounded forward rate between `start` and `end`.
    ///
    /// Collapses to the instantaneous forward when the period is empty.
    fn forward_rate(&self, start: Time, end: Time) -> Rate {
        if (end - start).abs() < Real::EPSILON {
            return self.forward_rate_impl(start);
        }
        (self.discount_impl(start) / self.discount_impl(end)).ln() / (end - start)
    }

    /// Forward discount factor `P(0,end) / P(0,start)`.
    fn forward_discount(&self, start: Time, end: Time) -> DiscountFactor {
        self.discount_impl(end) / self.discount_impl(start)
    }

    /// Forward growth factor `P(0,start) / P(0,end)`, the inverse of
    /// [`forward_discount`](YieldTermStructure::forward_discount).
    fn inverse_forward_discount(&self, start: Time, end: Time) -> Real {
        self.discount_impl(start) / self.discount_impl(end)
    }
}

/// Small time step used for instantaneous forward rate computations.
const DT: Real = 1.0e-4;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Curve defined only through its zero rate: `z(t) = 0.02 + 0.01 t`.
    #[derive(Debug)]
    struct LinearZero;

    impl YieldTermStructure for LinearZero {
        fn zero_rate_impl(&self, t: Time) -> Rate {
            0.02 + 0.01 * t
        }
    }

    #[test]
    fn discount_from_zero_rate() {
        let c = LinearZero;
        assert_abs_diff_eq!(c.discount(0.0), 1.0);
        assert_abs_diff_eq!(c.discount(2.0), (-0.04_f64 * 2.0).exp(), epsilon = 1e-15);
    }

    #[test]
    fn forward_rate_between_times() {
        let c = LinearZero;
        // f(1,2) = (z(2)·2 − z(1)·1) / 1 = 0.08 − 0.03
        assert_abs_diff_eq!(c.forward_rate(1.0, 2.0), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(
            c.forward_discount(1.0, 2.0) * c.inverse_forward_discount(1.0, 2.0),
            1.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn instantaneous_forward_by_difference() {
        let c = LinearZero;
        // f(t) = d(z·t)/dt = 0.02 + 0.02 t
        assert_abs_diff_eq!(c.instantaneous_forward(1.0), 0.04, epsilon = 1e-8);
        assert_abs_diff_eq!(c.forward_rate(1.0, 1.0), 0.04, epsilon = 1e-8);
    }
}
