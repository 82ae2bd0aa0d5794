//! Hull-White short rates on a recombining binomial lattice.
//!
//! With equal branch probabilities, row `t` of the lattice matches the
//! Hull-White mean and variance of the short rate at `T_t`:
//!
//! ```text
//! E[r(T)]   = f(0,T) + σ²/(2a²)·(1 − e^{−aT})² + (r₀ − f(0,0))·e^{−aT}
//! Var[r(T)] = σ²·(1 − e^{−2aT}) / (2a)
//! ```
//!
//! Rows are spaced by `2h` with `h = sd(T_t)/√t`. The spine carries the mean
//! (offset by one `h` on odd rows) and every other node is its sibling
//! towards the spine plus or minus `2h`, so rows are filled spine first.

use std::sync::Arc;

use st_core::{DiscountFactor, Rate, Real, Time};
use st_methods::lattice::{BinomialTree, Propagator};
use st_termstructures::{VolatilitySurface, YieldTermStructure};

/// Binomial Hull-White short-rate rule.
///
/// The volatility surface is read at time zero; Hull-White has a single
/// constant `σ`.
#[derive(Debug, Clone)]
pub struct HullWhitePropagator {
    a: Real,
    spot: Rate,
    volatility: Arc<dyn VolatilitySurface>,
    curve: Arc<dyn YieldTermStructure>,
}

impl HullWhitePropagator {
    /// Create a propagator with mean reversion `a` starting at the curve's
    /// instantaneous forward at time zero.
    pub fn new(
        a: Real,
        volatility: Arc<dyn VolatilitySurface>,
        curve: Arc<dyn YieldTermStructure>,
    ) -> Self {
        let spot = curve.instantaneous_forward(0.0);
        Self {
            a,
            spot,
            volatility,
            curve,
        }
    }

    /// Mean-reversion speed.
    pub fn mean_reversion(&self) -> Real {
        self.a
    }

    /// Expected short rate at `t`.
    pub fn mean(&self, t: Time) -> Rate {
        let sigma = self.volatility.volatility_at(0.0);
        let decay = (-self.a * t).exp();
        let convexity = sigma * sigma / (2.0 * self.a * self.a) * (1.0 - decay).powi(2);
        self.curve.instantaneous_forward(t)
            + convexity
            + (self.spot - self.curve.instantaneous_forward(0.0)) * decay
    }

    /// Standard deviation of the short rate at `t`.
    pub fn std_deviation(&self, t: Time) -> Real {
        let sigma = self.volatility.volatility_at(0.0);
        sigma * ((1.0 - (-2.0 * self.a * t).exp()) / (2.0 * self.a)).sqrt()
    }
}

impl Propagator for HullWhitePropagator {
    fn value_at(&self, tree: &BinomialTree, t: usize, i: usize) -> Real {
        if t == 0 {
            return self.spot;
        }
        let time = tree.time(t);
        let h = self.std_deviation(time) / (t as Real).sqrt();
        let spine = t / 2;
        if i == spine {
            self.mean(time) + (2.0 * spine as Real - t as Real) * h
        } else if i > spine {
            tree.node_value(t, i - 1) + 2.0 * h
        } else {
            tree.node_value(t, i + 1) - 2.0 * h
        }
    }

    fn is_state_dependent(&self) -> bool {
        true
    }

    fn spot(&self) -> Real {
        self.spot
    }

    fn set_spot(&mut self, spot: Real) {
        self.spot = spot;
    }

    fn volatility(&self) -> &Arc<dyn VolatilitySurface> {
        &self.volatility
    }

    fn set_volatility(&mut self, volatility: Arc<dyn VolatilitySurface>) {
        self.volatility = volatility;
    }
}

/// Price a unit zero-coupon bond maturing at `maturity` on a binomial
/// short-rate lattice, with equal branch probabilities and each node
/// discounting at its own rate.
///
/// Returns `None` when `maturity` is not on the lattice.
pub fn lattice_discount_bond(rates: &BinomialTree, maturity: Time) -> Option<DiscountFactor> {
    let grid = rates.time_grid();
    let Some(n) = grid.time_index_for_expiry(maturity) else {
        tracing::warn!(maturity, last = grid.last(), "bond maturity not reachable on the lattice");
        return None;
    };
    let mut values = vec![1.0; n + 1];
    for t in (0..n).rev() {
        let dt = grid.dt(t);
        for i in 0..=t {
            let df = (-rates.node_value(t, i) * dt).exp();
            values[i] = df * 0.5 * (values[i] + values[i + 1]);
        }
        values.truncate(t + 1);
    }
    values.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use st_core::LatticeSettings;
    use st_methods::lattice::StochasticTreeModel;
    use st_termstructures::{FlatForward, FlatVol};

    fn model(rate: Rate, duration: Time, step: Time) -> StochasticTreeModel<HullWhitePropagator> {
        let vol: Arc<dyn VolatilitySurface> = Arc::new(FlatVol::new(0.01).unwrap());
        let curve: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::continuous(rate));
        StochasticTreeModel::new(
            HullWhitePropagator::new(0.1, vol, curve),
            duration,
            step,
            LatticeSettings::default(),
        )
    }

    #[test]
    fn rows_match_mean_and_variance() {
        let mut m = model(0.05, 2.0, 0.05);
        let tree = m.propagate().clone();
        let p = m.propagator();
        for t in [1_usize, 7, 40] {
            let row = tree.row(t);
            let n = row.len() as Real;
            // binomial weights C(t, i) / 2^t
            let mut w = vec![1.0];
            for _ in 0..t {
                let mut next = vec![0.0; w.len() + 1];
                for (k, x) in w.iter().enumerate() {
                    next[k] += 0.5 * x;
                    next[k + 1] += 0.5 * x;
                }
                w = next;
            }
            let mean: Real = row.iter().zip(&w).map(|(r, q)| r * q).sum();
            let var: Real = row.iter().zip(&w).map(|(r, q)| q * (r - mean).powi(2)).sum();
            let time = tree.time(t);
            assert_eq!(n as usize, t + 1);
            assert_abs_diff_eq!(mean, p.mean(time), epsilon = 1e-12);
            assert_abs_diff_eq!(var.sqrt(), p.std_deviation(time), epsilon = 1e-12);
        }
    }

    #[test]
    fn bond_close_to_curve() {
        let mut m = model(0.05, 5.0, 0.05);
        m.propagate();
        let bond = lattice_discount_bond(m.tree(), 5.0).unwrap();
        assert_abs_diff_eq!(bond / (-0.25_f64).exp(), 1.0, epsilon = 1e-3);
        assert_eq!(lattice_discount_bond(m.tree(), 6.0), None);
        assert_abs_diff_eq!(lattice_discount_bond(m.tree(), 0.0).unwrap(), 1.0);
    }

    #[test]
    fn higher_spot_cheapens_bonds() {
        let mut m = model(0.05, 1.0, 0.05);
        m.propagate();
        let base = lattice_discount_bond(m.tree(), 1.0).unwrap();
        m.set_spot(0.08);
        assert!(m.is_stale());
        m.propagate();
        assert_abs_diff_eq!(m.tree().node_value(0, 0), 0.08);
        assert!(lattice_discount_bond(m.tree(), 1.0).unwrap() < base);
    }
}
