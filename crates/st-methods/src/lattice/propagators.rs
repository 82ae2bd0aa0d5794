//! Node-value rules for forward propagation of an asset lattice.
//!
//! A [`Propagator`] computes the value of node `(t, i)` from nodes that are
//! already filled. State-independent rules (CRR, Jarrow-Rudd) only read row
//! `t − 1`; the local-volatility rule also reads neighbours in row `t` and
//! therefore needs the spine-then-outward fill order of
//! [`StochasticTreeModel::fill_order`](super::StochasticTreeModel::fill_order).
//!
//! | Propagator | Up / down in log space | Reads row `t` |
//! |---|---|---|
//! | [`CrrPropagator`] | `±σ√Δt` | no |
//! | [`JarrowRuddPropagator`] | `μΔt ± σ√Δt` | no |
//! | [`LocalVolPropagator`] | forward and variance matched per node | yes |

use std::sync::Arc;

use st_core::{Rate, Real, Time, Volatility};
use st_termstructures::{VolatilitySurface, YieldTermStructure};

use super::BinomialTree;

/// Computes node values during forward propagation.
pub trait Propagator: std::fmt::Debug {
    /// Value of node `(t, i)`, given that every node this rule reads is
    /// already set in `tree`.
    fn value_at(&self, tree: &BinomialTree, t: usize, i: usize) -> Real;

    /// `true` if the rule reads neighbours in the row being filled.
    fn is_state_dependent(&self) -> bool {
        false
    }

    /// Root value.
    fn spot(&self) -> Real;

    /// Replace the root value.
    fn set_spot(&mut self, spot: Real);

    /// The volatility surface driving the moves.
    fn volatility(&self) -> &Arc<dyn VolatilitySurface>;

    /// Replace the volatility surface.
    fn set_volatility(&mut self, volatility: Arc<dyn VolatilitySurface>);
}

/// Volatility `σ(T_{t−1})` and step `Δt_{t−1}` for the move into row `t`.
fn step_volatility(tree: &BinomialTree, vol: &dyn VolatilitySurface, t: usize) -> (Volatility, Time) {
    let grid = tree.time_grid();
    (vol.volatility_at(grid.time(t - 1)), grid.dt(t - 1))
}

// ── Cox-Ross-Rubinstein ───────────────────────────────────────────────────────

/// Cox-Ross-Rubinstein moves: `S·e^{±σ√Δt}`.
///
/// Node `(t, i > 0)` is the up-child of `(t − 1, i − 1)`; node `(t, 0)` is the
/// down-child of `(t − 1, 0)`. The volatility is read at the start of each
/// step, which on an adaptive grid keeps `σ√Δt` constant and the tree
/// recombining.
#[derive(Debug, Clone)]
pub struct CrrPropagator {
    spot: Real,
    volatility: Arc<dyn VolatilitySurface>,
}

impl CrrPropagator {
    /// Create a CRR propagator.
    pub fn new(spot: Real, volatility: Arc<dyn VolatilitySurface>) -> Self {
        Self { spot, volatility }
    }
}

impl Propagator for CrrPropagator {
    fn value_at(&self, tree: &BinomialTree, t: usize, i: usize) -> Real {
        if t == 0 {
            return self.spot;
        }
        let (sigma, dt) = step_volatility(tree, self.volatility.as_ref(), t);
        let u = sigma * dt.sqrt();
        if i > 0 {
            tree.node_value(t - 1, i - 1) * u.exp()
        } else {
            tree.node_value(t - 1, 0) * (-u).exp()
        }
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

// ── Jarrow-Rudd ───────────────────────────────────────────────────────────────

/// Jarrow-Rudd moves: `S·e^{μΔt ± σ√Δt}` with a constant log drift `μ`.
///
/// With `μ = r − σ²/2` the risk-neutral up probability is close to ½.
#[derive(Debug, Clone)]
pub struct JarrowRuddPropagator {
    spot: Real,
    drift: Rate,
    volatility: Arc<dyn VolatilitySurface>,
}

impl JarrowRuddPropagator {
    /// Create a Jarrow-Rudd propagator with log drift `drift`.
    pub fn new(spot: Real, drift: Rate, volatility: Arc<dyn VolatilitySurface>) -> Self {
        Self {
            spot,
            drift,
            volatility,
        }
    }

    /// The log drift per unit time.
    pub fn drift(&self) -> Rate {
        self.drift
    }
}

impl Propagator for JarrowRuddPropagator {
    fn value_at(&self, tree: &BinomialTree, t: usize, i: usize) -> Real {
        if t == 0 {
            return self.spot;
        }
        let (sigma, dt) = step_volatility(tree, self.volatility.as_ref(), t);
        let m = self.drift * dt;
        let s = sigma * dt.sqrt();
        if i > 0 {
            tree.node_value(t - 1, i - 1) * (m + s).exp()
        } else {
            tree.node_value(t - 1, 0) * (m - s).exp()
        }
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

// ── Local volatility ──────────────────────────────────────────────────────────

/// Implied binomial tree fitted to a state-dependent volatility.
///
/// Each node `(t − 1, j)` with value `S` gets children `d < F < u` that match
/// the forward `F = S·g` (with `g` the curve's growth over the step) and the
/// local variance `v = F²·σ(T_{t−1}, S)²·Δt`:
///
/// ```text
/// (u − F)(F − d) = v
/// ```
///
/// The spine of even rows sits at the root spot. On odd rows the spine is
/// the down-child of the previous spine node, chosen so that `u·d = S²`.
/// Nodes above the spine are solved from their down-child, nodes below it
/// from their up-child, which is why the row must be filled from the spine
/// outward.
///
/// A solved node that would leave the open interval between the forwards of
/// its two parents is replaced by their geometric mean, or on the edge of the
/// row by the previous row's edge spacing. Every up probability then lies in
/// `(0, 1)`, even where a steep skew drives the local variance up.
#[derive(Debug, Clone)]
pub struct LocalVolPropagator {
    spot: Real,
    volatility: Arc<dyn VolatilitySurface>,
    curve: Arc<dyn YieldTermStructure>,
}

impl LocalVolPropagator {
    /// Create a local-volatility propagator growing at the rate of `curve`.
    pub fn new(
        spot: Real,
        volatility: Arc<dyn VolatilitySurface>,
        curve: Arc<dyn YieldTermStructure>,
    ) -> Self {
        Self {
            spot,
            volatility,
            curve,
        }
    }

    /// The curve that sets the forward growth per step.
    pub fn curve(&self) -> &Arc<dyn YieldTermStructure> {
        &self.curve
    }

    /// Forward growth over the step into row `t`, the local variance factor
    /// `σ²·Δt` for a parent at level `s`, and the log width `σ√Δt`.
    fn step(&self, tree: &BinomialTree, t: usize, s: Real) -> (Real, Real, Real) {
        let grid = tree.time_grid();
        let (t0, t1) = (grid.time(t - 1), grid.time(t));
        let dt = t1 - t0;
        let sigma = self.volatility.volatility(t0, s);
        (
            self.curve.inverse_forward_discount(t0, t1),
            sigma * sigma * dt,
            sigma * dt.sqrt(),
        )
    }
}

impl Propagator for LocalVolPropagator {
    fn value_at(&self, tree: &BinomialTree, t: usize, i: usize) -> Real {
        if t == 0 {
            return self.spot;
        }
        let spine = t / 2;

        if i == spine {
            if t % 2 == 0 {
                return tree.node_value(0, 0);
            }
            let s = tree.node_value(t - 1, spine);
            let (growth, var, _) = self.step(tree, t, s);
            let f = s * growth;
            let v = f * f * var;
            let b = f * f + s * s + v;
            let disc = (b * b - 4.0 * f * f * s * s).max(0.0);
            let up = (b + disc.sqrt()) / (2.0 * f);
            return s * s / up;
        }

        // a node must stay strictly between the forwards of its two parents
        if i > spine {
            let s = tree.node_value(t - 1, i - 1);
            let down = tree.node_value(t, i - 1);
            let (growth, var, width) = self.step(tree, t, s);
            let f = s * growth;
            let ceiling = if i < t {
                tree.node_value(t - 1, i) * growth
            } else {
                Real::INFINITY
            };
            if f > down {
                let up = f + f * f * var / (f - down);
                if up > f && up < ceiling {
                    return up;
                }
            }
            tracing::trace!(t, i, forward = f, down, "local-vol up node out of bounds");
            return if i < t {
                (f * ceiling).sqrt()
            } else if t >= 2 {
                down * tree.node_value(t - 1, t - 1) / tree.node_value(t - 1, t - 2)
            } else {
                f * width.exp()
            };
        }

        let s = tree.node_value(t - 1, i);
        let up = tree.node_value(t, i + 1);
        let (growth, var, _) = self.step(tree, t, s);
        let f = s * growth;
        let floor = if i > 0 {
            tree.node_value(t - 1, i - 1) * growth
        } else {
            0.0
        };
        if up > f {
            let down = f - f * f * var / (up - f);
            if down > floor && down < f {
                return down;
            }
        }
        tracing::trace!(t, i, forward = f, up, "local-vol down node out of bounds");
        if i > 0 {
            (f * floor).sqrt()
        } else {
            up * tree.node_value(t - 1, 0) / tree.node_value(t - 1, 1)
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use st_math::TimeGrid;
    use st_termstructures::{CevSkewVol, FlatForward, FlatVol};

    fn flat(sigma: Volatility) -> Arc<dyn VolatilitySurface> {
        Arc::new(FlatVol::new(sigma).unwrap())
    }

    fn fill(p: &dyn Propagator, tree: &mut BinomialTree, t: usize, order: &[usize]) {
        for &i in order {
            let v = p.value_at(tree, t, i);
            tree.set_node_value(t, i, v);
        }
    }

    #[test]
    fn crr_first_two_rows() {
        let p = CrrPropagator::new(75.0, flat(0.2));
        let mut tree = BinomialTree::new(TimeGrid::uniform(2.0 / 256.0, 2));
        fill(&p, &mut tree, 0, &[0]);
        fill(&p, &mut tree, 1, &[0, 1]);
        fill(&p, &mut tree, 2, &[0, 1, 2]);
        assert_abs_diff_eq!(tree.node_value(1, 0), 74.07, epsilon = 0.01);
        assert_abs_diff_eq!(tree.node_value(1, 1), 75.94, epsilon = 0.01);
        assert_abs_diff_eq!(tree.node_value(2, 0), 73.15, epsilon = 0.01);
        assert_abs_diff_eq!(tree.node_value(2, 1), 75.00, epsilon = 1e-10);
        assert_abs_diff_eq!(tree.node_value(2, 2), 76.90, epsilon = 0.01);
    }

    #[test]
    fn jarrow_rudd_shifts_by_drift() {
        let p = JarrowRuddPropagator::new(100.0, 0.05, flat(0.2));
        let mut tree = BinomialTree::new(TimeGrid::uniform(1.0, 4));
        fill(&p, &mut tree, 0, &[0]);
        fill(&p, &mut tree, 1, &[0, 1]);
        fill(&p, &mut tree, 2, &[0, 1, 2]);
        let up = tree.node_value(1, 1);
        let down = tree.node_value(1, 0);
        assert_abs_diff_eq!((up * down).ln(), 2.0 * 100.0_f64.ln() + 2.0 * 0.05 * 0.25, epsilon = 1e-12);
        // middle node of row 2 carries two steps of drift
        assert_abs_diff_eq!(tree.node_value(2, 1), 100.0 * (0.05_f64 * 0.5).exp(), epsilon = 1e-10);
    }

    #[test]
    fn local_vol_matches_forward_and_variance() {
        let vol: Arc<dyn VolatilitySurface> = Arc::new(CevSkewVol::new(0.25, -0.5, 100.0).unwrap());
        let curve: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::continuous(0.03));
        let p = LocalVolPropagator::new(100.0, vol.clone(), curve);
        assert!(p.is_state_dependent());

        let grid = TimeGrid::uniform(1.0, 8);
        let mut tree = BinomialTree::new(grid);
        fill(&p, &mut tree, 0, &[0]);
        fill(&p, &mut tree, 1, &[0, 1]);
        fill(&p, &mut tree, 2, &[1, 2, 0]);
        fill(&p, &mut tree, 3, &[1, 2, 3, 0]);

        assert_abs_diff_eq!(tree.node_value(2, 1), 100.0);
        let growth = (0.03_f64 * 0.125).exp();
        for t in 1..=3 {
            for j in 0..t {
                let s = tree.node_value(t - 1, j);
                let (d, u) = (tree.node_value(t, j), tree.node_value(t, j + 1));
                let f = s * growth;
                let sigma = vol.volatility(0.0, s);
                assert!(d < f && f < u);
                assert_abs_diff_eq!((u - f) * (f - d), f * f * sigma * sigma * 0.125, epsilon = 1e-9);
            }
        }
        // odd-row spine straddles the spot symmetrically in log space
        assert_abs_diff_eq!(tree.node_value(1, 0) * tree.node_value(1, 1), 100.0 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn setters_replace_inputs() {
        let mut p = CrrPropagator::new(100.0, flat(0.2));
        p.set_spot(90.0);
        p.set_volatility(flat(0.3));
        assert_abs_diff_eq!(p.spot(), 90.0);
        assert_abs_diff_eq!(p.volatility().volatility_at(0.0), 0.3);
        assert!(!p.is_state_dependent());
    }
}
