//! Hull-White (extended Vasicek) model on a trinomial lattice.
//!
//! ```text
//! dr = (θ(t) − a·r) dt + σ dW
//! ```
//!
//! The lattice follows Hull & White (1994). The state `x = r − α(t)` lives
//! on the grid `j·Δx` with `Δx = σ√(3Δt)`; a slice stops growing at
//! `jMax = ceil(threshold / (a·Δt))` and its edge nodes branch inward. The
//! drift `α_m` of each slice is then fitted forward with Arrow-Debreu prices
//! so that the lattice reprices every zero-coupon bond on its grid:
//!
//! ```text
//! α_m = [ ln Σ_j Q(m,j)·e^{−jΔxΔt} − ln P(0, t_{m+1}) ] / Δt
//! ```
//!
//! Discount bond prices in closed form are
//! `P(t,T) = A(t,T)·exp(−B(t,T)·r)`, with `B` as in Vasicek and `A` chosen to
//! fit the initial curve.

use st_core::{
    errors::Result, DiscountFactor, LatticeSettings, Probability, Rate, Real, Time, Volatility,
};
use st_math::TimeGrid;
use st_methods::lattice::{BranchStyle, TrinomialTree};
use st_termstructures::{InterpolatedDiscountCurve, YieldTermStructure};

/// Hull-White one-factor model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullWhite {
    a: Real,
    sigma: Volatility,
    settings: LatticeSettings,
}

impl HullWhite {
    /// Create a Hull-White model with mean reversion `a` and volatility
    /// `sigma`.
    ///
    /// # Errors
    /// A precondition error unless both parameters are positive and finite.
    pub fn new(a: Real, sigma: Volatility, settings: LatticeSettings) -> Result<Self> {
        st_core::ensure!(
            a.is_finite() && a > 0.0,
            "mean reversion must be positive, got {a}"
        );
        st_core::ensure!(
            sigma.is_finite() && sigma > 0.0,
            "volatility must be positive, got {sigma}"
        );
        Ok(Self { a, sigma, settings })
    }

    /// Mean-reversion speed `a`.
    pub fn mean_reversion(&self) -> Real {
        self.a
    }

    /// Short-rate volatility `σ`.
    pub fn volatility(&self) -> Volatility {
        self.sigma
    }

    /// Lattice settings.
    pub fn settings(&self) -> &LatticeSettings {
        &self.settings
    }

    /// `B(t,T) = (1 − e^{−a(T−t)}) / a`
    pub fn b(&self, t: Time, maturity: Time) -> Real {
        (1.0 - (-self.a * (maturity - t)).exp()) / self.a
    }

    /// Largest state index before slices stop growing:
    /// `ceil(threshold / (a·Δt))`, at least `1`.
    pub fn j_max(&self, dt: Time) -> usize {
        let j = (self.settings.branching_threshold / (self.a * dt)).ceil();
        if j.is_finite() && j >= 1.0 {
            j as usize
        } else {
            1
        }
    }

    /// State spacing `Δx = σ√(3Δt)`.
    pub fn dx(&self, dt: Time) -> Real {
        self.sigma * (3.0 * dt).sqrt()
    }

    /// Probabilities of the (up, middle, down) successors of state `j`
    /// branching with `style` over a step `dt`.
    ///
    /// With `x = a²j²Δt²` and `y = a·j·Δt`:
    ///
    /// | Style | up | middle | down |
    /// |---|---|---|---|
    /// | Centered | `1/6 + (x − y)/2` | `2/3 − x` | `1/6 + (x + y)/2` |
    /// | SlantedUp | `1/6 + (x + y)/2` | `−1/3 − x − 2y` | `7/6 + (x + 3y)/2` |
    /// | SlantedDown | `7/6 + (x − 3y)/2` | `−1/3 − x + 2y` | `1/6 + (x − y)/2` |
    pub fn branch_probabilities(&self, style: BranchStyle, j: i64, dt: Time) -> [Probability; 3] {
        let y = self.a * j as Real * dt;
        let x = y * y;
        match style {
            BranchStyle::Centered => [
                1.0 / 6.0 + (x - y) / 2.0,
                2.0 / 3.0 - x,
                1.0 / 6.0 + (x + y) / 2.0,
            ],
            BranchStyle::SlantedUp => [
                1.0 / 6.0 + (x + y) / 2.0,
                -1.0 / 3.0 - x - 2.0 * y,
                7.0 / 6.0 + (x + 3.0 * y) / 2.0,
            ],
            BranchStyle::SlantedDown => [
                7.0 / 6.0 + (x - 3.0 * y) / 2.0,
                -1.0 / 3.0 - x + 2.0 * y,
                1.0 / 6.0 + (x - y) / 2.0,
            ],
        }
    }

    /// Closed-form discount bond price `P(t, T)` given the short rate `rate`
    /// at `t`, consistent with `curve` at time zero.
    ///
    /// `ln A = ln(P(0,T)/P(0,t)) + B·f(0,t) − σ²/(4a)·B²·(1 − e^{−2at})`
    pub fn discount_bond(
        &self,
        curve: &dyn YieldTermStructure,
        t: Time,
        maturity: Time,
        rate: Rate,
    ) -> DiscountFactor {
        let b = self.b(t, maturity);
        let log_a = (curve.discount(maturity) / curve.discount(t)).ln()
            + b * curve.instantaneous_forward(t)
            - self.sigma * self.sigma / (4.0 * self.a) * b * b * (1.0 - (-2.0 * self.a * t).exp());
        (log_a - b * rate).exp()
    }

    /// Standard deviation of `ln P(T, S)` seen from time zero, used by the
    /// closed-form zero-bond option.
    pub fn bond_price_volatility(&self, expiry: Time, maturity: Time) -> Real {
        self.sigma
            * self.b(expiry, maturity)
            * ((1.0 - (-2.0 * self.a * expiry).exp()) / (2.0 * self.a)).sqrt()
    }

    /// Build a trinomial short-rate lattice over `[0, maturity]` with
    /// `steps` equal steps, fitted to `curve`.
    ///
    /// Zero steps is clamped to one. Probabilities outside `[0, 1]` are
    /// logged and kept.
    ///
    /// # Errors
    /// A precondition error if `maturity` is not positive and finite.
    pub fn build_tree(
        &self,
        curve: &dyn YieldTermStructure,
        maturity: Time,
        steps: usize,
    ) -> Result<HullWhiteTree> {
        st_core::ensure!(
            maturity.is_finite() && maturity > 0.0,
            "maturity must be positive, got {maturity}"
        );
        let steps = if steps == 0 {
            tracing::warn!(maturity, "zero steps requested, using a one-period lattice");
            1
        } else {
            steps
        };

        let dt = maturity / steps as Real;
        let dx = self.dx(dt);
        let j_max = self.j_max(dt);
        let mut tree = TrinomialTree::new(TimeGrid::uniform(maturity, steps), j_max);

        for m in 0..tree.num_timesteps() {
            for j in tree.states(m) {
                let node = tree.node_mut(m, j);
                node.value = j as Real * dx;
                node.probabilities = self.branch_probabilities(node.branch, j, dt);
            }
        }

        // ── Forward fit of α with Arrow-Debreu prices ──
        tree.node_mut(0, 0).arrow_debreu = 1.0;
        let last = tree.num_timesteps() - 1;
        for m in 0..=last {
            let (t, step) = if m < last {
                (tree.time(m + 1), tree.time_grid().dt(m))
            } else {
                (tree.time(m) + dt, dt)
            };
            let weighted: Real = tree
                .states(m)
                .zip(tree.slice(m))
                .map(|(j, node)| node.arrow_debreu * (-(j as Real) * dx * step).exp())
                .sum();
            let alpha = (weighted.ln() - curve.discount(t).ln()) / step;
            tree.set_shift(m, alpha);
            if m == last {
                break;
            }

            for j in tree.states(m) {
                let node = *tree.node(m, j);
                let df = (-(alpha + node.value) * step).exp();
                for (k, p) in tree.successors(m, j).into_iter().zip(node.probabilities) {
                    tree.node_mut(m + 1, k).arrow_debreu += node.arrow_debreu * p * df;
                }
            }
        }

        let invalid: usize = (0..=last)
            .map(|m| tree.check_probabilities(m, &self.settings))
            .sum();
        tracing::debug!(
            a = self.a,
            sigma = self.sigma,
            steps,
            j_max,
            invalid,
            "Hull-White lattice fitted"
        );

        Ok(HullWhiteTree {
            model: *self,
            tree,
            dx,
        })
    }
}

/// A Hull-White trinomial lattice fitted to an initial curve.
///
/// Node values are the state offsets `j·Δx`, slice shifts are the fitted
/// `α_m`, and each node's Arrow-Debreu price is stored on the node.
#[derive(Debug, Clone, PartialEq)]
pub struct HullWhiteTree {
    model: HullWhite,
    tree: TrinomialTree,
    dx: Real,
}

impl HullWhiteTree {
    /// Short rate over the step out of node `(m, j)`: `α_m + j·Δx`.
    pub fn short_rate(&self, m: usize, j: i64) -> Rate {
        self.tree.shift(m) + self.tree.node_value(m, j)
    }

    /// Fitted drift `α_m` of slice `m`.
    pub fn alpha(&self, m: usize) -> Rate {
        self.tree.shift(m)
    }

    /// State spacing `Δx`.
    pub fn dx(&self) -> Real {
        self.dx
    }

    /// The underlying trinomial lattice.
    pub fn tree(&self) -> &TrinomialTree {
        &self.tree
    }

    /// The time grid.
    pub fn time_grid(&self) -> &TimeGrid {
        self.tree.time_grid()
    }

    /// The model the lattice was built from.
    pub fn model(&self) -> &HullWhite {
        &self.model
    }

    /// A zero-valued tree shaped like the lattice, for backward induction.
    pub fn value_tree(&self) -> TrinomialTree {
        TrinomialTree::create_from(&self.tree)
    }

    /// Arrow-Debreu prices of slice `m`, bottom to top.
    pub fn arrow_debreu_distribution(&self, m: usize) -> Vec<Real> {
        self.tree.slice(m).iter().map(|n| n.arrow_debreu).collect()
    }

    /// Discount factor to slice `m` implied by the lattice.
    pub fn discount(&self, m: usize) -> DiscountFactor {
        self.tree.arrow_debreu_sum(m)
    }

    /// The discount curve implied by the Arrow-Debreu sums of every slice.
    ///
    /// # Errors
    /// Propagates curve construction errors (a non-positive sum).
    pub fn implied_discount_curve(&self) -> Result<InterpolatedDiscountCurve> {
        let grid = self.tree.time_grid();
        let times = &grid.times()[1..];
        let discounts: Vec<DiscountFactor> =
            (1..grid.size()).map(|m| self.discount(m)).collect();
        InterpolatedDiscountCurve::new(times, &discounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use st_termstructures::FlatForward;

    fn model(a: Real, sigma: Volatility) -> HullWhite {
        HullWhite::new(a, sigma, LatticeSettings::default()).unwrap()
    }

    #[test]
    fn reference_centered_probabilities() {
        let [pu, pm, pd] = model(0.1, 0.01).branch_probabilities(BranchStyle::Centered, -1, 1.0);
        assert_abs_diff_eq!(pu, 0.2217, epsilon = 1e-4);
        assert_abs_diff_eq!(pm, 0.6567, epsilon = 1e-4);
        assert_abs_diff_eq!(pd, 0.1217, epsilon = 1e-4);
    }

    #[test]
    fn slanted_probabilities_at_the_limit() {
        let hw = model(0.1, 0.01);
        assert_eq!(hw.j_max(1.0), 2);
        let [pu, pm, pd] = hw.branch_probabilities(BranchStyle::SlantedDown, 2, 1.0);
        assert_abs_diff_eq!(pu, 0.8867, epsilon = 1e-4);
        assert_abs_diff_eq!(pm, 0.0267, epsilon = 1e-4);
        assert_abs_diff_eq!(pd, 0.0867, epsilon = 1e-4);
        let [pu, pm, pd] = hw.branch_probabilities(BranchStyle::SlantedUp, -2, 1.0);
        assert_abs_diff_eq!(pu, 0.0867, epsilon = 1e-4);
        assert_abs_diff_eq!(pm, 0.0267, epsilon = 1e-4);
        assert_abs_diff_eq!(pd, 0.8867, epsilon = 1e-4);
    }

    #[test]
    fn j_max_rule() {
        let hw = model(0.1, 0.01);
        assert_eq!(hw.j_max(0.5), 4);
        assert_eq!(hw.j_max(0.25), 8);
        // huge steps still keep one state either side
        assert_eq!(hw.j_max(100.0), 1);
        let wide = HullWhite::new(0.1, 0.01, LatticeSettings::default().with_branching_threshold(0.5)).unwrap();
        assert_eq!(wide.j_max(1.0), 5);
    }

    #[test]
    fn rejects_bad_parameters() {
        let settings = LatticeSettings::default();
        assert!(HullWhite::new(0.0, 0.01, settings).is_err());
        assert!(HullWhite::new(0.1, -0.01, settings).is_err());
        assert!(HullWhite::new(f64::NAN, 0.01, settings).is_err());
        let curve = FlatForward::continuous(0.05);
        assert!(model(0.1, 0.01).build_tree(&curve, 0.0, 10).is_err());
    }

    #[test]
    fn closed_form_bond_fits_the_curve() {
        let hw = model(0.1, 0.01);
        let curve = FlatForward::continuous(0.05);
        let r0 = curve.instantaneous_forward(0.0);
        assert_abs_diff_eq!(hw.discount_bond(&curve, 0.0, 5.0, r0), curve.discount(5.0), epsilon = 1e-12);
        assert_abs_diff_eq!(hw.discount_bond(&curve, 2.0, 2.0, 0.07), 1.0, epsilon = 1e-12);
        // higher rate, lower price
        assert!(hw.discount_bond(&curve, 1.0, 5.0, 0.06) < hw.discount_bond(&curve, 1.0, 5.0, 0.04));
    }

    #[test]
    fn zero_steps_clamped() {
        let curve = FlatForward::continuous(0.05);
        let tree = model(0.1, 0.01).build_tree(&curve, 1.0, 0).unwrap();
        assert_eq!(tree.tree().num_timesteps(), 2);
        assert_abs_diff_eq!(tree.discount(1), curve.discount(1.0), epsilon = 1e-14);
    }
}
