//! Backward induction of derivative values over an asset lattice.
//!
//! Risk-neutral up probabilities are not stored: at each node they are
//! recovered from the asset lattice and the discount curves,
//!
//! ```text
//! q = (1/P(t_i, t_{i+1}) − S_d/S) / (S_u/S − S_d/S)
//! ```
//!
//! where for a quanto underlying the forward growth `1/P` is divided by the
//! foreign curve's. A `q` outside `[0, 1]` means the asset lattice admits
//! arbitrage; it is logged and counted in a [`NoArbitrageReport`], and the
//! induction carries on with the raw value.

use st_core::{
    errors::Result, DiscountFactor, Error, LatticeSettings, Price, Probability, Real, Time,
};
use st_termstructures::YieldTermStructure;

use super::BinomialTree;

/// Curves used to discount and to set forward growth.
#[derive(Debug, Clone, Copy)]
pub struct Discounting<'a> {
    domestic: &'a dyn YieldTermStructure,
    foreign: Option<&'a dyn YieldTermStructure>,
}

impl<'a> Discounting<'a> {
    /// Discount and grow with a single curve.
    pub fn new(domestic: &'a dyn YieldTermStructure) -> Self {
        Self {
            domestic,
            foreign: None,
        }
    }

    /// Discount with `domestic`; grow at the domestic rate net of `foreign`.
    pub fn quanto(domestic: &'a dyn YieldTermStructure, foreign: &'a dyn YieldTermStructure) -> Self {
        Self {
            domestic,
            foreign: Some(foreign),
        }
    }

    /// The discounting curve.
    pub fn domestic(&self) -> &'a dyn YieldTermStructure {
        self.domestic
    }

    /// Discount factor from `end` back to `start`.
    pub fn discount(&self, start: Time, end: Time) -> DiscountFactor {
        self.domestic.forward_discount(start, end)
    }

    /// Forward growth of the underlying from `start` to `end`.
    pub fn growth(&self, start: Time, end: Time) -> Real {
        let g = self.domestic.inverse_forward_discount(start, end);
        match self.foreign {
            Some(foreign) => g / foreign.inverse_forward_discount(start, end),
            None => g,
        }
    }
}

/// Whether a derivative may be exercised before expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExerciseStyle {
    /// Exercise at expiry only.
    #[default]
    European,
    /// Exercise at any node up to expiry.
    American,
}

/// Risk-neutral probabilities seen during one induction or sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoArbitrageReport {
    /// Nodes whose up probability fell outside `[0, 1]`.
    pub violations: usize,
    /// Nodes visited.
    pub nodes: usize,
    /// Smallest up probability seen.
    pub min_probability: Probability,
    /// Largest up probability seen.
    pub max_probability: Probability,
}

impl Default for NoArbitrageReport {
    fn default() -> Self {
        Self {
            violations: 0,
            nodes: 0,
            min_probability: Real::INFINITY,
            max_probability: Real::NEG_INFINITY,
        }
    }
}

impl NoArbitrageReport {
    /// `true` if no node violated the no-arbitrage bounds.
    pub fn is_arbitrage_free(&self) -> bool {
        self.violations == 0
    }

    fn record(&mut self, q: Probability, valid: bool) {
        self.nodes += 1;
        self.min_probability = self.min_probability.min(q);
        self.max_probability = self.max_probability.max(q);
        if !valid {
            self.violations += 1;
        }
    }

    pub(super) fn log_summary(&self, operation: &'static str) {
        if self.violations > 0 {
            tracing::warn!(
                operation,
                violations = self.violations,
                nodes = self.nodes,
                min = self.min_probability,
                max = self.max_probability,
                "risk-neutral probabilities outside [0, 1]"
            );
        }
    }
}

/// Result of pricing one payoff on the lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InductionOutcome {
    /// Value at the root.
    pub value: Price,
    /// Row the payoff was applied at.
    pub expiry_index: usize,
    /// Probabilities seen on the way back.
    pub report: NoArbitrageReport,
}

/// Backward induction and state-price sweeps over one asset lattice.
#[derive(Debug, Clone, Copy)]
pub struct BinomialInduction<'a> {
    pub(super) asset: &'a BinomialTree,
    pub(super) discounting: Discounting<'a>,
    pub(super) settings: LatticeSettings,
}

impl<'a> BinomialInduction<'a> {
    /// Induct over `asset` with the given curves.
    pub fn new(asset: &'a BinomialTree, discounting: Discounting<'a>, settings: LatticeSettings) -> Self {
        Self {
            asset,
            discounting,
            settings,
        }
    }

    /// The asset lattice.
    pub fn asset(&self) -> &'a BinomialTree {
        self.asset
    }

    /// Risk-neutral probability of the up move out of node `(t, i)`.
    ///
    /// When both children coincide any probability prices consistently;
    /// `½` is returned.
    pub fn up_probability(&self, t: usize, i: usize) -> Probability {
        let s = self.asset.node_value(t, i);
        let up = self.asset.node_value(t + 1, i + 1) / s;
        let down = self.asset.node_value(t + 1, i) / s;
        if !((up - down).abs() > 0.0) {
            return 0.5;
        }
        let grid = self.asset.time_grid();
        let growth = self.discounting.growth(grid.time(t), grid.time(t + 1));
        (growth - down) / (up - down)
    }

    pub(super) fn checked_up_probability(
        &self,
        t: usize,
        i: usize,
        report: &mut NoArbitrageReport,
    ) -> Probability {
        let q = self.up_probability(t, i);
        let valid = self.settings.is_valid_probability(q);
        if !valid && report.violations == 0 {
            tracing::warn!(t, i, q, "no-arbitrage violated at node");
        }
        report.record(q, valid);
        q
    }

    /// Roll `derivative` back from row `terminal` to row `initial`.
    ///
    /// Rows `initial..terminal` are overwritten with
    /// `P(t_i, t_{i+1})·(q·V_up + (1 − q)·V_down)`; with an `exercise`
    /// payoff each node takes the larger of that and the payoff at the
    /// node's asset value. Row `terminal` is read as is, which lets callers
    /// inject boundary values and induct in windows.
    ///
    /// # Errors
    /// [`Error::StructuralMismatch`] if `derivative` is not shaped like the
    /// asset lattice, [`Error::IndexOutOfRange`] if `terminal` is not a row,
    /// and a precondition error if `initial > terminal`. Nothing is written
    /// on error.
    pub fn induct(
        &self,
        derivative: &mut BinomialTree,
        terminal: usize,
        initial: usize,
        exercise: Option<&dyn Fn(Real) -> Real>,
    ) -> Result<NoArbitrageReport> {
        self.asset.ensure_same_shape(derivative, "derivative lattice")?;
        let rows = self.asset.num_timesteps();
        if terminal >= rows {
            return Err(Error::IndexOutOfRange {
                index: terminal,
                size: rows,
            });
        }
        st_core::ensure!(
            initial <= terminal,
            "initial row {initial} is after terminal row {terminal}"
        );

        let grid = self.asset.time_grid();
        let mut report = NoArbitrageReport::default();
        for t in (initial..terminal).rev() {
            let df = self.discounting.discount(grid.time(t), grid.time(t + 1));
            for i in 0..=t {
                let q = self.checked_up_probability(t, i, &mut report);
                let up = derivative.node_value(t + 1, i + 1);
                let down = derivative.node_value(t + 1, i);
                let mut value = df * (q * up + (1.0 - q) * down);
                if let Some(payoff) = exercise {
                    value = value.max(payoff(self.asset.node_value(t, i)));
                }
                derivative.set_node_value(t, i, value);
            }
        }
        report.log_summary("induct");
        Ok(report)
    }

    /// Price `payoff` expiring at `expiry`.
    ///
    /// Rows after the expiry row are zeroed, the expiry row is set to the
    /// payoff of the asset values and the tree is rolled back to the root.
    /// Returns `Ok(None)` when `expiry` is not on the lattice.
    ///
    /// # Errors
    /// [`Error::StructuralMismatch`] if `derivative` is not shaped like the
    /// asset lattice.
    pub fn price(
        &self,
        derivative: &mut BinomialTree,
        expiry: Time,
        payoff: &dyn Fn(Real) -> Real,
        style: ExerciseStyle,
    ) -> Result<Option<InductionOutcome>> {
        self.asset.ensure_same_shape(derivative, "derivative lattice")?;
        let grid = self.asset.time_grid();
        let Some(expiry_index) = grid.time_index_for_expiry(expiry) else {
            tracing::warn!(expiry, last = grid.last(), "expiry not reachable on the lattice");
            return Ok(None);
        };

        derivative.zero_after(expiry_index);
        for i in 0..=expiry_index {
            let value = payoff(self.asset.node_value(expiry_index, i));
            derivative.set_node_value(expiry_index, i, value);
        }

        let exercise = match style {
            ExerciseStyle::European => None,
            ExerciseStyle::American => Some(payoff),
        };
        let report = self.induct(derivative, expiry_index, 0, exercise)?;
        Ok(Some(InductionOutcome {
            value: derivative.node_value(0, 0),
            expiry_index,
            report,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use st_math::TimeGrid;
    use st_termstructures::FlatForward;

    /// One-period lattice 100 → {90, 110} over one year.
    fn one_period() -> BinomialTree {
        let mut asset = BinomialTree::new(TimeGrid::uniform(1.0, 1));
        asset.set_node_value(0, 0, 100.0);
        asset.set_node_value(1, 0, 90.0);
        asset.set_node_value(1, 1, 110.0);
        asset
    }

    #[test]
    fn up_probability_from_growth() {
        let asset = one_period();
        let curve = FlatForward::continuous(0.05);
        let induction = BinomialInduction::new(&asset, Discounting::new(&curve), LatticeSettings::default());
        let expected = ((0.05_f64).exp() - 0.9) / 0.2;
        assert_abs_diff_eq!(induction.up_probability(0, 0), expected, epsilon = 1e-14);

        let foreign = FlatForward::continuous(0.05);
        let quanto = BinomialInduction::new(
            &asset,
            Discounting::quanto(&curve, &foreign),
            LatticeSettings::default(),
        );
        // zero net growth
        assert_abs_diff_eq!(quanto.up_probability(0, 0), 0.5, epsilon = 1e-14);
    }

    #[test]
    fn one_step_call() {
        let asset = one_period();
        let curve = FlatForward::continuous(0.05);
        let induction = BinomialInduction::new(&asset, Discounting::new(&curve), LatticeSettings::default());
        let mut derivative = BinomialTree::create_from(&asset);
        let outcome = induction
            .price(&mut derivative, 1.0, &|s| (s - 100.0).max(0.0), ExerciseStyle::European)
            .unwrap()
            .unwrap();
        let q = induction.up_probability(0, 0);
        assert_abs_diff_eq!(outcome.value, (-0.05_f64).exp() * q * 10.0, epsilon = 1e-12);
        assert_eq!(outcome.expiry_index, 1);
        assert!(outcome.report.is_arbitrage_free());
    }

    #[test]
    fn arbitrage_is_reported_not_fatal() {
        let asset = one_period();
        // growth e^{0.2} ≈ 1.22 lies above the up move
        let curve = FlatForward::continuous(0.2);
        let induction = BinomialInduction::new(&asset, Discounting::new(&curve), LatticeSettings::default());
        let mut derivative = BinomialTree::create_from(&asset);
        let outcome = induction
            .price(&mut derivative, 1.0, &|s| s, ExerciseStyle::European)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.report.violations, 1);
        assert!(outcome.report.max_probability > 1.0);
        // the raw q still reprices the forward
        assert_abs_diff_eq!(outcome.value, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn unreachable_expiry_returns_none() {
        let asset = one_period();
        let curve = FlatForward::continuous(0.05);
        let induction = BinomialInduction::new(&asset, Discounting::new(&curve), LatticeSettings::default());
        let mut derivative = BinomialTree::create_from(&asset);
        let payoff = |s: Real| s;
        assert!(induction
            .price(&mut derivative, 1.5, &payoff, ExerciseStyle::European)
            .unwrap()
            .is_none());
        assert!(induction
            .price(&mut derivative, -0.1, &payoff, ExerciseStyle::European)
            .unwrap()
            .is_none());
    }

    #[test]
    fn mismatched_derivative_is_rejected_untouched() {
        let asset = one_period();
        let curve = FlatForward::continuous(0.05);
        let induction = BinomialInduction::new(&asset, Discounting::new(&curve), LatticeSettings::default());
        let mut derivative = BinomialTree::new(TimeGrid::uniform(1.0, 2));
        derivative.set_node_value(2, 1, 3.0);
        let before = derivative.clone();
        assert!(matches!(
            induction.induct(&mut derivative, 1, 0, None),
            Err(Error::StructuralMismatch { .. })
        ));
        assert!(induction
            .price(&mut derivative, 1.0, &|s| s, ExerciseStyle::European)
            .is_err());
        assert_eq!(derivative, before);
    }

    #[test]
    fn bad_rows_are_rejected() {
        let asset = one_period();
        let curve = FlatForward::continuous(0.05);
        let induction = BinomialInduction::new(&asset, Discounting::new(&curve), LatticeSettings::default());
        let mut derivative = BinomialTree::create_from(&asset);
        assert!(matches!(
            induction.induct(&mut derivative, 2, 0, None),
            Err(Error::IndexOutOfRange { index: 2, size: 2 })
        ));
        assert!(induction.induct(&mut derivative, 0, 1, None).is_err());
        // an empty window is a no-op
        assert!(induction.induct(&mut derivative, 1, 1, None).is_ok());
    }

    #[test]
    fn zero_volatility_is_not_degenerate() {
        let mut asset = BinomialTree::new(TimeGrid::uniform(1.0, 1));
        asset.row_mut(0).fill(100.0);
        asset.row_mut(1).fill(100.0);
        let curve = FlatForward::continuous(0.0);
        let induction = BinomialInduction::new(&asset, Discounting::new(&curve), LatticeSettings::default());
        assert_abs_diff_eq!(induction.up_probability(0, 0), 0.5);
        let mut derivative = BinomialTree::create_from(&asset);
        let outcome = induction
            .price(&mut derivative, 1.0, &|s| (s - 95.0).max(0.0), ExerciseStyle::American)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(outcome.value, 5.0, epsilon = 1e-14);
    }
}
