//! Arrow-Debreu state prices on a binomial asset lattice.
//!
//! The state price of node `(t, i)` is today's value of a claim paying one
//! unit if and only if that node is reached. Prices are swept forward from a
//! unit root using the same risk-neutral probabilities and discount factors
//! as backward induction:
//!
//! ```text
//! AD(t+1, i) = AD(t, i−1)·q(t, i−1)·P + AD(t, i)·(1 − q(t, i))·P
//! ```
//!
//! Each row therefore sums to the discount factor to its time.

use st_core::{Probability, Real};

use super::{BinomialInduction, BinomialTree, NoArbitrageReport};

impl BinomialInduction<'_> {
    /// State prices for every node of the asset lattice.
    pub fn arrow_debreu(&self) -> (BinomialTree, NoArbitrageReport) {
        let mut prices = BinomialTree::create_from(self.asset);
        let mut report = NoArbitrageReport::default();
        prices.set_node_value(0, 0, 1.0);

        let grid = self.asset.time_grid();
        for t in 0..self.asset.num_timesteps().saturating_sub(1) {
            let df = self.discounting.discount(grid.time(t), grid.time(t + 1));
            for i in 0..=t {
                let ad = prices.node_value(t, i);
                let q = self.checked_up_probability(t, i, &mut report);
                let up = prices.node_value(t + 1, i + 1) + ad * q * df;
                let down = prices.node_value(t + 1, i) + ad * (1.0 - q) * df;
                prices.set_node_value(t + 1, i + 1, up);
                prices.set_node_value(t + 1, i, down);
            }
        }
        report.log_summary("arrow_debreu");
        (prices, report)
    }

    /// Risk-neutral probabilities of reaching each node of row `t`: state
    /// prices divided by the discount factor to `t`.
    ///
    /// Empty outside the lattice.
    pub fn risk_neutral_distribution(&self, state_prices: &BinomialTree, t: usize) -> Vec<Probability> {
        if t >= state_prices.num_timesteps() {
            return Vec::new();
        }
        let df = self.discounting.domestic().discount(state_prices.time(t));
        state_prices.row(t).iter().map(|&ad| ad / df).collect()
    }

    /// Value of `payoff` paid at row `t`, as the sum of state price times
    /// payoff over the row.
    pub fn state_price_value(
        &self,
        state_prices: &BinomialTree,
        t: usize,
        payoff: &dyn Fn(Real) -> Real,
    ) -> Real {
        state_prices
            .row(t)
            .iter()
            .zip(self.asset.row(t))
            .map(|(&ad, &s)| ad * payoff(s))
            .sum()
    }
}
