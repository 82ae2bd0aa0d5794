//! Recombining trinomial trees with bounded slices.
//!
//! Slice `m` of a [`TrinomialTree`] spans the integer states
//! `j ∈ [−w_m, w_m]` with `w_m = min(m, j_limit)`. Interior nodes branch
//! [`BranchStyle::Centered`] to `j+1, j, j−1`; once a slice reaches the
//! limit, its edge nodes branch back inward ([`BranchStyle::SlantedUp`] at
//! the bottom, [`BranchStyle::SlantedDown`] at the top) so the next slice
//! keeps the same width.
//!
//! Each node carries a value, its branch probabilities and an Arrow-Debreu
//! price; each slice carries a shift added to every node value. For a
//! short-rate lattice the node value is the state offset `j·Δx` and the
//! shift is the fitted drift `α_m`, so the node's short rate is their sum.

use st_core::{errors::Result, Error, LatticeSettings, Probability, Real, Time};
use st_math::TimeGrid;

/// How a node branches into the next slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BranchStyle {
    /// Successors `j+1, j, j−1`.
    #[default]
    Centered,
    /// Successors `j+2, j+1, j` (bottom edge).
    SlantedUp,
    /// Successors `j, j−1, j−2` (top edge).
    SlantedDown,
}

impl BranchStyle {
    /// Offsets of the (up, middle, down) successors relative to `j`.
    pub fn successor_offsets(self) -> [i64; 3] {
        match self {
            BranchStyle::Centered => [1, 0, -1],
            BranchStyle::SlantedUp => [2, 1, 0],
            BranchStyle::SlantedDown => [0, -1, -2],
        }
    }
}

/// One node of a trinomial slice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrinomialNode {
    /// Node value (state offset, derivative value, ...).
    pub value: Real,
    /// Branching into the next slice.
    pub branch: BranchStyle,
    /// Probabilities of the (up, middle, down) successors.
    pub probabilities: [Probability; 3],
    /// Arrow-Debreu price of reaching this node.
    pub arrow_debreu: Real,
}

#[derive(Debug, Clone, PartialEq)]
struct Slice {
    half_width: usize,
    shift: Real,
    nodes: Vec<TrinomialNode>,
}

/// A recombining trinomial tree over a [`TimeGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrinomialTree {
    grid: TimeGrid,
    j_limit: usize,
    slices: Vec<Slice>,
}

impl TrinomialTree {
    /// Zero-filled tree over `grid` whose slices stop growing at half width
    /// `j_limit` (at least `1`).
    pub fn new(grid: TimeGrid, j_limit: usize) -> Self {
        let j_limit = j_limit.max(1);
        let slices = (0..grid.size())
            .map(|m| {
                let half_width = m.min(j_limit);
                let w = half_width as i64;
                let nodes = (-w..=w)
                    .map(|j| TrinomialNode {
                        branch: branch_style(j, j_limit),
                        ..TrinomialNode::default()
                    })
                    .collect();
                Slice {
                    half_width,
                    shift: 0.0,
                    nodes,
                }
            })
            .collect();
        Self {
            grid,
            j_limit,
            slices,
        }
    }

    /// A tree with the same grid, branching and probabilities as `other`,
    /// with every value, shift and Arrow-Debreu price set to zero.
    pub fn create_from(other: &TrinomialTree) -> Self {
        let mut tree = other.clone();
        for slice in &mut tree.slices {
            slice.shift = 0.0;
            for node in &mut slice.nodes {
                node.value = 0.0;
                node.arrow_debreu = 0.0;
            }
        }
        tree
    }

    /// The time grid.
    pub fn time_grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Largest half width any slice reaches.
    pub fn j_limit(&self) -> usize {
        self.j_limit
    }

    /// Number of slices (= grid points).
    pub fn num_timesteps(&self) -> usize {
        self.slices.len()
    }

    /// Number of nodes in slice `m`; `0` outside the tree.
    pub fn states_at_time_index(&self, m: usize) -> usize {
        self.slices.get(m).map_or(0, |s| s.nodes.len())
    }

    /// `true` if slice `m` does not exist.
    pub fn is_empty_at(&self, m: usize) -> bool {
        self.states_at_time_index(m) == 0
    }

    /// Half width `w_m` of slice `m`.
    ///
    /// # Panics
    /// Panics if the slice does not exist.
    pub fn half_width(&self, m: usize) -> usize {
        self.slices[m].half_width
    }

    /// State indices `−w_m..=w_m` of slice `m`.
    pub fn states(&self, m: usize) -> std::ops::RangeInclusive<i64> {
        let w = self.half_width(m) as i64;
        -w..=w
    }

    /// Time of slice `m`.
    pub fn time(&self, m: usize) -> Time {
        self.grid.time(m)
    }

    /// Node `(m, j)`, or `None` outside the tree.
    pub fn try_node(&self, m: usize, j: i64) -> Option<&TrinomialNode> {
        let slice = self.slices.get(m)?;
        let k = usize::try_from(j + slice.half_width as i64).ok()?;
        slice.nodes.get(k)
    }

    /// Node `(m, j)`.
    ///
    /// # Panics
    /// Panics if the node does not exist.
    pub fn node(&self, m: usize, j: i64) -> &TrinomialNode {
        let slice = &self.slices[m];
        &slice.nodes[slot(slice, j)]
    }

    /// Mutable node `(m, j)`.
    ///
    /// # Panics
    /// Panics if the node does not exist.
    pub fn node_mut(&mut self, m: usize, j: i64) -> &mut TrinomialNode {
        let slice = &mut self.slices[m];
        let k = slot(slice, j);
        &mut slice.nodes[k]
    }

    /// Value at node `(m, j)`.
    pub fn node_value(&self, m: usize, j: i64) -> Real {
        self.node(m, j).value
    }

    /// Overwrite the value at node `(m, j)`.
    pub fn set_node_value(&mut self, m: usize, j: i64, value: Real) {
        self.node_mut(m, j).value = value;
    }

    /// Nodes of slice `m`, bottom to top.
    pub fn slice(&self, m: usize) -> &[TrinomialNode] {
        self.slices.get(m).map_or(&[][..], |s| s.nodes.as_slice())
    }

    /// Mutable nodes of slice `m`, bottom to top.
    pub fn slice_mut(&mut self, m: usize) -> &mut [TrinomialNode] {
        self.slices.get_mut(m).map_or(&mut [][..], |s| s.nodes.as_mut_slice())
    }

    /// Shift of slice `m`.
    pub fn shift(&self, m: usize) -> Real {
        self.slices[m].shift
    }

    /// Set the shift of slice `m`.
    pub fn set_shift(&mut self, m: usize, shift: Real) {
        self.slices[m].shift = shift;
    }

    /// Successor states `(up, middle, down)` of node `(m, j)` in slice `m + 1`.
    pub fn successors(&self, m: usize, j: i64) -> [i64; 3] {
        self.node(m, j).branch.successor_offsets().map(|k| j + k)
    }

    /// Sum of the Arrow-Debreu prices of slice `m`.
    pub fn arrow_debreu_sum(&self, m: usize) -> Real {
        self.slice(m).iter().map(|n| n.arrow_debreu).sum()
    }

    /// Zero the values of every slice strictly after `m`.
    pub fn zero_after(&mut self, m: usize) {
        for slice in self.slices.iter_mut().skip(m + 1) {
            for node in &mut slice.nodes {
                node.value = 0.0;
            }
        }
    }

    /// Count the nodes of slice `m` whose probabilities are negative or do
    /// not sum to one, logging the first offender.
    pub fn check_probabilities(&self, m: usize, settings: &LatticeSettings) -> usize {
        let mut bad = 0;
        for (j, node) in self.states(m).zip(self.slice(m)) {
            let sum: Real = node.probabilities.iter().sum();
            let ok = node
                .probabilities
                .iter()
                .all(|&p| settings.is_valid_probability(p))
                && (sum - 1.0).abs() <= settings.probability_tolerance.max(1e-12);
            if !ok {
                if bad == 0 {
                    tracing::warn!(m, j, probabilities = ?node.probabilities, "invalid branch probabilities");
                }
                bad += 1;
            }
        }
        bad
    }

    /// `true` if both trees have the same grid and slice widths.
    pub fn same_shape(&self, other: &TrinomialTree) -> bool {
        self.ensure_same_shape(other, "trinomial tree").is_ok()
    }

    /// Fail unless `other` has the same grid and slice widths.
    ///
    /// # Errors
    /// [`Error::StructuralMismatch`] naming the first differing dimension.
    pub fn ensure_same_shape(&self, other: &TrinomialTree, what: &str) -> Result<()> {
        if self.slices.len() != other.slices.len() {
            return Err(Error::StructuralMismatch {
                what: format!("{what} slice count"),
                expected: self.slices.len(),
                found: other.slices.len(),
            });
        }
        if self.grid != other.grid {
            return Err(Error::StructuralMismatch {
                what: format!("{what} time grid"),
                expected: self.grid.size(),
                found: other.grid.size(),
            });
        }
        for (m, (a, b)) in self.slices.iter().zip(&other.slices).enumerate() {
            if a.nodes.len() != b.nodes.len() {
                return Err(Error::StructuralMismatch {
                    what: format!("{what} width of slice {m}"),
                    expected: a.nodes.len(),
                    found: b.nodes.len(),
                });
            }
        }
        Ok(())
    }
}

fn branch_style(j: i64, j_limit: usize) -> BranchStyle {
    let limit = j_limit as i64;
    if j == limit {
        BranchStyle::SlantedDown
    } else if j == -limit {
        BranchStyle::SlantedUp
    } else {
        BranchStyle::Centered
    }
}

fn slot(slice: &Slice, j: i64) -> usize {
    let k = j + slice.half_width as i64;
    assert!(
        (0..slice.nodes.len() as i64).contains(&k),
        "state {j} outside slice of half width {}",
        slice.half_width
    );
    k as usize
}

/// Roll `values` back from slice `terminal` to slice `initial` using the
/// branching and short rates of `rates`.
///
/// Each node of slice `m` becomes
/// `exp(−r·Δt_m) · Σ_k p_k · V(m+1, successor_k)` with `r` the rate tree's
/// slice shift plus node value. Slice `terminal` is read as is, so callers
/// can inject cashflows between windows.
///
/// # Errors
/// [`Error::StructuralMismatch`] if the trees differ in shape,
/// [`Error::IndexOutOfRange`] if `terminal` is not a slice, and a
/// precondition error if `initial > terminal`. `values` is untouched on
/// error.
pub fn backward_induction(
    values: &mut TrinomialTree,
    rates: &TrinomialTree,
    terminal: usize,
    initial: usize,
) -> Result<()> {
    rates.ensure_same_shape(values, "value tree")?;
    let slices = rates.num_timesteps();
    if terminal >= slices {
        return Err(Error::IndexOutOfRange {
            index: terminal,
            size: slices,
        });
    }
    st_core::ensure!(
        initial <= terminal,
        "initial slice {initial} is after terminal slice {terminal}"
    );

    for m in (initial..terminal).rev() {
        let dt = rates.grid.dt(m);
        let shift = rates.shift(m);
        for j in rates.states(m) {
            let node = rates.node(m, j);
            let df = (-(shift + node.value) * dt).exp();
            let continuation: Real = rates
                .successors(m, j)
                .iter()
                .zip(node.probabilities)
                .map(|(&k, p)| p * values.node_value(m + 1, k))
                .sum();
            values.set_node_value(m, j, df * continuation);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn slices_grow_then_saturate() {
        let tree = TrinomialTree::new(TimeGrid::uniform(1.0, 6), 2);
        let widths: Vec<usize> = (0..7).map(|m| tree.states_at_time_index(m)).collect();
        assert_eq!(widths, vec![1, 3, 5, 5, 5, 5, 5]);
        assert!(tree.is_empty_at(7));
        assert_eq!(tree.try_node(1, 2), None);
        assert_eq!(tree.try_node(9, 0), None);
    }

    #[test]
    fn edge_nodes_branch_inward() {
        let tree = TrinomialTree::new(TimeGrid::uniform(1.0, 4), 2);
        assert_eq!(tree.node(1, 1).branch, BranchStyle::Centered);
        assert_eq!(tree.successors(1, 1), [2, 1, 0]);
        assert_eq!(tree.node(2, 2).branch, BranchStyle::SlantedDown);
        assert_eq!(tree.successors(2, 2), [2, 1, 0]);
        assert_eq!(tree.node(2, -2).branch, BranchStyle::SlantedUp);
        assert_eq!(tree.successors(2, -2), [0, -1, -2]);
        // every successor exists in the next slice
        for m in 0..4 {
            for j in tree.states(m) {
                for k in tree.successors(m, j) {
                    assert!(tree.try_node(m + 1, k).is_some());
                }
            }
        }
    }

    #[test]
    fn create_from_keeps_branching() {
        let mut tree = TrinomialTree::new(TimeGrid::uniform(1.0, 2), 1);
        tree.node_mut(1, 0).probabilities = [0.2, 0.6, 0.2];
        tree.node_mut(1, 0).arrow_debreu = 0.5;
        tree.set_node_value(1, 0, 0.03);
        tree.set_shift(1, 0.01);
        let copy = TrinomialTree::create_from(&tree);
        assert!(copy.same_shape(&tree));
        assert_eq!(copy.node(1, 0).probabilities, [0.2, 0.6, 0.2]);
        assert_eq!(copy.node_value(1, 0), 0.0);
        assert_eq!(copy.node(1, 0).arrow_debreu, 0.0);
        assert_eq!(copy.shift(1), 0.0);
    }

    #[test]
    fn probability_check_flags_bad_nodes() {
        let mut tree = TrinomialTree::new(TimeGrid::uniform(1.0, 2), 1);
        for j in tree.states(1) {
            tree.node_mut(1, j).probabilities = [1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0];
        }
        let settings = LatticeSettings::default();
        assert_eq!(tree.check_probabilities(1, &settings), 0);
        tree.node_mut(1, 1).probabilities = [-0.1, 0.9, 0.2];
        tree.node_mut(1, 0).probabilities = [0.5, 0.5, 0.5];
        assert_eq!(tree.check_probabilities(1, &settings), 2);
    }

    #[test]
    fn induction_discounts_constant_payoff() {
        let grid = TimeGrid::uniform(1.0, 2);
        let mut rates = TrinomialTree::new(grid, 1);
        for m in 0..2 {
            rates.set_shift(m, 0.05);
            for j in rates.states(m) {
                rates.node_mut(m, j).probabilities = [0.25, 0.5, 0.25];
            }
        }
        let mut values = TrinomialTree::create_from(&rates);
        for node in values.slice_mut(2) {
            node.value = 1.0;
        }
        backward_induction(&mut values, &rates, 2, 0).unwrap();
        assert_abs_diff_eq!(values.node_value(0, 0), (-0.05_f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn induction_rejects_mismatched_trees() {
        let rates = TrinomialTree::new(TimeGrid::uniform(1.0, 4), 2);
        let mut narrower = TrinomialTree::new(TimeGrid::uniform(1.0, 4), 1);
        narrower.set_node_value(4, 1, 7.0);
        let before = narrower.clone();
        let err = backward_induction(&mut narrower, &rates, 4, 0).unwrap_err();
        assert!(matches!(err, Error::StructuralMismatch { expected: 5, found: 3, .. }));
        assert_eq!(narrower, before);

        let mut longer = TrinomialTree::new(TimeGrid::uniform(1.0, 5), 2);
        assert!(matches!(
            backward_induction(&mut longer, &rates, 4, 0),
            Err(Error::StructuralMismatch { .. })
        ));

        let mut values = TrinomialTree::create_from(&rates);
        assert!(matches!(
            backward_induction(&mut values, &rates, 5, 0),
            Err(Error::IndexOutOfRange { index: 5, size: 5 })
        ));
        assert!(backward_induction(&mut values, &rates, 1, 2).is_err());
    }
}
