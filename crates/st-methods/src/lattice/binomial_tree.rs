//! Recombining binomial value trees.
//!
//! A [`BinomialTree`] stores one value per node over a [`TimeGrid`]: row `t`
//! holds `t + 1` nodes, and node `(t, i)` reaches `(t + 1, i)` on a down move
//! and `(t + 1, i + 1)` on an up move. The same container carries asset
//! prices, derivative values and Arrow-Debreu state prices; what a value means
//! is decided by whoever fills it.

use st_core::{errors::Result, Error, Real, Time};
use st_math::TimeGrid;

/// A recombining binomial tree of node values.
#[derive(Debug, Clone, PartialEq)]
pub struct BinomialTree {
    grid: TimeGrid,
    rows: Vec<Vec<Real>>,
}

impl BinomialTree {
    /// Create a zero-filled tree over `grid`.
    pub fn new(grid: TimeGrid) -> Self {
        let mut tree = Self {
            grid: TimeGrid::origin(),
            rows: Vec::new(),
        };
        tree.resize(grid);
        tree
    }

    /// Re-shape the tree over a new grid, zeroing every node.
    ///
    /// Row allocations are reused where possible.
    pub fn resize(&mut self, grid: TimeGrid) {
        let n = grid.size();
        self.rows.truncate(n);
        self.rows.resize_with(n, Vec::new);
        for (t, row) in self.rows.iter_mut().enumerate() {
            row.clear();
            row.resize(t + 1, 0.0);
        }
        self.grid = grid;
    }

    /// A zero-filled tree with the same grid and shape as `other`.
    pub fn create_from(other: &BinomialTree) -> Self {
        Self::new(other.grid.clone())
    }

    /// The time grid the rows are laid out on.
    pub fn time_grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Number of rows (= grid points).
    pub fn num_timesteps(&self) -> usize {
        self.rows.len()
    }

    /// Number of nodes in row `t`; `0` outside the tree.
    pub fn states_at_time_index(&self, t: usize) -> usize {
        self.rows.get(t).map_or(0, Vec::len)
    }

    /// `true` if row `t` does not exist.
    pub fn is_empty_at(&self, t: usize) -> bool {
        self.states_at_time_index(t) == 0
    }

    /// Time of row `t`.
    pub fn time(&self, t: usize) -> Time {
        self.grid.time(t)
    }

    /// Value at node `(t, i)`.
    ///
    /// # Panics
    /// Panics if the node does not exist; use [`get`](Self::get) for a
    /// checked lookup.
    pub fn node_value(&self, t: usize, i: usize) -> Real {
        self.rows[t][i]
    }

    /// Value at node `(t, i)`, or `None` outside the tree.
    pub fn get(&self, t: usize, i: usize) -> Option<Real> {
        self.rows.get(t).and_then(|row| row.get(i)).copied()
    }

    /// Overwrite the value at node `(t, i)`.
    ///
    /// # Panics
    /// Panics if the node does not exist.
    pub fn set_node_value(&mut self, t: usize, i: usize, value: Real) {
        self.rows[t][i] = value;
    }

    /// Row `t`, or an empty slice outside the tree.
    pub fn row(&self, t: usize) -> &[Real] {
        self.rows.get(t).map_or(&[][..], Vec::as_slice)
    }

    /// Mutable row `t`, or an empty slice outside the tree.
    pub fn row_mut(&mut self, t: usize) -> &mut [Real] {
        self.rows.get_mut(t).map_or(&mut [][..], Vec::as_mut_slice)
    }

    /// Zero every row strictly after `t`.
    pub fn zero_after(&mut self, t: usize) {
        for row in self.rows.iter_mut().skip(t + 1) {
            row.fill(0.0);
        }
    }

    /// `true` if both trees have the same grid and row widths.
    pub fn same_shape(&self, other: &BinomialTree) -> bool {
        self.grid == other.grid
            && self.rows.len() == other.rows.len()
            && self.rows.iter().zip(&other.rows).all(|(a, b)| a.len() == b.len())
    }

    /// Fail unless `other` has the same shape as `self`.
    ///
    /// # Errors
    /// [`Error::StructuralMismatch`] naming the first differing dimension.
    pub fn ensure_same_shape(&self, other: &BinomialTree, what: &str) -> Result<()> {
        if self.rows.len() != other.rows.len() {
            return Err(Error::StructuralMismatch {
                what: format!("{what} rows"),
                expected: self.rows.len(),
                found: other.rows.len(),
            });
        }
        if self.grid != other.grid {
            return Err(Error::StructuralMismatch {
                what: format!("{what} time grid"),
                expected: self.grid.size(),
                found: other.grid.size(),
            });
        }
        if let Some((a, b)) = self
            .rows
            .iter()
            .zip(&other.rows)
            .find(|(a, b)| a.len() != b.len())
        {
            return Err(Error::StructuralMismatch {
                what: format!("{what} row width"),
                expected: a.len(),
                found: b.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_grow_by_one() {
        let tree = BinomialTree::new(TimeGrid::uniform(1.0, 4));
        assert_eq!(tree.num_timesteps(), 5);
        for t in 0..5 {
            assert_eq!(tree.states_at_time_index(t), t + 1);
            assert!(tree.row(t).iter().all(|&v| v == 0.0));
        }
        assert_eq!(tree.states_at_time_index(5), 0);
        assert!(tree.is_empty_at(5));
        assert_eq!(tree.get(2, 3), None);
    }

    #[test]
    fn resize_zeroes_and_reshapes() {
        let mut tree = BinomialTree::new(TimeGrid::uniform(1.0, 4));
        tree.set_node_value(3, 2, 7.0);
        tree.resize(TimeGrid::uniform(1.0, 2));
        assert_eq!(tree.num_timesteps(), 3);
        tree.resize(TimeGrid::uniform(1.0, 6));
        assert_eq!(tree.num_timesteps(), 7);
        assert_eq!(tree.node_value(3, 2), 0.0);
        assert_eq!(tree.states_at_time_index(6), 7);
    }

    #[test]
    fn create_from_copies_shape_only() {
        let mut tree = BinomialTree::new(TimeGrid::uniform(1.0, 3));
        tree.set_node_value(1, 1, 4.0);
        let copy = BinomialTree::create_from(&tree);
        assert!(copy.same_shape(&tree));
        assert!(copy.ensure_same_shape(&tree, "copy").is_ok());
        assert_eq!(copy.node_value(1, 1), 0.0);
    }

    #[test]
    fn zero_after_keeps_earlier_rows() {
        let mut tree = BinomialTree::new(TimeGrid::uniform(1.0, 3));
        for t in 0..4 {
            tree.row_mut(t).fill(1.0);
        }
        tree.zero_after(1);
        assert_eq!(tree.row(1), &[1.0, 1.0]);
        assert!(tree.row(2).iter().all(|&v| v == 0.0));
        assert!(tree.row(3).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let a = BinomialTree::new(TimeGrid::uniform(1.0, 3));
        let b = BinomialTree::new(TimeGrid::uniform(1.0, 4));
        assert!(!a.same_shape(&b));
        assert!(matches!(
            a.ensure_same_shape(&b, "derivative"),
            Err(Error::StructuralMismatch { expected: 4, found: 5, .. })
        ));
    }
}
