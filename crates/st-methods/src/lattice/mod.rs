//! Lattice methods for tree-based pricing.
//!
//! # Overview
//!
//! * [`BinomialTree`] — recombining binomial value tree over a time grid
//! * [`Propagator`] — per-node rule filling an asset lattice
//!   ([`CrrPropagator`], [`JarrowRuddPropagator`], [`LocalVolPropagator`])
//! * [`StochasticTreeModel`] — grid generation plus forward propagation,
//!   versioned by a revision counter
//! * [`BinomialInduction`] — backward induction with risk-neutral
//!   probabilities recovered from the asset lattice, and the Arrow-Debreu
//!   forward sweep
//! * [`TrinomialTree`] — bounded trinomial lattice with slanted edge
//!   branching, and [`trinomial_backward_induction`] over it

pub mod arrow_debreu;
pub mod backward_induction;
pub mod binomial_tree;
pub mod model;
pub mod propagators;
pub mod trinomial_tree;

pub use backward_induction::{
    BinomialInduction, Discounting, ExerciseStyle, InductionOutcome, NoArbitrageReport,
};
pub use binomial_tree::BinomialTree;
pub use model::StochasticTreeModel;
pub use propagators::{CrrPropagator, JarrowRuddPropagator, LocalVolPropagator, Propagator};
pub use trinomial_tree::{
    backward_induction as trinomial_backward_induction, BranchStyle, TrinomialNode, TrinomialTree,
};
