//! # st-methods
//!
//! Lattice methods: binomial and trinomial trees over a [`TimeGrid`],
//! pluggable per-node propagators, forward propagation, backward induction
//! and Arrow-Debreu state-price sweeps.
//!
//! [`TimeGrid`]: st_math::TimeGrid
//!
//! # Modules
//!
//! * [`lattice`] — trees, propagators, the forward-propagation model and
//!   backward induction

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Lattice methods: binomial trees, trinomial trees, backward induction.
pub mod lattice;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use lattice::{
    trinomial_backward_induction, BinomialInduction, BinomialTree, BranchStyle, CrrPropagator,
    Discounting, ExerciseStyle, InductionOutcome, JarrowRuddPropagator, LocalVolPropagator,
    NoArbitrageReport, Propagator, StochasticTreeModel, TrinomialNode, TrinomialTree,
};
