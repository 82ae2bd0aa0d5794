//! # st-models
//!
//! Short-rate models on lattices.
//!
//! ```text
//! HullWhite                 dr = (θ(t) − a·r) dt + σ dW
//! ├── build_tree            → HullWhiteTree (trinomial, fitted to a curve)
//! └── discount_bond         closed form, for cross-checks
//! HullWhitePropagator       binomial short-rate lattice (Propagator)
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── One-factor short-rate models ─────────────────────────────────────────
pub mod hull_white;
pub mod hull_white_propagator;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use hull_white::{HullWhite, HullWhiteTree};
pub use hull_white_propagator::{lattice_discount_bond, HullWhitePropagator};
