//! # stochtree
//!
//! Tree-based stochastic pricing: recombining binomial and trinomial
//! lattices, backward induction and Arrow-Debreu state prices.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on it rather than on the individual
//! `st-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use stochtree::core::LatticeSettings;
//! use stochtree::instruments::{OptionType, VanillaOption};
//! use stochtree::methods::lattice::{CrrPropagator, StochasticTreeModel};
//! use stochtree::termstructures::{FlatForward, FlatVol};
//!
//! let settings = LatticeSettings::trading_days();
//! let vol = Arc::new(FlatVol::new(0.2).unwrap());
//! let mut model = StochasticTreeModel::new(CrrPropagator::new(100.0, vol), 0.5, settings.day(), settings);
//! model.propagate();
//!
//! let curve = Arc::new(FlatForward::continuous(0.03));
//! let mut call = VanillaOption::european(OptionType::Call, 100.0, 0.5, curve);
//! let npv = call.npv(&model).unwrap().unwrap();
//! assert!(npv > 5.0 && npv < 7.0);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, errors and lattice settings.
pub use st_core as core;

/// Time grids, interpolation and the normal distribution.
pub use st_math as math;

/// Yield curves and volatility surfaces.
pub use st_termstructures as termstructures;

/// Binomial and trinomial lattices, propagation and backward induction.
pub use st_methods as methods;

/// Short-rate models on lattices.
pub use st_models as models;

/// Options and bonds.
pub use st_instruments as instruments;
