//! # st-instruments
//!
//! Instruments priced by backward induction on stochtree lattices.
//!
//! | Instrument | Lattice |
//! |---|---|
//! | [`VanillaOption`] | binomial asset lattice of a [`StochasticTreeModel`] |
//! | [`ZeroCouponBond`], [`FixedCouponBond`] | Hull-White trinomial lattice |
//! | [`ZeroBondOption`] | Hull-White trinomial lattice, closed form for comparison |
//!
//! [`StochasticTreeModel`]: st_methods::StochasticTreeModel

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bond;
pub mod option;
pub mod payoff;

pub use bond::{FixedCouponBond, ZeroBondOption, ZeroCouponBond};
pub use option::VanillaOption;
pub use payoff::{OptionType, Payoff, PlainVanillaPayoff};
