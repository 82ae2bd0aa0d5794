//! Patterns sub-module: lazy re-pricing against upstream revisions.

pub mod lazy_object;

pub use lazy_object::{LazyState, Revision};
