//! Error types for stochtree.
//!
//! A single `thiserror`-derived enum covers every failure a lattice
//! operation can report. The `ensure!` and `fail!` convenience macros
//! defined here produce its precondition and runtime variants.
//!
//! Note that two conditions are deliberately *not* errors: an expiry that
//! falls outside a time grid (lookups return `None`) and a risk-neutral
//! probability outside `[0, 1]` (logged, computation continues).

use thiserror::Error;

/// The top-level error type used throughout stochtree.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// Two lattices used together do not have the same shape.
    #[error("structural mismatch in {what}: expected {expected}, found {found}")]
    StructuralMismatch {
        /// What was compared (slice count, width of slice `m`, ...).
        what: String,
        /// Value on the reference lattice.
        expected: usize,
        /// Value on the other lattice.
        found: usize,
    },
}

/// Shorthand `Result` type used throughout stochtree.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use st_core::{ensure, errors::Error};
/// fn positive(x: f64) -> st_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use st_core::{fail, errors::Error};
/// fn always_fails() -> st_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(matches!(always_fails(), Err(Error::Runtime(_))));
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
