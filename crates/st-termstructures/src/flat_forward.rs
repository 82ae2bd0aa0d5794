//! `FlatForward` — a yield term structure with a constant forward rate.
//!
//! This is the simplest possible yield curve: a constant continuously-compounded
//! rate that applies for all maturities.

use crate::yield_term_structure::YieldTermStructure;
use st_core::{Rate, Time};

/// A flat (constant) forward-rate yield term structure.
///
/// Discount factors are computed as `P(t) = exp(-r * t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForward {
    /// The continuously-compounded flat rate.
    rate: Rate,
}

impl FlatForward {
    /// Create a flat curve from a continuously-compounded rate.
    pub fn continuous(rate: Rate) -> Self {
        Self { rate }
    }

    /// Create a flat curve from an annually-compounded rate.
    pub fn annual(rate: Rate) -> Self {
        Self {
            rate: (1.0 + rate).ln(),
        }
    }

    /// The continuously-compounded flat rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Replace the flat rate.
    pub fn set_rate(&mut self, rate: Rate) {
        self.rate = rate;
    }
}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> f64 {
        (-self.rate * t).exp()
    }

    fn zero_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }

    fn forward_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }
}
