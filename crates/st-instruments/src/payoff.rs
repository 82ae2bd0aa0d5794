//! Option payoffs.
//!
//! A payoff maps the value of the underlying at exercise (a spot price, or a
//! bond price for options on bonds) to the amount received.

use st_core::Real;
use std::fmt;

/// Right to buy or to sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    /// Pays `S − K` when positive.
    Call,
    /// Pays `K − S` when positive.
    Put,
}

impl OptionType {
    /// Direction `φ` of the intrinsic value: `+1` for calls, `−1` for puts.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        })
    }
}

/// Amount received on exercise, as a function of the underlying.
pub trait Payoff: fmt::Debug + Send + Sync {
    /// Exercise value against `underlying`.
    fn value(&self, underlying: Real) -> Real;
}

/// `max(φ·(S − K), 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlainVanillaPayoff {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike `K`.
    pub strike: Real,
}

impl PlainVanillaPayoff {
    /// Payoff of a `option_type` struck at `strike`.
    pub fn new(option_type: OptionType, strike: Real) -> Self {
        Self {
            option_type,
            strike,
        }
    }
}

impl Payoff for PlainVanillaPayoff {
    fn value(&self, underlying: Real) -> Real {
        (self.option_type.sign() * (underlying - self.strike)).max(0.0)
    }
}
