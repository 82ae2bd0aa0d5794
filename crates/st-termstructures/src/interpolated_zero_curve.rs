//! `InterpolatedZeroCurve` — a yield term structure built from zero rates.
//!
//! The curve stores (time, zero-rate) pillars and interpolates zero rates
//! linearly in time, flat beyond the first and last pillar. Discount factors
//! at the pillars are cached; the cache and the interpolation are rebuilt
//! whenever an input rate changes.

use crate::yield_term_structure::YieldTermStructure;
use st_core::{errors::Result, DiscountFactor, Rate, Real, Time};
use st_math::{Interpolation1D, LinearInterpolation};

/// A yield curve defined by continuously-compounded zero rates at pillar times.
#[derive(Debug, Clone)]
pub struct InterpolatedZeroCurve {
    /// Pillar times (strictly increasing, strictly positive).
    times: Vec<Time>,
    /// Zero rates at `times`.
    rates: Vec<Rate>,
    /// Discount factors at `times`, kept in step with `rates`.
    discounts: Vec<DiscountFactor>,
    /// `None` for a single-pillar (flat) curve.
    interp: Option<LinearInterpolation>,
}

impl InterpolatedZeroCurve {
    /// Build a zero-rate curve from pillar times and rates.
    ///
    /// # Errors
    /// Times must be strictly positive and strictly increasing, with one
    /// rate per time.
    pub fn new(times: &[Time], rates: &[Rate]) -> Result<Self> {
        st_core::ensure!(!times.is_empty(), "need at least one pillar");
        st_core::ensure!(
            times.len() == rates.len(),
            "times and rates must have the same length"
        );
        st_core::ensure!(times[0] > 0.0, "pillar times must be positive");
        st_core::ensure!(
            times.windows(2).all(|w| w[1] > w[0]),
            "pillar times must be strictly increasing"
        );
        let mut curve = Self {
            times: times.to_vec(),
            rates: rates.to_vec(),
            discounts: Vec::new(),
            interp: None,
        };
        curve.recalculate()?;
        Ok(curve)
    }

    /// Replace the zero rate at pillar `i` and refresh the cache.
    pub fn set_rate(&mut self, i: usize, rate: Rate) -> Result<()> {
        if i >= self.rates.len() {
            return Err(st_core::Error::IndexOutOfRange {
                index: i,
                size: self.rates.len(),
            });
        }
        self.rates[i] = rate;
        self.recalculate()
    }

    /// Replace all zero rates and refresh the cache.
    pub fn set_rates(&mut self, rates: &[Rate]) -> Result<()> {
        st_core::ensure!(
            rates.len() == self.times.len(),
            "expected {} rates, got {}",
            self.times.len(),
            rates.len()
        );
        self.rates.copy_from_slice(rates);
        self.recalculate()
    }

    /// Pillar times.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Pillar zero rates.
    pub fn rates(&self) -> &[Rate] {
        &self.rates
    }

    /// Cached discount factors at the pillars.
    pub fn pillar_discounts(&self) -> &[DiscountFactor] {
        &self.discounts
    }

    fn recalculate(&mut self) -> Result<()> {
        self.discounts = self
            .times
            .iter()
            .zip(&self.rates)
            .map(|(&t, &r)| (-r * t).exp())
            .collect();
        self.interp = if self.times.len() > 1 {
            Some(LinearInterpolation::new(&self.times, &self.rates)?)
        } else {
            None
        };
        Ok(())
    }
}

impl YieldTermStructure for InterpolatedZeroCurve {
    fn zero_rate_impl(&self, t: Time) -> Rate {
        match &self.interp {
            Some(interp) => interp.operator_flat(t),
            None => self.rates[0],
        }
    }

    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t <= 0.0 {
            return 1.0;
        }
        if let Ok(i) = self
            .times
            .binary_search_by(|probe| probe.partial_cmp(&t).unwrap_or(std::cmp::Ordering::Less))
        {
            return self.discounts[i];
        }
        let r: Real = self.zero_rate_impl(t);
        (-r * t).exp()
    }
}
