//! Vanilla options priced on an asset lattice.
//!
//! A [`VanillaOption`] keeps its own derivative lattice, shaped like the
//! asset lattice it was last priced on, and caches its value against the
//! model's [`Revision`](st_core::Revision). Re-propagating the model bumps
//! the revision; the next [`npv`](VanillaOption::npv) then re-prices.

use std::sync::Arc;

use st_core::{errors::Result, LazyState, Price, Real, Time};
use st_math::TimeGrid;
use st_methods::lattice::{
    BinomialInduction, BinomialTree, Discounting, ExerciseStyle, InductionOutcome, Propagator,
    StochasticTreeModel,
};
use st_termstructures::YieldTermStructure;

use crate::payoff::{OptionType, Payoff, PlainVanillaPayoff};

/// A call or put on the asset of a [`StochasticTreeModel`].
#[derive(Debug)]
pub struct VanillaOption {
    payoff: PlainVanillaPayoff,
    expiry: Time,
    exercise: ExerciseStyle,
    curve: Arc<dyn YieldTermStructure>,
    foreign: Option<Arc<dyn YieldTermStructure>>,
    values: BinomialTree,
    state: LazyState<Option<InductionOutcome>>,
}

impl VanillaOption {
    /// Create an option discounted on `curve`.
    pub fn new(
        option_type: OptionType,
        strike: Real,
        expiry: Time,
        exercise: ExerciseStyle,
        curve: Arc<dyn YieldTermStructure>,
    ) -> Self {
        Self {
            payoff: PlainVanillaPayoff::new(option_type, strike),
            expiry,
            exercise,
            curve,
            foreign: None,
            values: BinomialTree::new(TimeGrid::origin()),
            state: LazyState::new(),
        }
    }

    /// Convenience: a European option.
    pub fn european(
        option_type: OptionType,
        strike: Real,
        expiry: Time,
        curve: Arc<dyn YieldTermStructure>,
    ) -> Self {
        Self::new(option_type, strike, expiry, ExerciseStyle::European, curve)
    }

    /// Convenience: an American option.
    pub fn american(
        option_type: OptionType,
        strike: Real,
        expiry: Time,
        curve: Arc<dyn YieldTermStructure>,
    ) -> Self {
        Self::new(option_type, strike, expiry, ExerciseStyle::American, curve)
    }

    /// Treat the underlying as paying the yield of `foreign` (an FX rate or
    /// a dividend yield): the risk-neutral growth becomes the ratio of the
    /// two curves' growths.
    pub fn with_foreign_curve(mut self, foreign: Arc<dyn YieldTermStructure>) -> Self {
        self.foreign = Some(foreign);
        self.state.invalidate();
        self
    }

    /// The payoff.
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// Call or put.
    pub fn option_type(&self) -> OptionType {
        self.payoff.option_type
    }

    /// Strike.
    pub fn strike(&self) -> Real {
        self.payoff.strike
    }

    /// Expiry in years.
    pub fn expiry(&self) -> Time {
        self.expiry
    }

    /// Exercise style.
    pub fn exercise(&self) -> ExerciseStyle {
        self.exercise
    }

    /// Value at the root of the lattice, re-priced only if `model` was
    /// propagated since the last call.
    ///
    /// Returns `Ok(None)` when the expiry is not on the model's lattice. A
    /// stale model is priced as last propagated.
    ///
    /// # Errors
    /// Propagates induction errors.
    pub fn npv<P: Propagator>(&mut self, model: &StochasticTreeModel<P>) -> Result<Option<Price>> {
        if model.is_stale() {
            tracing::warn!(
                revision = model.revision().value(),
                "pricing on a lattice whose inputs changed since it was propagated"
            );
        }
        let Self {
            payoff,
            expiry,
            exercise,
            curve,
            foreign,
            values,
            state,
        } = self;
        let domestic: &dyn YieldTermStructure = &**curve;
        let foreign: Option<&dyn YieldTermStructure> = foreign.as_deref();
        let outcome = state.get_or_calculate(model.revision(), || {
            let asset = model.tree();
            let discounting = match foreign {
                Some(foreign) => Discounting::quanto(domestic, foreign),
                None => Discounting::new(domestic),
            };
            let induction = BinomialInduction::new(asset, discounting, *model.settings());
            *values = BinomialTree::create_from(asset);
            let payoff_fn = |s: Real| payoff.value(s);
            let outcome = induction.price(values, *expiry, &payoff_fn, *exercise)?;
            if let Some(o) = &outcome {
                tracing::debug!(
                    option = %payoff.option_type,
                    strike = payoff.strike,
                    expiry = *expiry,
                    npv = o.value,
                    revision = model.revision().value(),
                    "option priced"
                );
            }
            Ok(outcome)
        })?;
        Ok(outcome.map(|o| o.value))
    }

    /// `true` if `model` was propagated since the option was last priced.
    pub fn is_stale<P: Propagator>(&self, model: &StochasticTreeModel<P>) -> bool {
        self.state.is_stale(model.revision())
    }

    /// Outcome of the last pricing, if any.
    pub fn last_outcome(&self) -> Option<&InductionOutcome> {
        self.state.cached().and_then(Option::as_ref)
    }

    /// The derivative lattice of the last pricing.
    pub fn value_tree(&self) -> &BinomialTree {
        &self.values
    }
}
