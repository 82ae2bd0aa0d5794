//! Bonds and bond options on a Hull-White lattice.
//!
//! Cashflows are injected straight into the nodes of a value tree shaped
//! like the short-rate lattice, and the tree is rolled back in windows
//! between payment slices. Payments are never moved to a neighbouring
//! slice: a payment time that is not a grid time of the lattice, up to
//! rounding noise, makes the whole valuation return `None`.

use st_core::{errors::Result, DiscountFactor, Price, Real, Time};
use st_math::normal_cdf;
use st_methods::lattice::{trinomial_backward_induction, TrinomialTree};
use st_models::{HullWhite, HullWhiteTree};
use st_termstructures::YieldTermStructure;

use crate::payoff::{OptionType, Payoff, PlainVanillaPayoff};

/// Slice index of `time` on the lattice, logging when it has none.
fn payment_index(rates: &HullWhiteTree, time: Time) -> Option<usize> {
    let grid = rates.time_grid();
    let index = grid.index_of(time);
    if index.is_none() {
        tracing::warn!(
            time,
            last = grid.last(),
            steps = grid.steps(),
            "payment time is not a slice of the lattice"
        );
    }
    index
}

/// Add `amount` to every node of slice `m`.
fn inject(values: &mut TrinomialTree, m: usize, amount: Real) {
    for node in values.slice_mut(m) {
        node.value += amount;
    }
}

// ── Zero-coupon bond ──────────────────────────────────────────────────────────

/// A bond paying `face` at `maturity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroCouponBond {
    face: Real,
    maturity: Time,
}

impl ZeroCouponBond {
    /// Create a zero-coupon bond.
    pub fn new(face: Real, maturity: Time) -> Self {
        Self { face, maturity }
    }

    /// Face amount.
    pub fn face(&self) -> Real {
        self.face
    }

    /// Maturity in years.
    pub fn maturity(&self) -> Time {
        self.maturity
    }

    /// Value on the lattice, or `None` if the maturity is not one of its
    /// slice times.
    ///
    /// # Errors
    /// Propagates induction errors.
    pub fn npv(&self, rates: &HullWhiteTree) -> Result<Option<Price>> {
        let Some(m) = payment_index(rates, self.maturity) else {
            return Ok(None);
        };
        let mut values = rates.value_tree();
        inject(&mut values, m, self.face);
        trinomial_backward_induction(&mut values, rates.tree(), m, 0)?;
        Ok(Some(values.node_value(0, 0)))
    }

    /// Value discounted directly on `curve`.
    pub fn curve_npv(&self, curve: &dyn YieldTermStructure) -> Price {
        self.face * curve.discount(self.maturity)
    }
}

// ── Fixed-coupon bond ─────────────────────────────────────────────────────────

/// A bullet bond paying a fixed coupon `frequency` times a year and the face
/// amount at maturity.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCouponBond {
    face: Real,
    coupon_rate: Real,
    cashflows: Vec<(Time, Real)>,
}

impl FixedCouponBond {
    /// Create a bond whose coupons fall every `1 / frequency` years back
    /// from `maturity`; a first period shorter than that pays a full coupon.
    ///
    /// # Errors
    /// A precondition error if `maturity` is not positive or `frequency` is
    /// zero.
    pub fn new(face: Real, coupon_rate: Real, maturity: Time, frequency: u32) -> Result<Self> {
        st_core::ensure!(
            maturity.is_finite() && maturity > 0.0,
            "maturity must be positive, got {maturity}"
        );
        st_core::ensure!(frequency > 0, "coupon frequency must be positive");
        let period = 1.0 / Real::from(frequency);
        let coupon = face * coupon_rate * period;

        let mut cashflows = Vec::new();
        let mut k = 0_u32;
        loop {
            let t = maturity - Real::from(k) * period;
            if t <= 1e-12 {
                break;
            }
            cashflows.push((t, coupon));
            k += 1;
        }
        cashflows.reverse();
        if let Some(last) = cashflows.last_mut() {
            last.1 += face;
        }
        Ok(Self {
            face,
            coupon_rate,
            cashflows,
        })
    }

    /// Face amount.
    pub fn face(&self) -> Real {
        self.face
    }

    /// Annual coupon rate.
    pub fn coupon_rate(&self) -> Real {
        self.coupon_rate
    }

    /// Payment times and amounts, in time order; the last includes the face.
    pub fn cashflows(&self) -> &[(Time, Real)] {
        &self.cashflows
    }

    /// Value on the lattice, or `None` if a payment time is not one of its
    /// slice times.
    ///
    /// The tree is rolled back from each payment slice to the previous one,
    /// with the coupon added to every node of the slice before the next
    /// window.
    ///
    /// # Errors
    /// Propagates induction errors.
    pub fn npv(&self, rates: &HullWhiteTree) -> Result<Option<Price>> {
        let mut payments = Vec::with_capacity(self.cashflows.len());
        for &(t, amount) in &self.cashflows {
            let Some(m) = payment_index(rates, t) else {
                return Ok(None);
            };
            payments.push((m, amount));
        }
        let Some(&(last, _)) = payments.last() else {
            return Ok(Some(0.0));
        };

        let mut values = rates.value_tree();
        let mut current = last;
        for &(m, amount) in payments.iter().rev() {
            trinomial_backward_induction(&mut values, rates.tree(), current, m)?;
            inject(&mut values, m, amount);
            current = m;
        }
        trinomial_backward_induction(&mut values, rates.tree(), current, 0)?;
        let npv = values.node_value(0, 0);
        tracing::debug!(face = self.face, coupon = self.coupon_rate, npv, "coupon bond priced");
        Ok(Some(npv))
    }

    /// Value discounted directly on `curve`.
    pub fn curve_npv(&self, curve: &dyn YieldTermStructure) -> Price {
        self.cashflows
            .iter()
            .map(|&(t, amount)| amount * curve.discount(t))
            .sum()
    }
}

// ── Option on a zero-coupon bond ──────────────────────────────────────────────

/// A European option, expiring at `expiry`, on a unit zero-coupon bond
/// maturing at `bond_maturity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroBondOption {
    payoff: PlainVanillaPayoff,
    expiry: Time,
    bond_maturity: Time,
}

impl ZeroBondOption {
    /// Create an option struck at `strike` (a bond price).
    ///
    /// # Errors
    /// A precondition error unless `0 < expiry < bond_maturity`.
    pub fn new(option_type: OptionType, strike: Real, expiry: Time, bond_maturity: Time) -> Result<Self> {
        st_core::ensure!(
            expiry > 0.0 && expiry < bond_maturity,
            "option expiry {expiry} must lie inside the bond's life (0, {bond_maturity})"
        );
        Ok(Self {
            payoff: PlainVanillaPayoff::new(option_type, strike),
            expiry,
            bond_maturity,
        })
    }

    /// The payoff on the bond price.
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// Option expiry.
    pub fn expiry(&self) -> Time {
        self.expiry
    }

    /// Maturity of the underlying bond.
    pub fn bond_maturity(&self) -> Time {
        self.bond_maturity
    }

    /// Value on the lattice, or `None` if the expiry or the bond maturity is
    /// not one of its slice times.
    ///
    /// The bond is rolled back from its maturity to the expiry slice, the
    /// payoff replaces the bond values there, and the option is rolled back
    /// to the root.
    ///
    /// # Errors
    /// Propagates induction errors.
    pub fn npv(&self, rates: &HullWhiteTree) -> Result<Option<Price>> {
        let (Some(expiry), Some(maturity)) = (
            payment_index(rates, self.expiry),
            payment_index(rates, self.bond_maturity),
        ) else {
            return Ok(None);
        };

        let mut values = rates.value_tree();
        inject(&mut values, maturity, 1.0);
        trinomial_backward_induction(&mut values, rates.tree(), maturity, expiry)?;
        for node in values.slice_mut(expiry) {
            node.value = self.payoff.value(node.value);
        }
        values.zero_after(expiry);
        trinomial_backward_induction(&mut values, rates.tree(), expiry, 0)?;
        Ok(Some(values.node_value(0, 0)))
    }

    /// Closed-form Hull-White value (Jamshidian):
    ///
    /// ```text
    /// σ_p = σ·B(T,S)·√((1 − e^{−2aT}) / 2a)
    /// h   = ln(P(0,S) / (K·P(0,T))) / σ_p + σ_p/2
    /// C   = P(0,S)·N(h) − K·P(0,T)·N(h − σ_p)
    /// P   = K·P(0,T)·N(σ_p − h) − P(0,S)·N(−h)
    /// ```
    pub fn analytic_npv(&self, model: &HullWhite, curve: &dyn YieldTermStructure) -> Price {
        let p_t: DiscountFactor = curve.discount(self.expiry);
        let p_s: DiscountFactor = curve.discount(self.bond_maturity);
        let k = self.payoff.strike;
        let sigma_p = model.bond_price_volatility(self.expiry, self.bond_maturity);
        let h = (p_s / (k * p_t)).ln() / sigma_p + 0.5 * sigma_p;
        match self.payoff.option_type {
            OptionType::Call => p_s * normal_cdf(h) - k * p_t * normal_cdf(h - sigma_p),
            OptionType::Put => k * p_t * normal_cdf(sigma_p - h) - p_s * normal_cdf(-h),
        }
    }
}
