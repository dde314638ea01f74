//! Cost Evaluation
//!
//! All arithmetic happens in minor units. A combination's unadjusted total is
//! `scale(Σ price + tax) + Σ shipping fee`, where `scale` applies the effective
//! tax percentage once to the whole sum. The adjusted total adds the flat
//! surcharge when a non-empty combination's eligible subtotal is below the
//! free-shipping minimum.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::warn;

use crate::{combination::Combination, purchases::PurchaseRecord, rules::RuleConfiguration};

/// Errors raised while computing costs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    /// A sum or the tax scaling left the `i64` minor-unit range.
    #[error("cost arithmetic overflowed")]
    Overflow,
}

/// Running sums for a set of purchases, in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Totals {
    /// Σ (price + tax)
    pub(crate) taxable: i64,

    /// Σ shipping fee
    pub(crate) shipping: i64,

    /// Σ price over free-shipping qualifiers
    pub(crate) eligible: i64,

    /// Number of purchases
    pub(crate) count: usize,
}

impl Totals {
    /// Totals for a single record.
    pub(crate) fn of(record: &PurchaseRecord<'_>) -> Result<Self, EvaluationError> {
        let price = record.price().to_minor_units();

        Ok(Self {
            taxable: price
                .checked_add(record.tax().to_minor_units())
                .ok_or(EvaluationError::Overflow)?,
            shipping: record.shipping_fee().to_minor_units(),
            eligible: if record.qualifies_for_free_shipping() {
                price
            } else {
                0
            },
            count: 1,
        })
    }

    /// Totals for every record of a combination.
    pub(crate) fn of_combination(combination: &Combination<'_>) -> Result<Self, EvaluationError> {
        combination
            .iter()
            .try_fold(Self::default(), |acc, record| acc.combine(&Self::of(record)?))
    }

    /// Sum two disjoint sets of totals.
    pub(crate) fn combine(&self, other: &Self) -> Result<Self, EvaluationError> {
        Ok(Self {
            taxable: checked_sum(self.taxable, other.taxable)?,
            shipping: checked_sum(self.shipping, other.shipping)?,
            eligible: checked_sum(self.eligible, other.eligible)?,
            count: self.count.saturating_add(other.count),
        })
    }
}

fn checked_sum(a: i64, b: i64) -> Result<i64, EvaluationError> {
    a.checked_add(b).ok_or(EvaluationError::Overflow)
}

/// Calculate a percentage of a minor unit amount, rounding half away from zero.
///
/// # Errors
///
/// Returns [`EvaluationError::Overflow`] if the result cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, EvaluationError> {
    let minor = Decimal::from_i64(minor).ok_or(EvaluationError::Overflow)?;

    ((*percent) * Decimal::ONE) // decimal_percentage crate doesn't actually expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(EvaluationError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(EvaluationError::Overflow)
}

/// Sum of pre-tax prices over the free-shipping qualifiers in a combination.
///
/// # Errors
///
/// Returns [`EvaluationError::Overflow`] if the sum leaves the `i64` range.
pub fn eligible_subtotal<'c>(
    combination: &Combination<'c>,
) -> Result<Money<'c, Currency>, EvaluationError> {
    let totals = Totals::of_combination(combination)?;

    Ok(Money::from_minor(totals.eligible, combination.currency()))
}

/// Computes combination costs under one rule configuration.
#[derive(Debug, Clone, Copy)]
pub struct CostEvaluator<'r> {
    rules: &'r RuleConfiguration<'r>,
}

impl<'r> CostEvaluator<'r> {
    /// Create an evaluator for the given rules.
    pub fn new(rules: &'r RuleConfiguration<'r>) -> Self {
        Self { rules }
    }

    /// Rules this evaluator applies.
    pub fn rules(&self) -> &'r RuleConfiguration<'r> {
        self.rules
    }

    /// Unadjusted total: taxed prices plus per-item shipping, no surcharge.
    ///
    /// Logs a warning for every included purchase that carries its own tax
    /// while an effective tax percentage is configured.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Overflow`] if the total cannot be represented.
    pub fn evaluate<'c>(
        &self,
        combination: &Combination<'c>,
    ) -> Result<Money<'c, Currency>, EvaluationError> {
        if self.rules.has_effective_tax() {
            for record in combination.iter() {
                if record.tax().to_minor_units() != 0 {
                    warn!(
                        purchase = record.name(),
                        "purchase has a non-zero tax value while an effective tax percentage is set"
                    );
                }
            }
        }

        let totals = Totals::of_combination(combination)?;

        Ok(Money::from_minor(
            self.unadjusted_minor(&totals)?,
            combination.currency(),
        ))
    }

    /// Check if the surcharge applies to a combination.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Overflow`] if the eligible subtotal cannot be represented.
    pub fn surcharge_applies(&self, combination: &Combination<'_>) -> Result<bool, EvaluationError> {
        Ok(self.surcharge_applies_to(&Totals::of_combination(combination)?))
    }

    /// Unadjusted total plus the surcharge when it applies.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Overflow`] if the total cannot be represented.
    pub fn adjusted_total<'c>(
        &self,
        combination: &Combination<'c>,
    ) -> Result<Money<'c, Currency>, EvaluationError> {
        let totals = Totals::of_combination(combination)?;

        Ok(Money::from_minor(
            self.adjusted_minor(&totals)?,
            combination.currency(),
        ))
    }

    /// Scale a taxable sum by the effective tax percentage.
    pub(crate) fn scale_minor(&self, taxable: i64) -> Result<i64, EvaluationError> {
        if !self.rules.has_effective_tax() {
            return Ok(taxable);
        }

        checked_sum(taxable, percent_of_minor(self.rules.effective_tax(), taxable)?)
    }

    pub(crate) fn unadjusted_minor(&self, totals: &Totals) -> Result<i64, EvaluationError> {
        checked_sum(self.scale_minor(totals.taxable)?, totals.shipping)
    }

    /// The empty combination never carries a surcharge.
    pub(crate) fn surcharge_applies_to(&self, totals: &Totals) -> bool {
        totals.count > 0 && totals.eligible < self.free_shipping_minimum_minor()
    }

    pub(crate) fn surcharge_for(&self, totals: &Totals) -> i64 {
        if self.surcharge_applies_to(totals) {
            self.surcharge_minor()
        } else {
            0
        }
    }

    pub(crate) fn adjusted_minor(&self, totals: &Totals) -> Result<i64, EvaluationError> {
        checked_sum(self.unadjusted_minor(totals)?, self.surcharge_for(totals))
    }

    pub(crate) fn budget_minor(&self) -> i64 {
        self.rules.budget().to_minor_units()
    }

    pub(crate) fn surcharge_minor(&self) -> i64 {
        self.rules.surcharge().to_minor_units()
    }

    pub(crate) fn free_shipping_minimum_minor(&self) -> i64 {
        self.rules.free_shipping_minimum().to_minor_units()
    }
}
