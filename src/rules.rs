//! Rule Configuration

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

/// Monetary rules for one search run.
///
/// Passed explicitly to every evaluator and searcher; nothing here is global.
#[derive(Debug, Clone, Copy)]
pub struct RuleConfiguration<'a> {
    /// Maximum total spend, inclusive
    budget: Money<'a, Currency>,

    /// Eligible subtotal needed to waive the surcharge
    free_shipping_minimum: Money<'a, Currency>,

    /// Flat amount added when the eligible subtotal falls short
    surcharge: Money<'a, Currency>,

    /// Global tax applied on top of price + per-item tax
    effective_tax: Percentage,
}

impl<'a> RuleConfiguration<'a> {
    /// Create rules with no effective tax.
    pub fn new(
        budget: Money<'a, Currency>,
        free_shipping_minimum: Money<'a, Currency>,
        surcharge: Money<'a, Currency>,
    ) -> Self {
        Self {
            budget,
            free_shipping_minimum,
            surcharge,
            effective_tax: Percentage::from(0.0),
        }
    }

    /// Create rules where shipping is always free.
    pub fn with_budget(budget: Money<'a, Currency>) -> Self {
        let zero = Money::from_minor(0, budget.currency());

        Self::new(budget, zero, zero)
    }

    /// Set the global effective tax percentage.
    #[must_use]
    pub fn with_effective_tax(mut self, effective_tax: Percentage) -> Self {
        self.effective_tax = effective_tax;
        self
    }

    /// Maximum total spend, inclusive
    pub fn budget(&self) -> &Money<'a, Currency> {
        &self.budget
    }

    /// Eligible subtotal needed to waive the surcharge
    pub fn free_shipping_minimum(&self) -> &Money<'a, Currency> {
        &self.free_shipping_minimum
    }

    /// Flat amount added when the eligible subtotal falls short
    pub fn surcharge(&self) -> &Money<'a, Currency> {
        &self.surcharge
    }

    /// Global effective tax percentage
    pub fn effective_tax(&self) -> &Percentage {
        &self.effective_tax
    }

    /// Effective tax as a fraction (0.10 for 10%)
    pub fn effective_tax_fraction(&self) -> Decimal {
        self.effective_tax * Decimal::ONE // decimal_percentage doesn't expose the inner Decimal
    }

    /// Check if a non-zero effective tax is configured
    pub fn has_effective_tax(&self) -> bool {
        !self.effective_tax_fraction().is_zero()
    }
}
