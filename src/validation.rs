//! Validation
//!
//! Hard errors reject a run before any search starts. Warnings are returned as
//! plain values so callers decide where they go; [`log_warnings`] sends them to
//! `tracing`.

use std::fmt;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::warn;

use crate::{catalog::Catalog, purchases::PurchaseRecord, rules::RuleConfiguration};

/// Monetary field of a purchase record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    /// Pre-tax price
    Price,
    /// Additive tax
    Tax,
    /// Per-item shipping fee
    ShippingFee,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordField::Price => "price",
            RecordField::Tax => "tax",
            RecordField::ShippingFee => "shipping fee",
        })
    }
}

/// Monetary field of the rule configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    /// Budget
    Budget,
    /// Free-shipping minimum
    FreeShippingMinimum,
    /// Shipping surcharge
    Surcharge,
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleField::Budget => "budget",
            RuleField::FreeShippingMinimum => "free shipping minimum",
            RuleField::Surcharge => "surcharge",
        })
    }
}

/// Input that must be rejected before searching.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A purchase has a negative monetary field.
    #[error("Purchase {name:?} has a negative {field}: {minor_units} minor units")]
    NegativeAmount {
        /// Purchase name
        name: String,
        /// Offending field
        field: RecordField,
        /// Offending value in minor units
        minor_units: i64,
    },

    /// A rule amount is negative.
    #[error("Rule {rule} is negative: {minor_units} minor units")]
    NegativeRule {
        /// Offending rule
        rule: RuleField,
        /// Offending value in minor units
        minor_units: i64,
    },

    /// The effective tax percentage is negative.
    #[error("Effective tax percentage is negative")]
    NegativeEffectiveTax,

    /// A rule amount is in a different currency than the catalog.
    #[error("Rule {rule} has currency {actual}, but catalog has currency {expected}")]
    CurrencyMismatch {
        /// Offending rule
        rule: RuleField,
        /// Currency of the rule amount
        actual: &'static str,
        /// Currency of the catalog
        expected: &'static str,
    },
}

/// Suspicious but accepted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationWarning {
    /// The purchase has no shipping fee and does not count toward free shipping.
    NoShippingWithoutQualifier {
        /// Purchase name
        name: String,
    },

    /// The purchase counts toward free shipping but still charges a shipping fee.
    QualifierWithShippingFee {
        /// Purchase name
        name: String,
    },

    /// An effective tax percentage is set while the purchase carries its own tax.
    MixedTax {
        /// Purchase name
        name: String,
    },
}

impl ConfigurationWarning {
    /// Name of the purchase the warning is about
    pub fn name(&self) -> &str {
        match self {
            ConfigurationWarning::NoShippingWithoutQualifier { name }
            | ConfigurationWarning::QualifierWithShippingFee { name }
            | ConfigurationWarning::MixedTax { name } => name,
        }
    }
}

impl fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationWarning::NoShippingWithoutQualifier { name } => write!(
                f,
                "item {name} has no shipping fee and doesn't qualify for free shipping"
            ),
            ConfigurationWarning::QualifierWithShippingFee { name } => write!(
                f,
                "item {name} qualifies for free shipping and has a shipping cost"
            ),
            ConfigurationWarning::MixedTax { name } => write!(
                f,
                "item {name} has its own tax while an effective tax percentage is set"
            ),
        }
    }
}

/// Check a catalog and rules for values the search cannot accept.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, checking rules before records.
pub fn validate(catalog: &Catalog<'_>, rules: &RuleConfiguration<'_>) -> Result<(), ValidationError> {
    let expected = catalog.currency();

    for (rule, amount) in [
        (RuleField::Budget, rules.budget()),
        (RuleField::FreeShippingMinimum, rules.free_shipping_minimum()),
        (RuleField::Surcharge, rules.surcharge()),
    ] {
        check_rule(rule, amount, expected)?;
    }

    if rules.effective_tax_fraction() < Decimal::ZERO {
        return Err(ValidationError::NegativeEffectiveTax);
    }

    catalog
        .iter()
        .try_for_each(|(_, record)| validate_record(record))
}

/// Check a single record for negative monetary fields.
///
/// # Errors
///
/// Returns [`ValidationError::NegativeAmount`] naming the first negative field.
pub fn validate_record(record: &PurchaseRecord<'_>) -> Result<(), ValidationError> {
    [
        (RecordField::Price, record.price()),
        (RecordField::Tax, record.tax()),
        (RecordField::ShippingFee, record.shipping_fee()),
    ]
    .into_iter()
    .try_for_each(|(field, amount)| {
        let minor_units = amount.to_minor_units();

        if minor_units < 0 {
            Err(ValidationError::NegativeAmount {
                name: record.name().to_string(),
                field,
                minor_units,
            })
        } else {
            Ok(())
        }
    })
}

fn check_rule(
    rule: RuleField,
    amount: &Money<'_, Currency>,
    expected: &Currency,
) -> Result<(), ValidationError> {
    if amount.currency() != expected {
        return Err(ValidationError::CurrencyMismatch {
            rule,
            actual: amount.currency().iso_alpha_code,
            expected: expected.iso_alpha_code,
        });
    }

    let minor_units = amount.to_minor_units();

    if minor_units < 0 {
        return Err(ValidationError::NegativeRule { rule, minor_units });
    }

    Ok(())
}

/// Collect every warning for a catalog and rules, in catalog order.
pub fn warnings(catalog: &Catalog<'_>, rules: &RuleConfiguration<'_>) -> Vec<ConfigurationWarning> {
    let mixed_tax = rules.has_effective_tax();

    catalog
        .iter()
        .flat_map(|(_, record)| {
            let shipping = record.shipping_warning();
            let tax = (mixed_tax && record.tax().to_minor_units() != 0).then(|| {
                ConfigurationWarning::MixedTax {
                    name: record.name().to_string(),
                }
            });

            shipping.into_iter().chain(tax)
        })
        .collect()
}

/// Log every warning at `WARN` level and return how many there were.
pub fn log_warnings(catalog: &Catalog<'_>, rules: &RuleConfiguration<'_>) -> usize {
    let warnings = warnings(catalog, rules);

    for warning in &warnings {
        warn!(purchase = warning.name(), "{warning}. You may want to double-check that");
    }

    warnings.len()
}
