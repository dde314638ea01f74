//! Purchases

use rusty_money::{Money, iso::Currency};

use crate::validation::ConfigurationWarning;

/// A single candidate purchase.
///
/// Records are immutable once built. Tax and shipping fee default to zero in the
/// currency of the price, and the record does not count toward free shipping
/// unless [`PurchaseRecord::with_free_shipping`] says so.
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseRecord<'a> {
    name: String,
    price: Money<'a, Currency>,
    tax: Money<'a, Currency>,
    shipping_fee: Money<'a, Currency>,
    free_shipping_qualifier: bool,
}

impl<'a> PurchaseRecord<'a> {
    /// Creates a new purchase with the given name and pre-tax price
    pub fn new(name: impl Into<String>, price: Money<'a, Currency>) -> Self {
        let zero = Money::from_minor(0, price.currency());

        Self {
            name: name.into(),
            price,
            tax: zero,
            shipping_fee: zero,
            free_shipping_qualifier: false,
        }
    }

    /// Sets the additive tax amount
    #[must_use]
    pub fn with_tax(mut self, tax: Money<'a, Currency>) -> Self {
        self.tax = tax;
        self
    }

    /// Sets the per-item shipping fee
    #[must_use]
    pub fn with_shipping_fee(mut self, shipping_fee: Money<'a, Currency>) -> Self {
        self.shipping_fee = shipping_fee;
        self
    }

    /// Sets whether the price counts toward the free-shipping subtotal
    #[must_use]
    pub fn with_free_shipping(mut self, qualifies: bool) -> Self {
        self.free_shipping_qualifier = qualifies;
        self
    }

    /// Returns the name of the purchase
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pre-tax price
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Returns the additive tax amount
    pub fn tax(&self) -> &Money<'a, Currency> {
        &self.tax
    }

    /// Returns the per-item shipping fee
    pub fn shipping_fee(&self) -> &Money<'a, Currency> {
        &self.shipping_fee
    }

    /// Returns `true` if the price counts toward the free-shipping subtotal
    pub fn qualifies_for_free_shipping(&self) -> bool {
        self.free_shipping_qualifier
    }

    /// Returns the currency of the price
    pub fn currency(&self) -> &'a Currency {
        self.price.currency()
    }

    /// Flags a suspicious shipping setup on this record.
    ///
    /// A record that neither charges shipping nor counts toward free shipping, or
    /// one that does both, is probably mistyped. The record is still usable.
    pub fn shipping_warning(&self) -> Option<ConfigurationWarning> {
        let charges_shipping = self.shipping_fee.to_minor_units() > 0;

        match (charges_shipping, self.free_shipping_qualifier) {
            (false, false) => Some(ConfigurationWarning::NoShippingWithoutQualifier {
                name: self.name.clone(),
            }),
            (true, true) => Some(ConfigurationWarning::QualifierWithShippingFee {
                name: self.name.clone(),
            }),
            _ => None,
        }
    }
}
