//! Catalog

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::purchases::PurchaseRecord;

new_key_type! {
    /// Purchase Key
    pub struct PurchaseKey;
}

/// Errors related to catalog construction or lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A purchase with the same name is already in the catalog.
    #[error("Purchase {0:?} is already in the catalog")]
    DuplicateName(String),

    /// One of a purchase's amounts is not in the catalog currency.
    #[error("Purchase {name:?} has currency {actual}, but catalog has currency {expected}")]
    CurrencyMismatch {
        /// Purchase name
        name: String,
        /// Currency of the purchase
        actual: &'static str,
        /// Currency of the catalog
        expected: &'static str,
    },

    /// No purchase with this name exists in the catalog.
    #[error("Purchase {0:?} not found")]
    UnknownName(String),
}

/// The full set of candidate purchases for one run.
///
/// Names are unique. Iteration follows insertion order, which is also the
/// order searchers traverse the catalog in.
#[derive(Debug, Clone)]
pub struct Catalog<'a> {
    records: SlotMap<PurchaseKey, PurchaseRecord<'a>>,
    order: Vec<PurchaseKey>,
    names: FxHashMap<String, PurchaseKey>,
    currency: &'a Currency,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog in the given currency.
    pub fn new(currency: &'a Currency) -> Self {
        Catalog {
            records: SlotMap::with_key(),
            order: Vec::new(),
            names: FxHashMap::default(),
            currency,
        }
    }

    /// Create a catalog from records, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] on a duplicate name or a currency mismatch.
    pub fn with_records(
        records: impl IntoIterator<Item = PurchaseRecord<'a>>,
        currency: &'a Currency,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(currency);

        for record in records {
            catalog.insert(record)?;
        }

        Ok(catalog)
    }

    /// Add a record to the end of the catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] on a duplicate name or a currency mismatch.
    pub fn insert(&mut self, record: PurchaseRecord<'a>) -> Result<PurchaseKey, CatalogError> {
        if self.names.contains_key(record.name()) {
            return Err(CatalogError::DuplicateName(record.name().to_string()));
        }

        for amount in [record.price(), record.tax(), record.shipping_fee()] {
            if amount.currency() != self.currency {
                return Err(CatalogError::CurrencyMismatch {
                    name: record.name().to_string(),
                    actual: amount.currency().iso_alpha_code,
                    expected: self.currency.iso_alpha_code,
                });
            }
        }

        let name = record.name().to_string();
        let key = self.records.insert(record);

        self.order.push(key);
        self.names.insert(name, key);

        Ok(key)
    }

    /// Get a record by key.
    pub fn get(&self, key: PurchaseKey) -> Option<&PurchaseRecord<'a>> {
        self.records.get(key)
    }

    /// Look up the key for a purchase name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownName`] if no record has this name.
    pub fn key(&self, name: &str) -> Result<PurchaseKey, CatalogError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::UnknownName(name.to_string()))
    }

    /// Iterate over keys and records in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (PurchaseKey, &PurchaseRecord<'a>)> {
        self.order
            .iter()
            .filter_map(|&key| self.records.get(key).map(|record| (key, record)))
    }

    /// Iterate over keys in catalog order.
    pub fn keys(&self) -> impl Iterator<Item = PurchaseKey> + '_ {
        self.order.iter().copied()
    }

    /// Position of a key in catalog order.
    pub fn position(&self, key: PurchaseKey) -> Option<usize> {
        self.order.iter().position(|&candidate| candidate == key)
    }

    /// Get the number of records in the catalog.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Get the currency of the catalog.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{GBP, JPY, USD},
    };
    use testresult::TestResult;

    use super::*;

    fn test_records<'a>() -> [PurchaseRecord<'a>; 3] {
        [
            PurchaseRecord::new("drying mat", Money::from_minor(849, USD)),
            PurchaseRecord::new("hangers", Money::from_minor(2499, USD)),
            PurchaseRecord::new("steel wool", Money::from_minor(331, USD)),
        ]
    }

    #[test]
    fn new_with_currency() {
        let catalog = Catalog::new(USD);

        assert_eq!(catalog.currency(), USD);
        assert!(catalog.is_empty());
    }

    #[test]
    fn with_records_keeps_insertion_order() -> TestResult {
        let catalog = Catalog::with_records(test_records(), USD)?;

        let names: Vec<&str> = catalog.iter().map(|(_, record)| record.name()).collect();

        assert_eq!(names, vec!["drying mat", "hangers", "steel wool"]);
        assert_eq!(catalog.len(), 3);

        Ok(())
    }

    #[test]
    fn insert_rejects_duplicate_name() -> TestResult {
        let mut catalog = Catalog::with_records(test_records(), USD)?;

        let result = catalog.insert(PurchaseRecord::new("hangers", Money::from_minor(1, USD)));

        assert_eq!(result, Err(CatalogError::DuplicateName("hangers".to_string())));
        assert_eq!(catalog.len(), 3);

        Ok(())
    }

    #[test]
    fn insert_rejects_currency_mismatch() {
        let mut catalog = Catalog::new(USD);

        let result = catalog.insert(PurchaseRecord::new("tea", Money::from_minor(100, GBP)));

        assert_eq!(
            result,
            Err(CatalogError::CurrencyMismatch {
                name: "tea".to_string(),
                actual: GBP.iso_alpha_code,
                expected: USD.iso_alpha_code,
            })
        );
    }

    #[test]
    fn insert_rejects_tax_or_shipping_in_other_currency() {
        let mut catalog = Catalog::new(USD);

        let tax = catalog.insert(
            PurchaseRecord::new("tea", Money::from_minor(1000, USD))
                .with_tax(Money::from_minor(500, JPY)),
        );
        let shipping = catalog.insert(
            PurchaseRecord::new("kettle", Money::from_minor(1000, USD))
                .with_shipping_fee(Money::from_minor(300, GBP)),
        );

        assert_eq!(
            tax,
            Err(CatalogError::CurrencyMismatch {
                name: "tea".to_string(),
                actual: JPY.iso_alpha_code,
                expected: USD.iso_alpha_code,
            })
        );
        assert_eq!(
            shipping,
            Err(CatalogError::CurrencyMismatch {
                name: "kettle".to_string(),
                actual: GBP.iso_alpha_code,
                expected: USD.iso_alpha_code,
            })
        );
        assert!(catalog.is_empty());
    }

    #[test]
    fn key_and_position_lookups() -> TestResult {
        let catalog = Catalog::with_records(test_records(), USD)?;

        let key = catalog.key("steel wool")?;

        assert_eq!(catalog.position(key), Some(2));
        assert_eq!(catalog.get(key).map(PurchaseRecord::name), Some("steel wool"));
        assert_eq!(
            catalog.key("anvil"),
            Err(CatalogError::UnknownName("anvil".to_string()))
        );

        Ok(())
    }
}
