//! Combinations

use rusty_money::iso::Currency;
use smallvec::SmallVec;

use crate::{
    catalog::{Catalog, CatalogError, PurchaseKey},
    purchases::PurchaseRecord,
};

/// A subset of a catalog.
///
/// Holds keys into the catalog it was drawn from; records are resolved
/// through that catalog. Each purchase appears at most once. Keys are kept in
/// the order they were first given, which for searcher output is catalog order.
#[derive(Debug, Clone)]
pub struct Combination<'c> {
    catalog: &'c Catalog<'c>,
    keys: SmallVec<[PurchaseKey; 10]>,
}

impl<'c> Combination<'c> {
    /// The empty combination
    pub fn empty(catalog: &'c Catalog<'c>) -> Self {
        Self {
            catalog,
            keys: SmallVec::new(),
        }
    }

    /// Build a combination from catalog keys. Repeated keys are dropped.
    pub fn from_keys(catalog: &'c Catalog<'c>, keys: impl IntoIterator<Item = PurchaseKey>) -> Self {
        let mut combination = Self::empty(catalog);

        for key in keys {
            combination.push_unique(key);
        }

        combination
    }

    /// Build a combination from purchase names. Repeated names are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownName`] if a name is not in the catalog.
    pub fn from_names<'n>(
        catalog: &'c Catalog<'c>,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<Self, CatalogError> {
        let mut combination = Self::empty(catalog);

        for name in names {
            combination.push_unique(catalog.key(name)?);
        }

        Ok(combination)
    }

    fn push_unique(&mut self, key: PurchaseKey) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    /// Iterate over the records in the combination.
    pub fn iter(&self) -> impl Iterator<Item = &'c PurchaseRecord<'c>> + '_ {
        let catalog = self.catalog;

        self.keys.iter().filter_map(move |&key| catalog.get(key))
    }

    /// Names of the purchases in the combination.
    pub fn names(&self) -> impl Iterator<Item = &'c str> + '_ {
        self.iter().map(PurchaseRecord::name)
    }

    /// Keys of the purchases in the combination.
    pub fn keys(&self) -> &[PurchaseKey] {
        &self.keys
    }

    /// Check if the named purchase is part of the combination.
    pub fn contains(&self, name: &str) -> bool {
        self.catalog
            .key(name)
            .is_ok_and(|key| self.keys.contains(&key))
    }

    /// The catalog the combination was drawn from.
    pub fn catalog(&self) -> &'c Catalog<'c> {
        self.catalog
    }

    /// Currency of the underlying catalog.
    pub fn currency(&self) -> &'c Currency {
        self.catalog.currency()
    }

    /// Get the number of purchases in the combination.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the combination is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use super::*;

    fn catalog<'a>() -> Result<Catalog<'a>, CatalogError> {
        Catalog::with_records(
            [
                PurchaseRecord::new("drying mat", Money::from_minor(849, USD)),
                PurchaseRecord::new("hangers", Money::from_minor(2499, USD)),
                PurchaseRecord::new("steel wool", Money::from_minor(331, USD)),
            ],
            USD,
        )
    }

    #[test]
    fn empty_has_no_records() -> TestResult {
        let catalog = catalog()?;
        let combination = Combination::empty(&catalog);

        assert!(combination.is_empty());
        assert_eq!(combination.iter().count(), 0);
        assert_eq!(combination.currency(), USD);

        Ok(())
    }

    #[test]
    fn from_names_resolves_records() -> TestResult {
        let catalog = catalog()?;
        let combination = Combination::from_names(&catalog, ["steel wool", "drying mat"])?;

        assert_eq!(combination.len(), 2);
        assert_eq!(
            combination.names().collect::<Vec<_>>(),
            vec!["steel wool", "drying mat"]
        );
        assert!(combination.contains("drying mat"));
        assert!(!combination.contains("hangers"));

        Ok(())
    }

    #[test]
    fn from_names_rejects_unknown_name() -> TestResult {
        let catalog = catalog()?;
        let result = Combination::from_names(&catalog, ["anvil"]);

        assert!(matches!(result, Err(CatalogError::UnknownName(name)) if name == "anvil"));

        Ok(())
    }

    #[test]
    fn from_names_counts_repeated_name_once() -> TestResult {
        let catalog = catalog()?;
        let combination =
            Combination::from_names(&catalog, ["hangers", "steel wool", "hangers"])?;

        assert_eq!(combination.len(), 2);
        assert_eq!(
            combination.names().collect::<Vec<_>>(),
            vec!["hangers", "steel wool"]
        );

        Ok(())
    }

    #[test]
    fn from_keys_drops_repeated_keys() -> TestResult {
        let catalog = catalog()?;
        let key = catalog.key("drying mat")?;
        let combination = Combination::from_keys(&catalog, [key, key]);

        assert_eq!(combination.keys(), &[key]);

        Ok(())
    }

    #[test]
    fn from_keys_keeps_given_order() -> TestResult {
        let catalog = catalog()?;
        let keys: Vec<PurchaseKey> = catalog.keys().collect();
        let combination = Combination::from_keys(&catalog, keys.iter().rev().copied());

        assert_eq!(
            combination.names().collect::<Vec<_>>(),
            vec!["steel wool", "hangers", "drying mat"]
        );

        Ok(())
    }
}
