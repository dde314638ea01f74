//! Fixtures
//!
//! YAML files describing a budget, its shipping rules, and the candidate purchases.

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::{Catalog, CatalogError},
    fixtures::{purchases::PurchaseFixture, rules::RulesFixture},
    purchases::PurchaseRecord,
    rules::RuleConfiguration,
};

pub mod purchases;
pub mod rules;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between amounts
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Purchases could not be added to the catalog
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Top-level YAML document
#[derive(Debug, Deserialize)]
struct FixtureFile {
    rules: RulesFixture,

    #[serde(default)]
    purchases: Vec<PurchaseFixture>,
}

/// A loaded catalog and its rules
#[derive(Debug, Clone)]
pub struct Fixture {
    catalog: Catalog<'static>,
    rules: RuleConfiguration<'static>,
}

impl Fixture {
    /// Parse a fixture from YAML. Purchases keep their order in the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, an amount cannot be parsed,
    /// amounts use different currencies, or two purchases share a name.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        let file: FixtureFile = serde_norway::from_str(contents)?;

        let rules = RuleConfiguration::try_from(file.rules)?;
        let currency = rules.budget().currency();

        let mut catalog = Catalog::new(currency);

        for purchase in file.purchases {
            catalog.insert(PurchaseRecord::try_from(purchase)?)?;
        }

        Ok(Self { catalog, rules })
    }

    /// Load a fixture from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Load a named fixture set from `./fixtures/{name}.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_path(Path::new("./fixtures").join(format!("{name}.yml")))
    }

    /// Candidate purchases
    pub fn catalog(&self) -> &Catalog<'static> {
        &self.catalog
    }

    /// Budget and shipping rules
    pub fn rules(&self) -> &RuleConfiguration<'static> {
        &self.rules
    }

    /// Split into catalog and rules
    pub fn into_parts(self) -> (Catalog<'static>, RuleConfiguration<'static>) {
        (self.catalog, self.rules)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use super::*;

    const FIXTURE: &str = "
rules:
  budget: 20.00 USD
  free_shipping_minimum: 10.00 USD
  surcharge: 1.99 USD
purchases:
  - name: tea
    price: 4.50 USD
    tax: 0.36 USD
    free_shipping: true
  - name: kettle
    price: 12.00 USD
    shipping_fee: 2.50 USD
";

    #[test]
    fn from_yaml_keeps_document_order() -> TestResult {
        let fixture = Fixture::from_yaml(FIXTURE)?;
        let names: Vec<&str> = fixture
            .catalog()
            .iter()
            .map(|(_, record)| record.name())
            .collect();

        assert_eq!(names, vec!["tea", "kettle"]);
        assert_eq!(fixture.catalog().currency(), USD);
        assert_eq!(fixture.rules().surcharge(), &Money::from_minor(199, USD));

        Ok(())
    }

    #[test]
    fn from_yaml_rejects_duplicate_names() {
        let yaml = "
rules:
  budget: 20.00 USD
purchases:
  - name: tea
    price: 4.50 USD
  - name: tea
    price: 5.00 USD
";

        assert!(matches!(
            Fixture::from_yaml(yaml),
            Err(FixtureError::Catalog(CatalogError::DuplicateName(name))) if name == "tea"
        ));
    }

    #[test]
    fn from_yaml_rejects_purchase_in_other_currency() {
        let yaml = "
rules:
  budget: 20.00 USD
purchases:
  - name: tea
    price: 4.50 GBP
";

        assert!(matches!(
            Fixture::from_yaml(yaml),
            Err(FixtureError::Catalog(CatalogError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn from_yaml_rejects_missing_rules() {
        let yaml = "purchases: []\n";

        assert!(matches!(Fixture::from_yaml(yaml), Err(FixtureError::Yaml(_))));
    }

    #[test]
    fn from_yaml_allows_empty_purchase_list() -> TestResult {
        let fixture = Fixture::from_yaml("rules:\n  budget: 1.00 EUR\n")?;

        assert!(fixture.catalog().is_empty());

        Ok(())
    }

    #[test]
    fn from_set_loads_reference_fixture() -> TestResult {
        let fixture = Fixture::from_set("gift-card")?;
        let (catalog, rules) = fixture.into_parts();

        assert_eq!(catalog.len(), 10);
        assert_eq!(rules.budget(), &Money::from_minor(7500, USD));

        Ok(())
    }

    #[test]
    fn from_path_reports_missing_file() {
        let result = Fixture::from_path("./fixtures/does-not-exist.yml");

        assert!(matches!(result, Err(FixtureError::Io(_))));
    }
}
