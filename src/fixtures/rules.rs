//! Rule Fixtures

use serde::Deserialize;

use crate::{
    fixtures::{
        FixtureError,
        purchases::{optional_money, parse_money, parse_percentage},
    },
    rules::RuleConfiguration,
};

/// Rules Fixture
#[derive(Debug, Deserialize)]
pub struct RulesFixture {
    /// Budget (e.g., "75.00 USD"); its currency is the fixture's currency
    pub budget: String,

    /// Eligible subtotal needed to waive the surcharge
    #[serde(default)]
    pub free_shipping_minimum: Option<String>,

    /// Flat surcharge when free shipping is missed
    #[serde(default)]
    pub surcharge: Option<String>,

    /// Effective tax percent (e.g., "10%" or "0.10")
    #[serde(default)]
    pub effective_tax: Option<String>,
}

impl TryFrom<RulesFixture> for RuleConfiguration<'static> {
    type Error = FixtureError;

    fn try_from(fixture: RulesFixture) -> Result<Self, Self::Error> {
        let budget = parse_money(&fixture.budget)?;
        let currency = budget.currency();

        let free_shipping_minimum =
            optional_money(fixture.free_shipping_minimum.as_deref(), currency)?;
        let surcharge = optional_money(fixture.surcharge.as_deref(), currency)?;

        let rules = RuleConfiguration::new(budget, free_shipping_minimum, surcharge);

        match fixture.effective_tax.as_deref() {
            Some(effective_tax) => Ok(rules.with_effective_tax(parse_percentage(effective_tax)?)),
            None => Ok(rules),
        }
    }
}
