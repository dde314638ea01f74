//! Purchase Fixtures

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{fixtures::FixtureError, purchases::PurchaseRecord};

/// Purchase Fixture
#[derive(Debug, Deserialize)]
pub struct PurchaseFixture {
    /// Purchase name, unique within the fixture
    pub name: String,

    /// Pre-tax price (e.g., "24.99 USD")
    pub price: String,

    /// Flat per-item tax
    #[serde(default)]
    pub tax: Option<String>,

    /// Per-item shipping fee
    #[serde(default)]
    pub shipping_fee: Option<String>,

    /// Whether the price counts toward free shipping
    #[serde(default)]
    pub free_shipping: bool,
}

impl TryFrom<PurchaseFixture> for PurchaseRecord<'static> {
    type Error = FixtureError;

    fn try_from(fixture: PurchaseFixture) -> Result<Self, Self::Error> {
        let price = parse_money(&fixture.price)?;
        let currency = price.currency();

        let tax = optional_money(fixture.tax.as_deref(), currency)?;
        let shipping_fee = optional_money(fixture.shipping_fee.as_deref(), currency)?;

        Ok(PurchaseRecord::new(fixture.name, price)
            .with_tax(tax)
            .with_shipping_fee(shipping_fee)
            .with_free_shipping(fixture.free_shipping))
    }
}

/// Parse an optional amount, defaulting to zero in `currency`.
pub(crate) fn optional_money(
    value: Option<&str>,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, FixtureError> {
    let Some(value) = value else {
        return Ok(Money::from_minor(0, currency));
    };

    let money = parse_money(value)?;

    expect_currency(currency, money.currency())?;

    Ok(money)
}

fn expect_currency(expected: &Currency, actual: &Currency) -> Result<(), FixtureError> {
    if expected == actual {
        Ok(())
    } else {
        Err(FixtureError::CurrencyMismatch(
            expected.iso_alpha_code.to_string(),
            actual.iso_alpha_code.to_string(),
        ))
    }
}

/// Parse a price string into [`Money`]
///
/// # Errors
///
/// See [`parse_price`].
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse price string (e.g., "2.99 USD") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| {
            value
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

/// Parse percentage string (e.g., "10%" or "0.10") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_rejects_missing_currency() {
        let result = parse_price("24.99");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_rounds_to_minor_units() -> TestResult {
        let (minor, currency) = parse_price("5.999 USD")?;

        assert_eq!(minor, 600);
        assert_eq!(currency, USD);

        Ok(())
    }

    #[test]
    fn parse_price_rounds_half_cents_away_from_zero() -> TestResult {
        assert_eq!(parse_price("0.125 USD")?.0, 13);
        assert_eq!(parse_price("0.135 USD")?.0, 14);
        assert_eq!(parse_price("-0.125 USD")?.0, -13);

        Ok(())
    }

    #[test]
    fn parse_price_accepts_negative_amounts() -> TestResult {
        // Rejected later by validation, not by the parser.
        let (minor, _) = parse_price("-1.50 GBP")?;

        assert_eq!(minor, -150);

        Ok(())
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> TestResult {
        assert_eq!(parse_percentage("15%")?, Percentage::from(0.15));
        assert_eq!(parse_percentage(" 0.15 ")?, Percentage::from(0.15));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_invalid_format() {
        let result = parse_percentage("ten percent");

        assert!(matches!(result, Err(FixtureError::InvalidPercentage(_))));
    }

    #[test]
    fn purchase_fixture_defaults_missing_amounts_to_zero() -> TestResult {
        let fixture = PurchaseFixture {
            name: "steel wool".to_string(),
            price: "3.31 USD".to_string(),
            tax: None,
            shipping_fee: None,
            free_shipping: true,
        };

        let record = PurchaseRecord::try_from(fixture)?;

        assert_eq!(record.price(), &Money::from_minor(331, USD));
        assert_eq!(record.tax(), &Money::from_minor(0, USD));
        assert_eq!(record.shipping_fee(), &Money::from_minor(0, USD));
        assert!(record.qualifies_for_free_shipping());

        Ok(())
    }

    #[test]
    fn purchase_fixture_rejects_mixed_currencies() {
        let fixture = PurchaseFixture {
            name: "pirate flag".to_string(),
            price: "26.62 USD".to_string(),
            tax: Some("2.81 GBP".to_string()),
            shipping_fee: None,
            free_shipping: false,
        };

        let result = PurchaseRecord::try_from(fixture);

        assert!(matches!(
            result,
            Err(FixtureError::CurrencyMismatch(expected, actual)) if expected == "USD" && actual == "GBP"
        ));
    }
}
