//! Receipt

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{purchases::PurchaseRecord, rules::RuleConfiguration, search::SearchResult};

/// Errors that can occur when building or writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// One purchased item with its line total
#[derive(Debug, Clone)]
pub struct ReceiptLine<'a> {
    record: &'a PurchaseRecord<'a>,

    /// Price plus tax plus per-item shipping
    total: Money<'a, Currency>,
}

impl<'a> ReceiptLine<'a> {
    fn new(record: &'a PurchaseRecord<'a>) -> Result<Self, MoneyError> {
        let total = record
            .price()
            .add(*record.tax())?
            .add(*record.shipping_fee())?;

        Ok(Self { record, total })
    }

    /// The purchase this line describes
    pub fn record(&self) -> &'a PurchaseRecord<'a> {
        self.record
    }

    /// Price plus tax plus per-item shipping
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }
}

/// Final receipt for a search result.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: SmallVec<[ReceiptLine<'a>; 10]>,

    /// Taxed prices plus per-item shipping, before any surcharge
    subtotal: Money<'a, Currency>,

    surcharge: Option<Money<'a, Currency>>,

    /// Amount charged to the budget
    total: Money<'a, Currency>,

    budget: Money<'a, Currency>,
}

impl<'a> Receipt<'a> {
    /// Build a receipt for the chosen combination.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if any amount is in a different currency.
    pub fn from_search_result(
        result: &SearchResult<'a>,
        rules: &RuleConfiguration<'a>,
    ) -> Result<Self, ReceiptError> {
        let lines = result
            .combination
            .iter()
            .map(ReceiptLine::new)
            .collect::<Result<SmallVec<_>, _>>()?;

        Ok(Self {
            lines,
            subtotal: result.unadjusted_total,
            surcharge: result.surcharge,
            total: result.total,
            budget: *rules.budget(),
        })
    }

    /// Purchased items, in catalog order
    pub fn lines(&self) -> &[ReceiptLine<'a>] {
        &self.lines
    }

    /// Total before the surcharge
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Surcharge, if free shipping was missed
    pub fn surcharge(&self) -> Option<Money<'a, Currency>> {
        self.surcharge
    }

    /// Amount charged to the budget
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Budget left unspent.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction operation fails.
    pub fn remaining(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.budget.sub(self.total)
    }

    /// Share of the budget that was spent
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the budget and total use different currencies.
    pub fn budget_used_percent(&self) -> Result<Percentage, MoneyError> {
        if self.budget.currency() != self.total.currency() {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.budget.currency().iso_alpha_code,
                actual: self.total.currency().iso_alpha_code,
            });
        }

        let budget_minor = self.budget.to_minor_units();

        if budget_minor == 0 {
            return Ok(Percentage::from(0.0));
        }

        let total_dec = Decimal::from_i64(self.total.to_minor_units()).unwrap_or(Decimal::ZERO);
        let budget_dec = Decimal::from_i64(budget_minor).unwrap_or(Decimal::ZERO);

        Ok(Percentage::from(total_dec / budget_dec))
    }

    /// Write the receipt as a table followed by a summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Price", "Tax", "Shipping", "Total", "Free shipping"]);

        for line in &self.lines {
            let record = line.record();

            builder.push_record([
                record.name().to_string(),
                record.price().to_string(),
                record.tax().to_string(),
                record.shipping_fee().to_string(),
                line.total().to_string(),
                if record.qualifies_for_free_shipping() {
                    "yes".to_string()
                } else {
                    String::new()
                },
            ]);
        }

        write_receipt_table(&mut out, builder)?;
        write_receipt_summary(&mut out, self)
    }

    /// Write one line per purchase, `name = total (price + tax tax)`, then the total.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be written.
    pub fn write_report_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        for line in &self.lines {
            let record = line.record();

            writeln!(
                out,
                "{} = {} ({} + {} tax)",
                record.name(),
                line.total(),
                record.price(),
                record.tax()
            )
            .map_err(|_err| ReceiptError::IO)?;
        }

        if let Some(surcharge) = self.surcharge {
            writeln!(out, "Shipping surcharge = {surcharge}").map_err(|_err| ReceiptError::IO)?;
        }

        writeln!(out, "Total: {}", self.total).map_err(|_err| ReceiptError::IO)
    }
}

fn write_receipt_table(out: &mut impl io::Write, builder: Builder) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..5), Alignment::right());

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(
    out: &mut impl io::Write,
    receipt: &Receipt<'_>,
) -> Result<(), ReceiptError> {
    let remaining = receipt.remaining()?;
    let used_percent_points =
        percent_points_from_fractional_percentage(receipt.budget_used_percent()?);

    let subtotal_label = " Subtotal:";
    let surcharge_label = " Surcharge:";
    let total_label = " \x1b[1mTotal:\x1b[0m";
    let remaining_label = " Remaining:";

    let subtotal_val = format!("{}  ", receipt.subtotal());
    let surcharge_val = match receipt.surcharge() {
        Some(surcharge) => format!("{surcharge}  "),
        None => "-  ".to_string(),
    };
    let total_val = format!("({used_percent_points:.2}%) {}  ", receipt.total());
    let remaining_val = format!("{remaining}  ");

    let label_width = [subtotal_label, surcharge_label, total_label, remaining_label]
        .map(visible_width)
        .into_iter()
        .max()
        .unwrap_or_default();

    let value_width = [
        subtotal_val.len(),
        surcharge_val.len(),
        total_val.len(),
        remaining_val.len(),
    ]
    .into_iter()
    .max()
    .unwrap_or_default();

    write_summary_line(out, subtotal_label, &subtotal_val, label_width, value_width)?;
    write_summary_line(out, surcharge_label, &surcharge_val, label_width, value_width)?;

    write_summary_line(
        out,
        total_label,
        &format!("\x1b[1m{total_val}\x1b[0m"),
        label_width,
        value_width,
    )?;

    write_summary_line(out, remaining_label, &remaining_val, label_width, value_width)?;

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Converts a fractional percentage to percent points for display.
fn percent_points_from_fractional_percentage(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::from_i64(100).unwrap_or(Decimal::ZERO)).round_dp(2)
}

/// Wraps runs of box-drawing characters (U+2500..U+257F) in ANSI dark grey.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::{
        catalog::Catalog,
        search::{Searcher, branch_and_bound::BranchAndBound},
    };

    use super::*;

    fn catalog() -> Result<Catalog<'static>, crate::catalog::CatalogError> {
        Catalog::with_records(
            [
                PurchaseRecord::new("hangers", Money::from_minor(2499, USD))
                    .with_tax(Money::from_minor(279, USD))
                    .with_free_shipping(true),
                PurchaseRecord::new("pirate flag", Money::from_minor(2662, USD))
                    .with_tax(Money::from_minor(281, USD))
                    .with_shipping_fee(Money::from_minor(450, USD)),
            ],
            USD,
        )
    }

    #[test]
    fn from_search_result_copies_totals() -> TestResult {
        let catalog = catalog()?;
        let rules = RuleConfiguration::new(
            Money::from_minor(3000, USD),
            Money::from_minor(2400, USD),
            Money::from_minor(599, USD),
        );

        let result = BranchAndBound::search(&catalog, &rules)?;
        let receipt = Receipt::from_search_result(&result, &rules)?;

        assert_eq!(receipt.lines().len(), 1);
        assert_eq!(
            receipt.lines().first().map(ReceiptLine::total),
            Some(Money::from_minor(2778, USD))
        );
        assert_eq!(receipt.subtotal(), Money::from_minor(2778, USD));
        assert_eq!(receipt.surcharge(), None);
        assert_eq!(receipt.remaining()?, Money::from_minor(222, USD));

        Ok(())
    }

    #[test]
    fn budget_used_percent_is_zero_for_zero_budget() -> TestResult {
        let catalog = Catalog::new(GBP);
        let rules = RuleConfiguration::with_budget(Money::from_minor(0, GBP));

        let result = BranchAndBound::search(&catalog, &rules)?;
        let receipt = Receipt::from_search_result(&result, &rules)?;

        assert_eq!(receipt.budget_used_percent()?, Percentage::from(0.0));

        Ok(())
    }

    #[test]
    fn percent_points_converts_fractional_percentage_to_percent_points() -> TestResult {
        let points = percent_points_from_fractional_percentage(Percentage::from(0.25));

        assert_eq!(points, Decimal::from_i64(25).ok_or("decimal")?);

        Ok(())
    }

    #[test]
    fn write_to_renders_items_and_summary() -> TestResult {
        let catalog = catalog()?;
        let rules = RuleConfiguration::new(
            Money::from_minor(4000, USD),
            Money::from_minor(2500, USD),
            Money::from_minor(599, USD),
        );

        let result = BranchAndBound::search(&catalog, &rules)?;
        let receipt = Receipt::from_search_result(&result, &rules)?;

        let mut out = Vec::new();
        receipt.write_to(&mut out)?;

        let output = String::from_utf8(out)?;

        // The flag alone costs 33.93 and picks up the surcharge, 39.92 in total.
        assert!(output.contains("pirate flag"));
        assert!(!output.contains("hangers"));
        assert!(output.contains("Surcharge:"));
        assert!(output.contains("$5.99"));
        assert!(output.contains("$39.92"));
        assert!(output.contains("Remaining:"));

        Ok(())
    }

    #[test]
    fn write_report_to_lists_each_purchase() -> TestResult {
        let catalog = catalog()?;
        let rules = RuleConfiguration::new(
            Money::from_minor(3000, USD),
            Money::from_minor(2400, USD),
            Money::from_minor(599, USD),
        );

        let result = BranchAndBound::search(&catalog, &rules)?;
        let receipt = Receipt::from_search_result(&result, &rules)?;

        let mut out = Vec::new();
        receipt.write_report_to(&mut out)?;

        assert_eq!(
            String::from_utf8(out)?,
            "hangers = $27.78 ($24.99 + $2.79 tax)\nTotal: $27.78\n"
        );

        Ok(())
    }

    #[test]
    fn visible_width_ignores_ansi_escapes() {
        assert_eq!(visible_width("\x1b[1mTotal:\x1b[0m"), 6);
    }
}
