//! Combination Search

use std::time::{Duration, Instant};

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::{Catalog, PurchaseKey},
    combination::Combination,
    evaluation::{CostEvaluator, EvaluationError, Totals},
    rules::RuleConfiguration,
    search::observer::{NoopObserver, SearchObserver, SearchStats},
    validation::{ValidationError, log_warnings, validate},
};

pub mod branch_and_bound;
pub mod knapsack;
pub mod observer;

/// How often the deadline is checked, in candidates
const DEADLINE_CHECK_INTERVAL: u64 = 256;

/// Search Errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// Wrapped validation error; raised before any candidate is examined.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wrapped cost evaluation error.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Internal search invariant was violated (this is a bug).
    #[error("search invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// Optional limits that stop a search early.
///
/// When a limit is hit the searcher returns the best combination found so far
/// and marks the result as not exhaustive.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    /// Maximum number of candidates to examine
    pub max_candidates: Option<u64>,

    /// Wall-clock deadline
    pub deadline: Option<Instant>,
}

impl SearchLimits {
    /// No limits
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_candidates: None,
            deadline: None,
        }
    }

    /// Limit the number of candidates examined
    #[must_use]
    pub const fn with_max_candidates(mut self, max_candidates: u64) -> Self {
        self.max_candidates = Some(max_candidates);
        self
    }

    /// Stop once the deadline passes
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop once `timeout` has elapsed from now
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Check if this has any limits
    #[must_use]
    pub const fn has_limits(&self) -> bool {
        self.max_candidates.is_some() || self.deadline.is_some()
    }

    /// Check if a search that has examined `candidates` must stop.
    pub(crate) fn exceeded(&self, candidates: u64) -> bool {
        if self
            .max_candidates
            .is_some_and(|max_candidates| candidates >= max_candidates)
        {
            return true;
        }

        self.deadline.is_some_and(|deadline| {
            candidates % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline
        })
    }
}

/// The best combination found by a search
#[derive(Debug, Clone)]
pub struct SearchResult<'c> {
    /// Chosen purchases, in catalog order
    pub combination: Combination<'c>,

    /// Taxed prices plus per-item shipping
    pub unadjusted_total: Money<'c, Currency>,

    /// Shipping surcharge, if the combination falls short of free shipping
    pub surcharge: Option<Money<'c, Currency>>,

    /// Unadjusted total plus surcharge; never above the budget
    pub total: Money<'c, Currency>,

    /// `false` if a limit stopped the search before every candidate was covered
    pub exhaustive: bool,
}

/// Trait for searching a catalog for the best combination
pub trait Searcher {
    /// Search the catalog, reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if the input fails validation or a cost overflows.
    fn search_with_observer<'c, O: SearchObserver>(
        catalog: &'c Catalog<'c>,
        rules: &RuleConfiguration<'c>,
        limits: SearchLimits,
        observer: &mut O,
    ) -> Result<SearchResult<'c>, SearchError>;

    /// Search the catalog within the given limits.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if the input fails validation or a cost overflows.
    fn search_with_limits<'c>(
        catalog: &'c Catalog<'c>,
        rules: &RuleConfiguration<'c>,
        limits: SearchLimits,
    ) -> Result<SearchResult<'c>, SearchError> {
        Self::search_with_observer(catalog, rules, limits, &mut NoopObserver)
    }

    /// Search the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if the input fails validation or a cost overflows.
    fn search<'c>(
        catalog: &'c Catalog<'c>,
        rules: &RuleConfiguration<'c>,
    ) -> Result<SearchResult<'c>, SearchError> {
        Self::search_with_limits(catalog, rules, SearchLimits::unlimited())
    }
}

/// Run the default branch-and-bound search, then log configuration warnings.
///
/// # Errors
///
/// Returns a [`SearchError`] if the input fails validation or a cost overflows.
pub fn search<'c>(
    catalog: &'c Catalog<'c>,
    rules: &RuleConfiguration<'c>,
) -> Result<SearchResult<'c>, SearchError> {
    let mut stats = SearchStats::default();
    let result = branch_and_bound::BranchAndBound::search_with_observer(
        catalog,
        rules,
        SearchLimits::unlimited(),
        &mut stats,
    )?;

    log_warnings(catalog, rules);

    debug!(
        candidates = stats.candidates,
        pruned_over_budget = stats.pruned_over_budget,
        pruned_by_bound = stats.pruned_by_bound,
        total = %result.total,
        "search finished"
    );

    Ok(result)
}

/// A validated catalog flattened into minor-unit totals, in catalog order.
#[derive(Debug)]
pub(crate) struct Problem<'r> {
    evaluator: CostEvaluator<'r>,
    keys: SmallVec<[PurchaseKey; 16]>,
    contributions: SmallVec<[Totals; 16]>,
}

impl<'r> Problem<'r> {
    pub(crate) fn new(
        catalog: &Catalog<'_>,
        rules: &'r RuleConfiguration<'r>,
    ) -> Result<Self, SearchError> {
        validate(catalog, rules)?;

        let mut keys = SmallVec::with_capacity(catalog.len());
        let mut contributions = SmallVec::with_capacity(catalog.len());

        for (key, record) in catalog.iter() {
            keys.push(key);
            contributions.push(Totals::of(record)?);
        }

        Ok(Self {
            evaluator: CostEvaluator::new(rules),
            keys,
            contributions,
        })
    }

    pub(crate) fn evaluator(&self) -> &CostEvaluator<'r> {
        &self.evaluator
    }

    pub(crate) fn contributions(&self) -> &[Totals] {
        &self.contributions
    }

    pub(crate) fn len(&self) -> usize {
        self.contributions.len()
    }

    pub(crate) fn contribution(&self, position: usize) -> Result<&Totals, SearchError> {
        self.contributions
            .get(position)
            .ok_or(SearchError::InvariantViolation {
                message: "catalog position out of range",
            })
    }

    /// Totals of every purchase from `position` to the end, for each position.
    ///
    /// The returned list has one more entry than the catalog; the last is zero.
    pub(crate) fn suffix_totals(&self) -> Result<SmallVec<[Totals; 16]>, SearchError> {
        let mut suffix: SmallVec<[Totals; 16]> = SmallVec::with_capacity(self.len() + 1);
        suffix.push(Totals::default());

        for contribution in self.contributions.iter().rev() {
            let last = suffix.last().copied().unwrap_or_default();
            suffix.push(last.combine(contribution)?);
        }

        suffix.reverse();

        Ok(suffix)
    }

    /// Build the result for the chosen catalog positions.
    pub(crate) fn finish<'c>(
        &self,
        catalog: &'c Catalog<'c>,
        positions: &[usize],
        exhaustive: bool,
    ) -> Result<SearchResult<'c>, SearchError> {
        let mut keys: SmallVec<[PurchaseKey; 10]> = SmallVec::with_capacity(positions.len());
        let mut totals = Totals::default();

        for &position in positions {
            let key = self
                .keys
                .get(position)
                .ok_or(SearchError::InvariantViolation {
                    message: "catalog position out of range",
                })?;

            keys.push(*key);
            totals = totals.combine(self.contribution(position)?)?;
        }

        let currency = catalog.currency();
        let unadjusted = self.evaluator.unadjusted_minor(&totals)?;
        let total = self.evaluator.adjusted_minor(&totals)?;

        if total > self.evaluator.budget_minor() {
            return Err(SearchError::InvariantViolation {
                message: "chosen combination exceeds the budget",
            });
        }

        Ok(SearchResult {
            combination: Combination::from_keys(catalog, keys),
            unadjusted_total: Money::from_minor(unadjusted, currency),
            surcharge: self
                .evaluator
                .surcharge_applies_to(&totals)
                .then(|| Money::from_minor(self.evaluator.surcharge_minor(), currency)),
            total: Money::from_minor(total, currency),
            exhaustive,
        })
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::purchases::PurchaseRecord;

    use super::*;

    #[test]
    fn limits_unlimited_never_exceeded() {
        let limits = SearchLimits::unlimited();

        assert!(!limits.has_limits());
        assert!(!limits.exceeded(u64::MAX));
    }

    #[test]
    fn limits_max_candidates() {
        let limits = SearchLimits::unlimited().with_max_candidates(10);

        assert!(limits.has_limits());
        assert!(!limits.exceeded(9));
        assert!(limits.exceeded(10));
    }

    #[test]
    fn limits_past_deadline_exceeded_on_check_interval() {
        let limits = SearchLimits::unlimited().with_deadline(Instant::now());

        assert!(limits.exceeded(0));
        assert!(limits.exceeded(DEADLINE_CHECK_INTERVAL));
        assert!(!limits.exceeded(1));
    }

    #[test]
    fn search_empty_catalog_returns_empty_combination() -> TestResult {
        let catalog = Catalog::new(USD);
        let rules = RuleConfiguration::new(
            Money::from_minor(7500, USD),
            Money::from_minor(2500, USD),
            Money::from_minor(599, USD),
        );

        let result = search(&catalog, &rules)?;

        assert!(result.combination.is_empty());
        assert_eq!(result.total, Money::from_minor(0, USD));
        assert_eq!(result.surcharge, None);
        assert!(result.exhaustive);

        Ok(())
    }

    #[test]
    fn search_rejects_invalid_input() -> TestResult {
        let catalog = Catalog::with_records(
            [PurchaseRecord::new("refund", Money::from_minor(-1, USD))],
            USD,
        )?;
        let rules = RuleConfiguration::with_budget(Money::from_minor(100, USD));

        assert!(matches!(
            search(&catalog, &rules),
            Err(SearchError::Validation(ValidationError::NegativeAmount { .. }))
        ));

        Ok(())
    }

    #[test]
    fn suffix_totals_accumulate_from_the_end() -> TestResult {
        let catalog = Catalog::with_records(
            [
                PurchaseRecord::new("a", Money::from_minor(100, USD)),
                PurchaseRecord::new("b", Money::from_minor(200, USD)),
            ],
            USD,
        )?;
        let rules = RuleConfiguration::with_budget(Money::from_minor(1000, USD));
        let problem = Problem::new(&catalog, &rules)?;

        let suffix = problem.suffix_totals()?;
        let taxable: Vec<i64> = suffix.iter().map(|totals| totals.taxable).collect();

        assert_eq!(taxable, vec![300, 200, 0]);

        Ok(())
    }
}
