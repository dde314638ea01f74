//! Branch-and-Bound Search
//!
//! Depth-first traversal over inclusion decisions. From a node whose last
//! included purchase sits at catalog position `i`, the children include
//! positions `i + 1, i + 2, ...` in order, so every subset is visited at most
//! once and always in the same order. The first subset to reach a given
//! adjusted total keeps it: replacement needs a strictly greater total.

use smallvec::SmallVec;

use crate::{
    catalog::Catalog,
    evaluation::{EvaluationError, Totals},
    rules::RuleConfiguration,
    search::{
        Problem, SearchError, SearchLimits, SearchResult, Searcher,
        observer::{PruneReason, SearchObserver},
    },
};

/// Searcher that cuts branches which are over budget or cannot beat the best total
#[derive(Debug)]
pub struct BranchAndBound;

/// Searcher that visits every subset with no cuts
///
/// Returns the same result as [`BranchAndBound`]; useful as a reference.
#[derive(Debug)]
pub struct Exhaustive;

impl Searcher for BranchAndBound {
    fn search_with_observer<'c, O: SearchObserver>(
        catalog: &'c Catalog<'c>,
        rules: &RuleConfiguration<'c>,
        limits: SearchLimits,
        observer: &mut O,
    ) -> Result<SearchResult<'c>, SearchError> {
        traverse(catalog, rules, limits, observer, Cuts::ALL)
    }
}

impl Searcher for Exhaustive {
    fn search_with_observer<'c, O: SearchObserver>(
        catalog: &'c Catalog<'c>,
        rules: &RuleConfiguration<'c>,
        limits: SearchLimits,
        observer: &mut O,
    ) -> Result<SearchResult<'c>, SearchError> {
        traverse(catalog, rules, limits, observer, Cuts::NONE)
    }
}

#[derive(Debug, Clone, Copy)]
struct Cuts {
    over_budget: bool,
    upper_bound: bool,
}

impl Cuts {
    const ALL: Self = Self {
        over_budget: true,
        upper_bound: true,
    };

    const NONE: Self = Self {
        over_budget: false,
        upper_bound: false,
    };
}

fn traverse<'c, O: SearchObserver>(
    catalog: &'c Catalog<'c>,
    rules: &RuleConfiguration<'c>,
    limits: SearchLimits,
    observer: &mut O,
    cuts: Cuts,
) -> Result<SearchResult<'c>, SearchError> {
    let problem = Problem::new(catalog, rules)?;

    let mut traversal = Traversal {
        suffix: problem.suffix_totals()?,
        problem: &problem,
        observer,
        limits,
        cuts,
        decided: SmallVec::new(),
        best: SmallVec::new(),
        best_total: 0,
        candidates: 0,
        truncated: false,
    };

    // The empty combination costs nothing and is always within budget, so it
    // is the baseline every other candidate has to beat.
    traversal.visit(0, Totals::default())?;

    let Traversal {
        best, truncated, ..
    } = traversal;

    problem.finish(catalog, &best, !truncated)
}

struct Traversal<'p, 'r, O> {
    problem: &'p Problem<'r>,
    observer: &'p mut O,
    limits: SearchLimits,
    cuts: Cuts,

    /// `suffix[i]` holds the totals of every purchase from position `i` on
    suffix: SmallVec<[Totals; 16]>,

    /// Positions included on the current path
    decided: SmallVec<[usize; 16]>,

    /// Positions of the best combination so far
    best: SmallVec<[usize; 16]>,
    best_total: i64,

    candidates: u64,
    truncated: bool,
}

impl<O: SearchObserver> Traversal<'_, '_, O> {
    fn visit(&mut self, start: usize, totals: Totals) -> Result<(), SearchError> {
        let problem = self.problem;
        let evaluator = problem.evaluator();
        let budget = evaluator.budget_minor();

        self.candidates = self.candidates.saturating_add(1);
        self.observer
            .on_candidate(totals.count, evaluator.unadjusted_minor(&totals)?);

        let adjusted = evaluator.adjusted_minor(&totals)?;

        if adjusted <= budget && adjusted > self.best_total {
            self.best.clone_from(&self.decided);
            self.best_total = adjusted;
            self.observer.on_improvement(totals.count, adjusted);
        }

        for position in start..problem.len() {
            if self.truncated || self.limits.exceeded(self.candidates) {
                if !self.truncated {
                    self.truncated = true;
                    self.observer.on_truncated(self.candidates);
                }

                return Ok(());
            }

            let next = totals.combine(problem.contribution(position)?)?;

            // Adding a purchase never lowers the unadjusted total, so once it
            // is over budget no superset can come back under it.
            if self.cuts.over_budget && evaluator.unadjusted_minor(&next)? > budget {
                self.observer.on_pruned(next.count, PruneReason::OverBudget);
                continue;
            }

            if self.cuts.upper_bound && self.bound(position, &next)? <= self.best_total {
                self.observer.on_pruned(next.count, PruneReason::Bound);
                continue;
            }

            self.decided.push(position);
            self.visit(position + 1, next)?;
            self.decided.pop();
        }

        Ok(())
    }

    /// Highest adjusted total any subset below `next` could reach: everything
    /// after `position` included, plus the surcharge.
    fn bound(&self, position: usize, next: &Totals) -> Result<i64, SearchError> {
        let evaluator = self.problem.evaluator();
        let rest = self
            .suffix
            .get(position + 1)
            .ok_or(SearchError::InvariantViolation {
                message: "suffix totals shorter than catalog",
            })?;

        let ceiling = evaluator.unadjusted_minor(&next.combine(rest)?)?;
        let ceiling = ceiling
            .checked_add(evaluator.surcharge_minor())
            .ok_or(EvaluationError::Overflow)?;

        Ok(ceiling)
    }
}
