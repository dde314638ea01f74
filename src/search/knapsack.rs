//! Cent Knapsack Search
//!
//! Dynamic program over cent-precision cost states, for catalogs too large to
//! enumerate. Each state is keyed by the minor-unit sums that determine the
//! unadjusted total: `(Σ price + tax, Σ shipping)`, or a single folded sum when
//! there is no effective tax to scale by.
//!
//! The surcharge only depends on whether the eligible subtotal reaches the
//! free-shipping minimum. For every key the table therefore keeps two
//! witnesses: the subset with the lowest eligible subtotal and the one with
//! the highest (both capped at the minimum). Together they decide both
//! surcharge outcomes exactly, so the best adjusted total matches the
//! branch-and-bound search. When several subsets tie, the chosen one may
//! differ.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    catalog::Catalog,
    evaluation::{CostEvaluator, EvaluationError, Totals},
    rules::RuleConfiguration,
    search::{
        Problem, SearchError, SearchLimits, SearchResult, Searcher,
        observer::{PruneReason, SearchObserver},
    },
};

type StateKey = (i64, i64);

/// Searcher using a cent-precision dynamic program
#[derive(Debug)]
pub struct CentKnapsack;

impl Searcher for CentKnapsack {
    fn search_with_observer<'c, O: SearchObserver>(
        catalog: &'c Catalog<'c>,
        rules: &RuleConfiguration<'c>,
        limits: SearchLimits,
        observer: &mut O,
    ) -> Result<SearchResult<'c>, SearchError> {
        let problem = Problem::new(catalog, rules)?;
        let evaluator = problem.evaluator();
        let budget = evaluator.budget_minor();

        let mut table = Table::new(evaluator);
        let mut candidates: u64 = 0;
        let mut truncated = false;

        'purchases: for (position, contribution) in problem.contributions().iter().enumerate() {
            let purchase_key = table.key_of(contribution)?;

            // Only states that existed before this purchase may be extended by
            // it, otherwise a purchase could be taken twice.
            let snapshot = table.snapshot();

            let starts = std::iter::once(((0, 0), None)).chain(
                snapshot
                    .iter()
                    .map(|&(key, witnesses)| (key, Some(witnesses))),
            );

            for (base_key, witnesses) in starts {
                if limits.exceeded(candidates) {
                    truncated = true;
                    observer.on_truncated(candidates);
                    break 'purchases;
                }

                let key = add_keys(base_key, purchase_key)?;

                candidates = candidates.saturating_add(1);

                let step = Step {
                    key,
                    position,
                    eligible: contribution.eligible,
                    witnesses,
                };

                let size = table.size_after(witnesses.map(|w| w.low))?;
                let unadjusted = table.unadjusted(key)?;

                observer.on_candidate(size, unadjusted);

                // Adding purchases never lowers the unadjusted total.
                if unadjusted > budget {
                    observer.on_pruned(size, PruneReason::OverBudget);
                    continue;
                }

                table.offer(&step)?;
            }
        }

        let best = table.best(budget, observer)?;
        let positions = table.positions(best)?;

        problem.finish(catalog, &positions, !truncated)
    }
}

/// A subset: the purchase at `position` added to the subset at `parent`.
#[derive(Debug, Clone, Copy)]
struct Node {
    position: usize,
    parent: Option<usize>,

    /// Eligible subtotal, capped at the free-shipping minimum
    eligible: i64,

    size: usize,
}

/// Lowest- and highest-eligible subsets reaching one state key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Witnesses {
    low: usize,
    high: usize,
}

#[derive(Debug, Clone, Copy)]
struct Step {
    key: StateKey,
    position: usize,
    eligible: i64,

    /// Witnesses of the state being extended; `None` extends the empty subset
    witnesses: Option<Witnesses>,
}

#[derive(Debug)]
struct Table<'p, 'r> {
    evaluator: &'p CostEvaluator<'r>,
    fold_shipping: bool,
    cap: i64,
    nodes: Vec<Node>,
    states: FxHashMap<StateKey, Witnesses>,
}

impl<'p, 'r> Table<'p, 'r> {
    fn new(evaluator: &'p CostEvaluator<'r>) -> Self {
        Self {
            evaluator,
            fold_shipping: !evaluator.rules().has_effective_tax(),
            cap: evaluator.free_shipping_minimum_minor().max(0),
            nodes: Vec::new(),
            states: FxHashMap::default(),
        }
    }

    fn key_of(&self, totals: &Totals) -> Result<StateKey, EvaluationError> {
        if self.fold_shipping {
            let folded = totals
                .taxable
                .checked_add(totals.shipping)
                .ok_or(EvaluationError::Overflow)?;

            Ok((folded, 0))
        } else {
            Ok((totals.taxable, totals.shipping))
        }
    }

    /// Unadjusted total of a state. With folded keys there is no effective
    /// tax, so scaling is the identity and shipping is already in `key.0`.
    fn unadjusted(&self, key: StateKey) -> Result<i64, EvaluationError> {
        self.evaluator
            .scale_minor(key.0)?
            .checked_add(key.1)
            .ok_or(EvaluationError::Overflow)
    }

    fn node(&self, index: usize) -> Result<&Node, SearchError> {
        self.nodes
            .get(index)
            .ok_or(SearchError::InvariantViolation {
                message: "knapsack node index out of range",
            })
    }

    fn size_after(&self, parent: Option<usize>) -> Result<usize, SearchError> {
        Ok(match parent {
            Some(index) => self.node(index)?.size.saturating_add(1),
            None => 1,
        })
    }

    fn eligible_after(&self, parent: Option<usize>, eligible: i64) -> Result<i64, SearchError> {
        let base = match parent {
            Some(index) => self.node(index)?.eligible,
            None => 0,
        };

        let sum = base
            .checked_add(eligible)
            .ok_or(EvaluationError::Overflow)?;

        Ok(sum.min(self.cap))
    }

    fn push(&mut self, position: usize, parent: Option<usize>, eligible: i64) -> Result<usize, SearchError> {
        let size = self.size_after(parent)?;

        self.nodes.push(Node {
            position,
            parent,
            eligible,
            size,
        });

        Ok(self.nodes.len() - 1)
    }

    /// States in key order, so extension order does not depend on hashing.
    fn snapshot(&self) -> Vec<(StateKey, Witnesses)> {
        let mut snapshot: Vec<(StateKey, Witnesses)> = self
            .states
            .iter()
            .map(|(&key, &witnesses)| (key, witnesses))
            .collect();

        snapshot.sort_unstable_by_key(|&(key, _)| key);

        snapshot
    }

    /// Record the subsets produced by `step`, keeping them only if they lower
    /// the lowest or raise the highest eligible subtotal seen for the key.
    fn offer(&mut self, step: &Step) -> Result<(), SearchError> {
        let low_parent = step.witnesses.map(|w| w.low);
        let high_parent = step.witnesses.map(|w| w.high);

        let low_eligible = self.eligible_after(low_parent, step.eligible)?;
        let high_eligible = self.eligible_after(high_parent, step.eligible)?;

        let witnesses = match self.states.get(&step.key).copied() {
            None => {
                let low = self.push(step.position, low_parent, low_eligible)?;
                let high = if high_parent == low_parent {
                    low
                } else {
                    self.push(step.position, high_parent, high_eligible)?
                };

                Witnesses { low, high }
            }
            Some(existing) => {
                let mut updated = existing;

                if low_eligible < self.node(existing.low)?.eligible {
                    updated.low = self.push(step.position, low_parent, low_eligible)?;
                }

                if high_eligible > self.node(existing.high)?.eligible {
                    updated.high = self.push(step.position, high_parent, high_eligible)?;
                }

                updated
            }
        };

        self.states.insert(step.key, witnesses);

        Ok(())
    }

    /// Node of the best feasible subset, or `None` if the empty subset is best.
    fn best<O: SearchObserver>(
        &self,
        budget: i64,
        observer: &mut O,
    ) -> Result<Option<usize>, SearchError> {
        let surcharge = self.evaluator.surcharge_minor();

        let mut best = None;
        let mut best_total = 0;

        for (key, witnesses) in self.snapshot() {
            let unadjusted = self.unadjusted(key)?;

            for index in [witnesses.low, witnesses.high] {
                let node = self.node(index)?;

                let adjusted = if node.eligible < self.cap {
                    unadjusted
                        .checked_add(surcharge)
                        .ok_or(EvaluationError::Overflow)?
                } else {
                    unadjusted
                };

                if adjusted <= budget && adjusted > best_total {
                    best = Some(index);
                    best_total = adjusted;
                    observer.on_improvement(node.size, adjusted);
                }
            }
        }

        Ok(best)
    }

    /// Catalog positions of the subset ending at `index`, ascending.
    fn positions(&self, index: Option<usize>) -> Result<SmallVec<[usize; 16]>, SearchError> {
        let mut positions = SmallVec::new();
        let mut cursor = index;

        while let Some(current) = cursor {
            let node = self.node(current)?;

            positions.push(node.position);
            cursor = node.parent;
        }

        positions.reverse();

        Ok(positions)
    }
}

fn add_keys(a: StateKey, b: StateKey) -> Result<StateKey, EvaluationError> {
    Ok((
        a.0.checked_add(b.0).ok_or(EvaluationError::Overflow)?,
        a.1.checked_add(b.1).ok_or(EvaluationError::Overflow)?,
    ))
}
