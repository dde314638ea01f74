//! Search Observer

/// Why a branch was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    /// The unadjusted total already exceeds the budget.
    OverBudget,

    /// Nothing below this node can beat the best total found so far.
    Bound,
}

/// Observer trait for following a search as it runs.
///
/// Every callback has an empty default body, so an observer only implements
/// what it needs. When no observer is given, searchers use [`NoopObserver`]
/// and the calls are optimized away via monomorphization.
pub trait SearchObserver {
    /// Called when a candidate combination is examined.
    ///
    /// # Parameters
    ///
    /// - `size`: Number of purchases in the candidate
    /// - `unadjusted_minor`: Unadjusted total in minor units
    fn on_candidate(&mut self, _size: usize, _unadjusted_minor: i64) {}

    /// Called when a branch is abandoned without being explored.
    fn on_pruned(&mut self, _size: usize, _reason: PruneReason) {}

    /// Called when a candidate replaces the best combination.
    ///
    /// # Parameters
    ///
    /// - `size`: Number of purchases in the new best combination
    /// - `adjusted_minor`: Its adjusted total in minor units
    fn on_improvement(&mut self, _size: usize, _adjusted_minor: i64) {}

    /// Called once if the search stops early because a limit was reached.
    fn on_truncated(&mut self, _candidates: u64) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// Observer that counts events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Candidates examined
    pub candidates: u64,

    /// Branches cut because they went over budget
    pub pruned_over_budget: u64,

    /// Branches cut by the upper bound
    pub pruned_by_bound: u64,

    /// Times the best combination was replaced
    pub improvements: u64,

    /// Whether a limit stopped the search early
    pub truncated: bool,
}

impl SearchObserver for SearchStats {
    fn on_candidate(&mut self, _size: usize, _unadjusted_minor: i64) {
        self.candidates = self.candidates.saturating_add(1);
    }

    fn on_pruned(&mut self, _size: usize, reason: PruneReason) {
        match reason {
            PruneReason::OverBudget => {
                self.pruned_over_budget = self.pruned_over_budget.saturating_add(1);
            }
            PruneReason::Bound => {
                self.pruned_by_bound = self.pruned_by_bound.saturating_add(1);
            }
        }
    }

    fn on_improvement(&mut self, _size: usize, _adjusted_minor: i64) {
        self.improvements = self.improvements.saturating_add(1);
    }

    fn on_truncated(&mut self, _candidates: u64) {
        self.truncated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_events() {
        let mut stats = SearchStats::default();

        stats.on_candidate(0, 0);
        stats.on_candidate(1, 100);
        stats.on_pruned(2, PruneReason::OverBudget);
        stats.on_pruned(2, PruneReason::Bound);
        stats.on_pruned(3, PruneReason::Bound);
        stats.on_improvement(1, 100);
        stats.on_truncated(2);

        assert_eq!(
            stats,
            SearchStats {
                candidates: 2,
                pruned_over_budget: 1,
                pruned_by_bound: 2,
                improvements: 1,
                truncated: true,
            }
        );
    }
}
