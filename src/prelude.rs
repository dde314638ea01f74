//! Giftpack prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{Catalog, CatalogError, PurchaseKey},
    combination::Combination,
    evaluation::{CostEvaluator, EvaluationError, eligible_subtotal},
    fixtures::{Fixture, FixtureError},
    purchases::PurchaseRecord,
    receipt::{Receipt, ReceiptError, ReceiptLine},
    rules::RuleConfiguration,
    search::{
        SearchError, SearchLimits, SearchResult, Searcher,
        branch_and_bound::{BranchAndBound, Exhaustive},
        knapsack::CentKnapsack,
        observer::{NoopObserver, PruneReason, SearchObserver, SearchStats},
        search,
    },
    validation::{ConfigurationWarning, ValidationError, validate, warnings},
};
