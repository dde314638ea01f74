//! Utils
//!
//! Command line arguments and logging setup for the `giftpack` binary.

use std::{io, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use tracing_subscriber::{
    EnvFilter,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::{
    catalog::Catalog,
    rules::RuleConfiguration,
    search::{
        SearchError, SearchLimits, SearchResult, Searcher,
        branch_and_bound::{BranchAndBound, Exhaustive},
        knapsack::CentKnapsack,
        observer::SearchObserver,
    },
};

/// Which searcher to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Depth-first search with budget and bound pruning
    #[default]
    BranchAndBound,

    /// Depth-first search over every feasible subset
    Exhaustive,

    /// Dynamic program over cent-precision totals
    Knapsack,
}

impl Strategy {
    /// Run the chosen searcher.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if the input fails validation or a cost overflows.
    pub fn search_with_observer<'c, O: SearchObserver>(
        self,
        catalog: &'c Catalog<'c>,
        rules: &RuleConfiguration<'c>,
        limits: SearchLimits,
        observer: &mut O,
    ) -> Result<SearchResult<'c>, SearchError> {
        match self {
            Strategy::BranchAndBound => {
                BranchAndBound::search_with_observer(catalog, rules, limits, observer)
            }
            Strategy::Exhaustive => Exhaustive::search_with_observer(catalog, rules, limits, observer),
            Strategy::Knapsack => CentKnapsack::search_with_observer(catalog, rules, limits, observer),
        }
    }
}

/// Arguments for the `giftpack` binary
#[derive(Debug, Parser)]
#[command(name = "giftpack", about = "Spend as much of a gift card as possible")]
pub struct PackArgs {
    /// Fixture file with the budget, shipping rules and purchases
    #[clap(short, long, default_value = "fixtures/gift-card.yml")]
    pub fixture: PathBuf,

    /// Search strategy
    #[clap(short, long, value_enum, default_value_t = Strategy::BranchAndBound)]
    pub strategy: Strategy,

    /// Stop after examining this many candidates
    #[clap(long)]
    pub max_nodes: Option<u64>,

    /// Stop after this many milliseconds
    #[clap(long)]
    pub timeout_ms: Option<u64>,

    /// Default log filter, overridden by `RUST_LOG`
    #[clap(long, default_value = "info")]
    pub log_level: String,

    /// Print one line per purchase instead of a table
    #[clap(long)]
    pub plain: bool,
}

impl PackArgs {
    /// Search limits from `--max-nodes` and `--timeout-ms`
    pub fn limits(&self) -> SearchLimits {
        let mut limits = SearchLimits::unlimited();

        if let Some(max_nodes) = self.max_nodes {
            limits = limits.with_max_candidates(max_nodes);
        }

        if let Some(timeout_ms) = self.timeout_ms {
            limits = limits.with_timeout(Duration::from_millis(timeout_ms));
        }

        limits
    }
}

/// Install a compact stderr subscriber filtered by `RUST_LOG`, or by `level` when unset.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .with(filter)
        .try_init()
}
