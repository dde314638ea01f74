//! Gift card packing
//!
//! Loads a fixture, searches for the purchases that spend the most of the
//! budget, and prints a receipt.
//!
//! Use `-f` to load a fixture file
//! Use `-s` to choose the search strategy

use std::{
    io::{self, Write},
    time::Instant,
};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing::{debug, warn};

use giftpack::{
    fixtures::Fixture,
    receipt::Receipt,
    search::observer::SearchStats,
    utils::{PackArgs, init_logging},
    validation::{log_warnings, validate},
};

/// Gift card packing
pub fn main() -> Result<()> {
    let args = PackArgs::parse();

    init_logging(&args.log_level)?;

    let fixture = Fixture::from_path(&args.fixture)?;
    let catalog = fixture.catalog();
    let rules = fixture.rules();

    validate(catalog, rules)?;
    log_warnings(catalog, rules);

    let mut stats = SearchStats::default();
    let start = Instant::now();

    let result = args
        .strategy
        .search_with_observer(catalog, rules, args.limits(), &mut stats)?;

    let elapsed = start.elapsed();

    debug!(
        strategy = ?args.strategy,
        candidates = stats.candidates,
        pruned_over_budget = stats.pruned_over_budget,
        pruned_by_bound = stats.pruned_by_bound,
        improvements = stats.improvements,
        "search finished"
    );

    if !result.exhaustive {
        warn!(
            candidates = stats.candidates,
            "Search stopped at a limit; the result may not be the best possible"
        );
    }

    let receipt = Receipt::from_search_result(&result, rules)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.plain {
        receipt.write_report_to(&mut handle)?;
    } else {
        receipt.write_to(&mut handle)?;
    }

    writeln!(
        handle,
        " {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}
