//! Search command implementation.

use crate::catalog::Catalog;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::retrieval::{find, MIN_BEST_SCORE};
use anyhow::Result;

/// Run the search command.
pub fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    preflight::check(Operation::Search, &settings)?;

    let catalog = Catalog::load(&settings.catalog_path())?;
    let matches = find(query, &catalog, limit);

    if matches.is_empty() {
        Output::warning("No products share a word with your query.");
        return Ok(());
    }

    Output::success(&format!("Found {} products", matches.len()));
    for m in &matches {
        Output::product_match(m);
    }

    if matches[0].score < MIN_BEST_SCORE {
        println!();
        Output::info(&format!(
            "The single-best strategy needs a score of at least {}; it would find nothing here.",
            MIN_BEST_SCORE
        ));
    }

    Ok(())
}
