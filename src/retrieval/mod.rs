//! Keyword retrieval over the product catalog.
//!
//! Products are scored by the number of distinct words their name shares with
//! the query. There is no stemming or fuzzy matching: lower-casing and
//! whitespace splitting are the whole tokenizer.

use crate::catalog::{Catalog, ProductRecord};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Minimum score the single-best strategy accepts.
pub const MIN_BEST_SCORE: usize = 2;

/// A catalog record paired with its overlap score for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    /// The matched product.
    pub record: ProductRecord,
    /// Number of distinct shared words.
    pub score: usize,
}

/// How many products a query may retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalStrategy {
    /// Return the single best product, only if it shares more than one word.
    #[default]
    Best,
    /// Return up to `k` products sharing at least one word.
    TopK(usize),
}

/// Lower-case and split on whitespace into a set of words.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Score every record against `query` and return up to `top_k` matches.
///
/// Records with no shared words are dropped. Equal scores keep catalog order.
/// A `top_k` of zero is treated as one.
pub fn find(query: &str, catalog: &Catalog, top_k: usize) -> Vec<ScoredMatch> {
    let query_words = tokenize(query);
    if query_words.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<ScoredMatch> = catalog
        .iter()
        .filter_map(|record| {
            let score = tokenize(&record.name).intersection(&query_words).count();
            (score > 0).then(|| ScoredMatch {
                record: record.clone(),
                score,
            })
        })
        .collect();

    // sort_by is stable
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(top_k.max(1));

    debug!("Query matched {} products", matches.len());
    matches
}

/// Return the first highest-scoring record if it shares at least
/// [`MIN_BEST_SCORE`] words with the query.
pub fn find_best(query: &str, catalog: &Catalog) -> Option<ScoredMatch> {
    find(query, catalog, 1)
        .into_iter()
        .next()
        .filter(|m| m.score >= MIN_BEST_SCORE)
}

/// Source of product matches for a question.
pub trait Retriever: Send + Sync {
    /// Retrieve matches for `query`, best first.
    fn retrieve(&self, query: &str) -> Vec<ScoredMatch>;
}

/// Word-overlap retriever over an in-memory catalog.
pub struct KeywordRetriever {
    catalog: Arc<Catalog>,
    strategy: RetrievalStrategy,
}

impl KeywordRetriever {
    /// Create a retriever using the single-best strategy.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            strategy: RetrievalStrategy::Best,
        }
    }

    /// Set the retrieval strategy.
    pub fn with_strategy(mut self, strategy: RetrievalStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Retriever for KeywordRetriever {
    fn retrieve(&self, query: &str) -> Vec<ScoredMatch> {
        match self.strategy {
            RetrievalStrategy::Best => find_best(query, &self.catalog).into_iter().collect(),
            RetrievalStrategy::TopK(k) => find(query, &self.catalog, k),
        }
    }
}
