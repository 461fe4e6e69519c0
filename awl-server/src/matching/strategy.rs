//! Search strategies
//!
//! A strategy derives a search term from the raw title, optionally constrains
//! the search by release year, and carries the base weight its candidates
//! start scoring from. Strategies run in table order.

use super::normalizer::{clean_title, main_title};

/// One (search term, year constraint, weight) combination
#[derive(Debug, Clone, Copy)]
pub struct SearchStrategy {
    /// Short label for logs and match reports
    pub name: &'static str,
    /// Derives the search term from the raw title
    pub derive_term: fn(&str) -> String,
    /// Constrain the search to the local release year
    pub use_year: bool,
    /// Base confidence for candidates found by this strategy
    pub weight: f64,
}

impl SearchStrategy {
    pub fn term(&self, raw_title: &str) -> String {
        (self.derive_term)(raw_title)
    }
}

fn raw_term(title: &str) -> String {
    title.to_string()
}

/// Default strategy table
pub const DEFAULT_STRATEGIES: [SearchStrategy; 6] = [
    SearchStrategy {
        name: "raw+year",
        derive_term: raw_term,
        use_year: true,
        weight: 1.0,
    },
    SearchStrategy {
        name: "raw",
        derive_term: raw_term,
        use_year: false,
        weight: 0.8,
    },
    SearchStrategy {
        name: "clean+year",
        derive_term: clean_title,
        use_year: true,
        weight: 0.9,
    },
    SearchStrategy {
        name: "clean",
        derive_term: clean_title,
        use_year: false,
        weight: 0.7,
    },
    SearchStrategy {
        name: "main+year",
        derive_term: main_title,
        use_year: true,
        weight: 0.6,
    },
    SearchStrategy {
        name: "main",
        derive_term: main_title,
        use_year: false,
        weight: 0.5,
    },
];
