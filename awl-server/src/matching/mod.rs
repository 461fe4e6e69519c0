//! Show matching engine
//!
//! Reconciles titles from the media server against the anime catalog:
//! - [`normalizer`]: canonical title forms
//! - [`strategy`]: the ordered search strategy table
//! - [`scorer`]: the confidence model
//! - [`matcher`]: multi-strategy search for one title
//! - [`bulk`]: paced reconciliation of many shows with early abort

pub mod bulk;
pub mod matcher;
pub mod normalizer;
pub mod scorer;
pub mod strategy;

pub use bulk::{
    effective_bulk_limit, AttemptOutcome, BulkPacing, BulkReport, ShowAttempt,
    DEFAULT_BULK_LIMIT, MAX_BULK_LIMIT,
};
pub use matcher::{MatchOutcome, RateLimitPolicy, ScoredMatch, ShowMatcher};
pub use normalizer::{clean_title, main_title};
pub use scorer::{score_candidate, MIN_CONFIDENCE};
pub use strategy::{SearchStrategy, DEFAULT_STRATEGIES};

use thiserror::Error;

/// Input rejected before any catalog request is made
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("Title is required")]
    InvalidTitle,
}
