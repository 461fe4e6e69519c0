//! Multi-strategy show matcher
//!
//! For one local title, every strategy in the table issues a catalog search
//! (top results by popularity, adult content excluded). The most popular
//! result of each search is scored, and the best-scoring candidate wins if
//! it reaches the minimum confidence.
//!
//! Strategies run strictly one after another: each search goes through the
//! shared request pacer, and parallel searches would break its spacing.

use super::bulk::BulkPacing;
use super::scorer::{score_candidate, MIN_CONFIDENCE};
use super::strategy::{SearchStrategy, DEFAULT_STRATEGIES};
use super::MatchError;
use crate::models::CatalogEntry;
use crate::services::{CatalogQuery, CatalogSearch};
use serde::Serialize;
use std::sync::Arc;

/// Results requested per strategy search; only the first is scored
pub const RESULTS_PER_SEARCH: u32 = 10;

/// A catalog candidate with its confidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub entry: CatalogEntry,
    pub confidence: f64,
    /// Strategy that produced the candidate
    pub strategy: &'static str,
}

/// Result of matching one title
///
/// `best` is `None` when no candidate reached the minimum confidence, which
/// is a normal outcome rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub best: Option<ScoredMatch>,
    /// Searches actually issued
    pub searches_attempted: usize,
    /// Searches that failed and contributed no candidate
    pub searches_failed: usize,
    /// At least one search was refused by the catalog's rate limit
    pub rate_limited: bool,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        self.best.is_some()
    }

    /// Every issued search failed
    pub fn all_searches_failed(&self) -> bool {
        self.searches_attempted > 0 && self.searches_failed == self.searches_attempted
    }
}

/// What a rate-limited search does to the remaining strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitPolicy {
    /// Record the refusal and try the next strategy
    #[default]
    SkipStrategy,
    /// Stop issuing searches for this title
    Abort,
}

/// Matches local show titles against the catalog
pub struct ShowMatcher {
    catalog: Arc<dyn CatalogSearch>,
    strategies: Vec<SearchStrategy>,
    min_confidence: f64,
    pub(crate) bulk_pacing: BulkPacing,
}

impl ShowMatcher {
    /// Matcher with the default strategy table and thresholds
    ///
    /// `catalog` should already be wrapped in the shared rate limiter.
    pub fn new(catalog: Arc<dyn CatalogSearch>) -> Self {
        Self {
            catalog,
            strategies: DEFAULT_STRATEGIES.to_vec(),
            min_confidence: MIN_CONFIDENCE,
            bulk_pacing: BulkPacing::default(),
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<SearchStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_bulk_pacing(mut self, pacing: BulkPacing) -> Self {
        self.bulk_pacing = pacing;
        self
    }

    pub fn strategies(&self) -> &[SearchStrategy] {
        &self.strategies
    }

    /// Find the best catalog entry for a local title
    ///
    /// Search failures are logged and skipped; they never abort the
    /// remaining strategies. Year-constrained strategies are skipped when the
    /// year is unknown.
    ///
    /// # Errors
    /// [`MatchError::InvalidTitle`] for a blank title, before any request.
    pub async fn find_best_match(
        &self,
        raw_title: &str,
        year: Option<i32>,
    ) -> Result<MatchOutcome, MatchError> {
        self.find_best_match_with(raw_title, year, RateLimitPolicy::SkipStrategy)
            .await
    }

    /// [`find_best_match`](Self::find_best_match) with an explicit rate-limit policy
    ///
    /// Under [`RateLimitPolicy::Abort`] the first refused search ends the
    /// strategy loop; candidates found before it are still scored.
    pub async fn find_best_match_with(
        &self,
        raw_title: &str,
        year: Option<i32>,
        policy: RateLimitPolicy,
    ) -> Result<MatchOutcome, MatchError> {
        if raw_title.trim().is_empty() {
            return Err(MatchError::InvalidTitle);
        }
        let year = year.filter(|y| *y > 0);

        let mut outcome = MatchOutcome::default();

        for strategy in &self.strategies {
            if strategy.use_year && year.is_none() {
                tracing::debug!(strategy = strategy.name, "Skipping year strategy: year unknown");
                continue;
            }

            let term = strategy.term(raw_title);
            if term.trim().is_empty() {
                tracing::debug!(strategy = strategy.name, "Skipping strategy: empty search term");
                continue;
            }

            let query = CatalogQuery::title(term.as_str())
                .with_year(if strategy.use_year { year } else { None })
                .with_page_size(RESULTS_PER_SEARCH);

            outcome.searches_attempted += 1;

            let candidate = match self.catalog.search(&query).await {
                Ok(results) => results.into_iter().next(),
                Err(e) => {
                    outcome.searches_failed += 1;
                    if e.is_rate_limited() {
                        outcome.rate_limited = true;
                        if policy == RateLimitPolicy::Abort {
                            tracing::warn!(
                                title = %raw_title,
                                strategy = strategy.name,
                                "Catalog rate limit hit, skipping remaining strategies"
                            );
                            break;
                        }
                    }
                    tracing::warn!(
                        title = %raw_title,
                        strategy = strategy.name,
                        error = %e,
                        "Catalog search failed, trying next strategy"
                    );
                    continue;
                }
            };

            let Some(candidate) = candidate else {
                tracing::debug!(strategy = strategy.name, term = %term, "No catalog results");
                continue;
            };

            let confidence = score_candidate(raw_title, year, &candidate, strategy.weight);

            tracing::debug!(
                strategy = strategy.name,
                term = %term,
                anilist_id = candidate.anilist_id,
                confidence,
                "Scored catalog candidate"
            );

            let better = outcome
                .best
                .as_ref()
                .map_or(true, |best| confidence > best.confidence);
            if better {
                outcome.best = Some(ScoredMatch {
                    entry: candidate,
                    confidence,
                    strategy: strategy.name,
                });
            }
        }

        let below_threshold = outcome
            .best
            .as_ref()
            .is_some_and(|best| best.confidence < self.min_confidence);
        if below_threshold {
            if let Some(rejected) = outcome.best.take() {
                tracing::debug!(
                    title = %raw_title,
                    anilist_id = rejected.entry.anilist_id,
                    confidence = rejected.confidence,
                    "Best candidate below minimum confidence"
                );
            }
        }

        match &outcome.best {
            Some(best) => tracing::info!(
                title = %raw_title,
                anilist_id = best.entry.anilist_id,
                confidence = best.confidence,
                strategy = best.strategy,
                "Matched show to catalog"
            ),
            None => tracing::info!(title = %raw_title, "No catalog match found"),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaFormat;
    use crate::services::CatalogError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns scripted responses in call order and records each query
    struct ScriptedCatalog {
        responses: Mutex<Vec<Result<Vec<CatalogEntry>, CatalogError>>>,
        queries: Mutex<Vec<CatalogQuery>>,
    }

    impl ScriptedCatalog {
        fn new(mut responses: Vec<Result<Vec<CatalogEntry>, CatalogError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CatalogSearch for ScriptedCatalog {
        async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError> {
            self.queries.lock().unwrap().push(query.clone());
            self.responses.lock().unwrap().pop().unwrap_or(Ok(Vec::new()))
        }

        async fn get_by_id(&self, _id: i64) -> Result<Option<CatalogEntry>, CatalogError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_blank_title_rejected_without_requests() {
        let catalog = Arc::new(ScriptedCatalog::new(vec![]));
        let matcher = ShowMatcher::new(catalog.clone());

        let err = matcher.find_best_match("   ", Some(2013)).await.unwrap_err();
        assert_eq!(err, MatchError::InvalidTitle);
        assert!(catalog.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_queries_follow_strategy_table() {
        let catalog = Arc::new(ScriptedCatalog::new(vec![]));
        let matcher = ShowMatcher::new(catalog.clone());

        matcher
            .find_best_match("Eiga Yuru Camp: Movie Edition", Some(2022))
            .await
            .unwrap();

        let queries = catalog.queries.lock().unwrap();
        assert_eq!(queries.len(), 6);
        let terms: Vec<&str> = queries.iter().map(|q| q.search.as_deref().unwrap()).collect();
        assert_eq!(
            terms,
            vec![
                "Eiga Yuru Camp: Movie Edition",
                "Eiga Yuru Camp: Movie Edition",
                "Yuru Camp: Movie Edition",
                "Yuru Camp: Movie Edition",
                "Yuru Camp",
                "Yuru Camp",
            ]
        );
        let years: Vec<Option<i32>> = queries.iter().map(|q| q.season_year).collect();
        assert_eq!(
            years,
            vec![Some(2022), None, Some(2022), None, Some(2022), None]
        );
        assert!(queries.iter().all(|q| q.per_page == RESULTS_PER_SEARCH));
    }

    #[tokio::test]
    async fn test_unknown_year_skips_year_strategies() {
        let catalog = Arc::new(ScriptedCatalog::new(vec![]));
        let matcher = ShowMatcher::new(catalog.clone());

        let outcome = matcher.find_best_match("Mushishi", None).await.unwrap();
        assert_eq!(outcome.searches_attempted, 3);
        assert!(catalog
            .queries
            .lock()
            .unwrap()
            .iter()
            .all(|q| q.season_year.is_none()));
    }

    #[tokio::test]
    async fn test_highest_confidence_wins_not_first_hit() {
        let weak = CatalogEntry::new(1, "Mushi-Uta").with_year(2007);
        let strong = CatalogEntry::new(2, "Mushishi")
            .with_year(2005)
            .with_format(MediaFormat::Tv);

        let catalog = Arc::new(ScriptedCatalog::new(vec![
            Ok(vec![]),
            Ok(vec![weak]),
            Ok(vec![strong.clone(), CatalogEntry::new(3, "Other")]),
        ]));
        let matcher = ShowMatcher::new(catalog);

        let outcome = matcher.find_best_match("Mushishi", Some(2005)).await.unwrap();
        let best = outcome.best.unwrap();
        assert_eq!(best.entry, strong);
        assert_eq!(best.strategy, "clean+year");
        assert!((best.confidence - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failures_are_skipped() {
        let entry = CatalogEntry::new(457, "Mushishi").with_year(2005);
        let catalog = Arc::new(ScriptedCatalog::new(vec![
            Err(CatalogError::Network("timeout".to_string())),
            Err(CatalogError::RateLimited),
            Ok(vec![entry.clone()]),
        ]));
        let matcher = ShowMatcher::new(catalog);

        let outcome = matcher.find_best_match("Mushishi", Some(2005)).await.unwrap();
        assert_eq!(outcome.best.as_ref().map(|b| &b.entry), Some(&entry));
        assert_eq!(outcome.searches_failed, 2);
        assert!(outcome.rate_limited);
        assert!(!outcome.all_searches_failed());
    }

    #[tokio::test]
    async fn test_abort_policy_stops_at_first_refusal() {
        let entry = CatalogEntry::new(457, "Mushishi").with_year(2005);
        let catalog = Arc::new(ScriptedCatalog::new(vec![
            Err(CatalogError::RateLimited),
            Ok(vec![entry]),
        ]));
        let matcher = ShowMatcher::new(catalog.clone());

        let outcome = matcher
            .find_best_match_with("Mushishi", Some(2005), RateLimitPolicy::Abort)
            .await
            .unwrap();
        assert!(outcome.rate_limited);
        assert!(outcome.best.is_none());
        assert_eq!(outcome.searches_attempted, 1);
        assert_eq!(catalog.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_abort_policy_ignores_other_failures() {
        let entry = CatalogEntry::new(457, "Mushishi").with_year(2005);
        let catalog = Arc::new(ScriptedCatalog::new(vec![
            Err(CatalogError::Network("timeout".to_string())),
            Ok(vec![entry.clone()]),
        ]));
        let matcher = ShowMatcher::new(catalog);

        let outcome = matcher
            .find_best_match_with("Mushishi", Some(2005), RateLimitPolicy::Abort)
            .await
            .unwrap();
        assert_eq!(outcome.best.map(|b| b.entry), Some(entry));
        assert!(!outcome.rate_limited);
    }

    #[tokio::test]
    async fn test_all_failures_is_no_match() {
        let catalog = Arc::new(ScriptedCatalog::new(
            (0..6)
                .map(|_| Err(CatalogError::Api(500, "boom".to_string())))
                .collect(),
        ));
        let matcher = ShowMatcher::new(catalog);

        let outcome = matcher.find_best_match("Mushishi", Some(2005)).await.unwrap();
        assert!(!outcome.is_match());
        assert!(outcome.all_searches_failed());
        assert!(!outcome.rate_limited);
    }

    #[tokio::test]
    async fn test_threshold_applies_to_best_candidate() {
        let unrelated = CatalogEntry::new(9, "Cowboy Bebop").with_year(1998);
        let catalog = Arc::new(ScriptedCatalog::new(vec![Ok(vec![unrelated])]));
        let matcher = ShowMatcher::new(catalog).with_min_confidence(1.01);

        let outcome = matcher.find_best_match("Mushishi", Some(2005)).await.unwrap();
        assert!(outcome.best.is_none());
    }
}
