//! Bulk reconciliation
//!
//! Matches a batch of local shows in input order. Already-linked shows are
//! skipped, most failures are recorded and passed over, and a rate-limit
//! refusal from the catalog stops the whole run.

use super::matcher::{RateLimitPolicy, ShowMatcher};
use crate::models::LocalShow;
use serde::Serialize;
use std::time::Duration;

/// Batch size used when the caller gives no usable limit
pub const DEFAULT_BULK_LIMIT: usize = 50;
/// Largest batch size accepted from callers
pub const MAX_BULK_LIMIT: usize = 100;

/// Resolve a caller-supplied batch limit
///
/// Missing, non-positive, or over-the-ceiling values fall back to the
/// default rather than being clamped to the ceiling.
pub fn effective_bulk_limit(requested: Option<i64>) -> usize {
    match requested {
        Some(limit) if limit > 0 && limit <= MAX_BULK_LIMIT as i64 => limit as usize,
        _ => DEFAULT_BULK_LIMIT,
    }
}

/// Courtesy pause between groups of shows
///
/// Applies on top of the per-request spacing of the catalog pacer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkPacing {
    /// Pause after every `every`-th show (1-indexed position in the batch)
    pub every: usize,
    pub pause: Duration,
}

impl Default for BulkPacing {
    fn default() -> Self {
        Self {
            every: 5,
            pause: Duration::from_secs(2),
        }
    }
}

impl BulkPacing {
    /// No pauses
    pub fn none() -> Self {
        Self {
            every: 0,
            pause: Duration::ZERO,
        }
    }

    fn pause_after(&self, position: usize) -> bool {
        self.every > 0 && !self.pause.is_zero() && position % self.every == 0
    }
}

/// Per-show result of a reconciliation attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Linked to a catalog entry
    Mapped { anilist_id: i64, confidence: f64 },
    /// Show was already linked; nothing done
    AlreadyLinked,
    /// Searches ran but nothing reached the confidence threshold
    Unmatched,
    /// Show could not be matched this time; the run continues
    Failed { reason: String },
    /// Catalog refused a request for rate limiting; the run stops
    RateLimited,
}

impl AttemptOutcome {
    /// Whether this outcome stops the remaining batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, AttemptOutcome::RateLimited)
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, AttemptOutcome::Mapped { .. })
    }
}

/// Outcome for one show of a bulk run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowAttempt {
    pub plex_id: i64,
    pub title: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Summary of a bulk run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkReport {
    /// Shows handed to the run
    pub processed: usize,
    /// Shows newly linked during the run
    pub mapped: usize,
    /// Shows passed over because they were already linked
    pub skipped: usize,
    /// The run stopped early on a rate-limit refusal
    pub aborted: bool,
    /// One entry per show the run reached, in input order
    pub attempts: Vec<ShowAttempt>,
}

impl BulkReport {
    /// Shows neither mapped nor already linked, including any not reached
    /// after an abort
    pub fn failed(&self) -> usize {
        self.processed
            .saturating_sub(self.mapped)
            .saturating_sub(self.skipped)
    }
}

impl ShowMatcher {
    /// Reconcile one show, linking it in place on success
    ///
    /// The first rate-limited search ends the attempt without issuing the
    /// remaining strategies, and the show is left unlinked even if an
    /// earlier strategy produced a candidate.
    pub async fn reconcile_show(&self, show: &mut LocalShow) -> AttemptOutcome {
        if show.is_linked() {
            return AttemptOutcome::AlreadyLinked;
        }

        let outcome = match self
            .find_best_match_with(&show.title, show.year, RateLimitPolicy::Abort)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                return AttemptOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        if outcome.rate_limited {
            return AttemptOutcome::RateLimited;
        }

        if let Some(best) = outcome.best {
            show.link(best.entry.anilist_id);
            return AttemptOutcome::Mapped {
                anilist_id: best.entry.anilist_id,
                confidence: best.confidence,
            };
        }

        if outcome.all_searches_failed() {
            AttemptOutcome::Failed {
                reason: "all catalog searches failed".to_string(),
            }
        } else {
            AttemptOutcome::Unmatched
        }
    }

    /// Reconcile a batch of shows in order
    ///
    /// Shows are linked in place; the caller persists every show whose
    /// attempt is [`AttemptOutcome::Mapped`]. Shows after a rate-limited
    /// attempt are not touched.
    pub async fn bulk_match(&self, shows: &mut [LocalShow]) -> BulkReport {
        let pacing = self.bulk_pacing;
        let total = shows.len();
        let mut report = BulkReport {
            processed: total,
            ..BulkReport::default()
        };

        for (index, show) in shows.iter_mut().enumerate() {
            let position = index + 1;
            let outcome = self.reconcile_show(show).await;

            match &outcome {
                AttemptOutcome::Mapped { .. } => report.mapped += 1,
                AttemptOutcome::AlreadyLinked => report.skipped += 1,
                AttemptOutcome::Failed { reason } => {
                    tracing::warn!(title = %show.title, reason = %reason, "Show reconciliation failed");
                }
                _ => {}
            }

            let fatal = outcome.is_fatal();
            let skipped = outcome == AttemptOutcome::AlreadyLinked;
            report.attempts.push(ShowAttempt {
                plex_id: show.plex_id,
                title: show.title.clone(),
                outcome,
            });

            if fatal {
                tracing::warn!(
                    title = %show.title,
                    position,
                    remaining = total - position,
                    "Catalog rate limit hit, stopping bulk reconciliation"
                );
                report.aborted = true;
                break;
            }

            if !skipped && position < total && pacing.pause_after(position) {
                tracing::debug!(position, pause = ?pacing.pause, "Bulk pacing pause");
                tokio::time::sleep(pacing.pause).await;
            }
        }

        tracing::info!(
            processed = report.processed,
            mapped = report.mapped,
            skipped = report.skipped,
            failed = report.failed(),
            aborted = report.aborted,
            "Bulk reconciliation complete"
        );

        report
    }
}
