//! Media server inventory and reconciliation endpoints

use crate::db::{shows, watchlist};
use crate::matching::{effective_bulk_limit, ShowAttempt};
use crate::models::{LocalShow, ServerStatus};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct ShowSearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub anilist_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MapRequest {
    pub plex_id: i64,
    pub anilist_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AutoMapRequest {
    pub plex_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkAutoMapRequest {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub message: String,
    pub show: LocalShow,
}

#[derive(Debug, Serialize)]
pub struct AutoMapResponse {
    pub matched: bool,
    pub show: LocalShow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'static str>,
    /// At least one strategy was skipped because of the catalog rate limit
    pub rate_limited: bool,
}

#[derive(Debug, Serialize)]
pub struct BulkAutoMapResponse {
    pub message: String,
    pub processed: usize,
    pub mapped: usize,
    pub failed: usize,
    /// The run stopped early on a catalog rate limit
    pub rate_limited: bool,
    pub attempts: Vec<ShowAttempt>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub on_server: bool,
    pub show: Option<LocalShow>,
}

/// GET /api/plex/status
pub async fn get_server_status(State(state): State<AppState>) -> ApiResult<Json<ServerStatus>> {
    Ok(Json(watchlist::server_status(&state.db).await?))
}

/// POST /api/plex/sync
///
/// Upserts every show reported by the media server. Existing catalog links
/// are kept.
pub async fn sync_shows(State(state): State<AppState>) -> ApiResult<Json<SyncResponse>> {
    let fetched = state.media_library.fetch_shows().await?;

    for show in &fetched {
        shows::upsert_show(&state.db, show).await?;
    }

    info!(count = fetched.len(), "Synced shows from media server");

    Ok(Json(SyncResponse {
        message: "Plex shows synced successfully".to_string(),
        count: fetched.len(),
    }))
}

/// GET /api/plex/shows
pub async fn get_shows(State(state): State<AppState>) -> ApiResult<Json<Vec<LocalShow>>> {
    Ok(Json(shows::list_shows(&state.db).await?))
}

/// GET /api/plex/unmapped
pub async fn get_unmapped_shows(State(state): State<AppState>) -> ApiResult<Json<Vec<LocalShow>>> {
    Ok(Json(shows::list_unmapped_shows(&state.db).await?))
}

/// GET /api/plex/search?q=
pub async fn search_shows(
    State(state): State<AppState>,
    Query(params): Query<ShowSearchParams>,
) -> ApiResult<Json<Vec<LocalShow>>> {
    let term = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Search term is required".to_string()))?;

    Ok(Json(shows::search_shows(&state.db, term.trim()).await?))
}

/// POST /api/plex/map
///
/// Manual link; overrides any existing link.
pub async fn map_show(
    State(state): State<AppState>,
    Json(request): Json<MapRequest>,
) -> ApiResult<Json<MapResponse>> {
    if request.anilist_id <= 0 {
        return Err(ApiError::BadRequest(
            "anilist_id must be a positive integer".to_string(),
        ));
    }

    if !shows::update_show_mapping(&state.db, request.plex_id, request.anilist_id).await? {
        return Err(ApiError::NotFound(format!("Show {} not found", request.plex_id)));
    }

    let show = shows::get_show_by_plex_id(&state.db, request.plex_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Show {} not found", request.plex_id)))?;

    info!(plex_id = request.plex_id, anilist_id = request.anilist_id, "Show mapped manually");

    Ok(Json(MapResponse {
        message: "Show mapped successfully".to_string(),
        show,
    }))
}

/// POST /api/plex/auto-map
///
/// Reconciles one show. No match is not an error: the response carries
/// `matched: false`. A rate-limited strategy is skipped like any other failed
/// search and reported through `rate_limited`.
pub async fn auto_map_show(
    State(state): State<AppState>,
    Json(request): Json<AutoMapRequest>,
) -> ApiResult<Json<AutoMapResponse>> {
    let mut show = shows::get_show_by_plex_id(&state.db, request.plex_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Show {} not found", request.plex_id)))?;

    if show.is_linked() {
        return Ok(Json(AutoMapResponse {
            matched: true,
            show,
            confidence: None,
            strategy: None,
            rate_limited: false,
        }));
    }

    let outcome = state.matcher.find_best_match(&show.title, show.year).await?;

    let Some(best) = outcome.best else {
        return Ok(Json(AutoMapResponse {
            matched: false,
            show,
            confidence: None,
            strategy: None,
            rate_limited: outcome.rate_limited,
        }));
    };

    show.link(best.entry.anilist_id);
    shows::update_show_mapping(&state.db, show.plex_id, best.entry.anilist_id).await?;

    Ok(Json(AutoMapResponse {
        matched: true,
        show,
        confidence: Some(best.confidence),
        strategy: Some(best.strategy),
        rate_limited: outcome.rate_limited,
    }))
}

/// POST /api/plex/bulk-auto-map
///
/// Reconciles up to `limit` unlinked shows in title order. A missing or
/// malformed body uses the default limit. Only one run may be in progress.
pub async fn bulk_auto_map(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<BulkAutoMapResponse>> {
    let request: BulkAutoMapRequest = serde_json::from_slice(&body).unwrap_or_default();
    let limit = effective_bulk_limit(request.limit);

    let _guard = state
        .bulk_lock
        .try_lock()
        .map_err(|_| ApiError::Conflict("Bulk auto-map already running".to_string()))?;

    let mut pending = shows::list_unmapped_shows(&state.db).await?;
    pending.truncate(limit);

    info!(count = pending.len(), limit, "Starting bulk auto-map");

    let report = state.matcher.bulk_match(&mut pending).await;

    for (show, attempt) in pending.iter().zip(&report.attempts) {
        if !attempt.outcome.is_mapped() {
            continue;
        }
        let Some(anilist_id) = show.anilist_id else {
            continue;
        };
        if let Err(e) = shows::update_show_mapping(&state.db, show.plex_id, anilist_id).await {
            warn!(plex_id = show.plex_id, error = %e, "Failed to save mapping");
        }
    }

    let failed = report.failed();
    Ok(Json(BulkAutoMapResponse {
        message: if report.aborted {
            "Bulk auto-map stopped: catalog rate limit reached".to_string()
        } else {
            "Bulk auto-map completed".to_string()
        },
        processed: report.processed,
        mapped: report.mapped,
        failed,
        rate_limited: report.aborted,
        attempts: report.attempts,
    }))
}

/// GET /api/plex/check?anilist_id=
pub async fn check_show(
    State(state): State<AppState>,
    Query(params): Query<CheckParams>,
) -> ApiResult<Json<CheckResponse>> {
    let anilist_id = params
        .anilist_id
        .ok_or_else(|| ApiError::BadRequest("Anilist ID is required".to_string()))?;

    let show = shows::find_show_by_anilist_id(&state.db, anilist_id).await?;

    Ok(Json(CheckResponse {
        on_server: show.is_some(),
        show,
    }))
}

/// Build media server routes
pub fn plex_routes() -> Router<AppState> {
    Router::new()
        .route("/api/plex/status", get(get_server_status))
        .route("/api/plex/sync", post(sync_shows))
        .route("/api/plex/shows", get(get_shows))
        .route("/api/plex/unmapped", get(get_unmapped_shows))
        .route("/api/plex/search", get(search_shows))
        .route("/api/plex/map", post(map_show))
        .route("/api/plex/auto-map", post(auto_map_show))
        .route("/api/plex/bulk-auto-map", post(bulk_auto_map))
        .route("/api/plex/check", get(check_show))
}
