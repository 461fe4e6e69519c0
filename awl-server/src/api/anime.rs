//! Catalog search and watchlist endpoints

use crate::db::watchlist::{self, WatchlistItem};
use crate::db::anime as anime_db;
use crate::models::CatalogEntry;
use crate::services::CatalogQuery;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Query string for GET /api/anime/search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl SearchParams {
    fn into_query(self) -> CatalogQuery {
        let defaults = CatalogQuery::default();
        CatalogQuery {
            search: self.search,
            status: self.status.filter(|s| !s.trim().is_empty()),
            season: self.season.filter(|s| !s.trim().is_empty()),
            season_year: self.year.filter(|y| *y > 0),
            page: self.page.unwrap_or(defaults.page),
            per_page: self.page_size.unwrap_or(defaults.per_page),
        }
        .normalized()
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// GET /api/anime/search
///
/// Pass-through catalog search, paced by the shared rate limiter.
pub async fn search_anime(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    let query = params.into_query();
    let results = state.catalog.search(&query).await?;
    Ok(Json(results))
}

/// GET /api/anime/watching
pub async fn get_watchlist(State(state): State<AppState>) -> ApiResult<Json<Vec<WatchlistItem>>> {
    Ok(Json(watchlist::list_watchlist(&state.db).await?))
}

/// POST /api/anime/:id/watch
///
/// **Errors:**
/// - 400: non-positive id
/// - 404: catalog does not know the id
/// - 409: already on the watchlist
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    Path(anilist_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if anilist_id <= 0 {
        return Err(ApiError::BadRequest(
            "Anime ID must be a positive integer".to_string(),
        ));
    }

    if watchlist::is_watching(&state.db, anilist_id).await? {
        return Err(ApiError::Conflict("Anime already in watchlist".to_string()));
    }

    if anime_db::get_anime(&state.db, anilist_id).await?.is_none() {
        let entry = state
            .catalog
            .get_by_id(anilist_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Anime {} not found", anilist_id)))?;
        anime_db::upsert_anime(&state.db, &entry).await?;
    }

    if !watchlist::add_to_watchlist(&state.db, anilist_id).await? {
        return Err(ApiError::Conflict("Anime already in watchlist".to_string()));
    }

    info!(anilist_id, "Added to watchlist");

    Ok(Json(MessageResponse {
        message: "Added to watchlist".to_string(),
    }))
}

/// DELETE /api/anime/:id/watch
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(anilist_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !watchlist::remove_from_watchlist(&state.db, anilist_id).await? {
        return Err(ApiError::NotFound("Anime not in watchlist".to_string()));
    }

    info!(anilist_id, "Removed from watchlist");

    Ok(Json(MessageResponse {
        message: "Removed from watchlist".to_string(),
    }))
}

/// GET /api/watchlist/count
pub async fn get_watchlist_count(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let count = watchlist::count_watchlist(&state.db).await?;
    Ok(Json(CountResponse { count }))
}

/// Build catalog and watchlist routes
pub fn anime_routes() -> Router<AppState> {
    Router::new()
        .route("/api/anime/search", get(search_anime))
        .route("/api/anime/watching", get(get_watchlist))
        .route(
            "/api/anime/:id/watch",
            post(add_to_watchlist).delete(remove_from_watchlist),
        )
        .route("/api/watchlist/count", get(get_watchlist_count))
}
