//! awl-server library interface
//!
//! Exposes the matching engine, service clients and HTTP router for the
//! binary and for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod matching;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use awl_common::config::{CorsConfig, TomlConfig};
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use chrono::{DateTime, Utc};
use crate::matching::ShowMatcher;
use crate::services::{CatalogSearch, MediaLibrary};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Rate-limited catalog; the matcher shares the same pacer
    pub catalog: Arc<dyn CatalogSearch>,
    pub matcher: Arc<ShowMatcher>,
    pub media_library: Arc<dyn MediaLibrary>,
    /// Held for the duration of a bulk reconciliation run
    pub bulk_lock: Arc<Mutex<()>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// `catalog` should already be rate limited; the matcher is built on it
    pub fn new(
        db: SqlitePool,
        catalog: Arc<dyn CatalogSearch>,
        media_library: Arc<dyn MediaLibrary>,
    ) -> Self {
        let matcher = Arc::new(ShowMatcher::new(catalog.clone()));
        Self::with_matcher(db, catalog, matcher, media_library)
    }

    pub fn with_matcher(
        db: SqlitePool,
        catalog: Arc<dyn CatalogSearch>,
        matcher: Arc<ShowMatcher>,
        media_library: Arc<dyn MediaLibrary>,
    ) -> Self {
        Self {
            db,
            catalog,
            matcher,
            media_library,
            bulk_lock: Arc::new(Mutex::new(())),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::anime_routes())
        .merge(api::plex_routes())
        .with_state(state)
}

/// Router with the HTTP middleware stack and optional static files
pub fn build_app(state: AppState, config: &TomlConfig) -> Router {
    let mut router = build_router(state);

    if let Some(dir) = &config.static_assets {
        tracing::info!("Serving static files from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    let request_id = HeaderName::from_static("x-request-id");

    router
        .layer(cors_layer(&config.cors))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
