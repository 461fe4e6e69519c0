//! Catalog search contract
//!
//! The matcher and the watchlist only see the catalog through
//! [`CatalogSearch`], so the AniList client, the rate-limited wrapper and test
//! doubles are interchangeable.

use crate::models::CatalogEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page size for user-facing searches
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size accepted from callers
pub const MAX_PAGE_SIZE: u32 = 50;

/// Catalog client errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    /// The catalog answered "too many requests"
    #[error("Rate limited by catalog API")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl CatalogError {
    /// Whether this failure is the catalog's rate-limit signal
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CatalogError::RateLimited)
    }
}

/// Search parameters
///
/// Results are always ordered by popularity (descending) and exclude adult
/// content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub season: Option<String>,
    pub season_year: Option<i32>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            season: None,
            season_year: None,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    /// Title search on the first page
    pub fn title(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.season_year = year;
        self
    }

    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Clamp paging into the accepted range
    ///
    /// Page below 1 becomes 1; page size outside 1..=50 becomes 20.
    pub fn normalized(mut self) -> Self {
        if self.page < 1 {
            self.page = 1;
        }
        if self.per_page < 1 || self.per_page > MAX_PAGE_SIZE {
            self.per_page = DEFAULT_PAGE_SIZE;
        }
        self.search = self.search.filter(|s| !s.trim().is_empty());
        self
    }
}

/// Anime catalog operations needed by the service
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Search the catalog, most popular first
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Fetch a single entry; `Ok(None)` when the catalog does not know the id
    async fn get_by_id(&self, anilist_id: i64) -> Result<Option<CatalogEntry>, CatalogError>;
}
