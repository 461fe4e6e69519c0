//! External collaborators: the anime catalog and the media server

pub mod anilist_client;
pub mod catalog;
pub mod plex_client;
pub mod rate_limiter;

pub use anilist_client::AniListClient;
pub use catalog::{CatalogError, CatalogQuery, CatalogSearch};
pub use plex_client::{MediaLibrary, MediaServerError, PlexClient};
pub use rate_limiter::{IntervalPacer, RateLimitedCatalog, RequestPacer};
