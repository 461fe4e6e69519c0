//! HTTP API handlers

pub mod anime;
pub mod health;
pub mod plex;

pub use anime::anime_routes;
pub use health::health_routes;
pub use plex::plex_routes;
