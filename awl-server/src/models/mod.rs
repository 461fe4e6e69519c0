//! Domain models for the watchlist service

pub mod catalog;
pub mod local_show;
pub mod status;

pub use catalog::{CatalogEntry, MediaFormat};
pub use local_show::LocalShow;
pub use status::ServerStatus;
