//! # AWL Common Library
//!
//! Shared code for the anime watchlist service:
//! - Error and result types
//! - Configuration loading (TOML, environment, compiled defaults)
//! - Database bootstrap (pool creation and schema)

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
