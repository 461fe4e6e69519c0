//! Common error types for the anime watchlist service

use thiserror::Error;

/// Common result type for watchlist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bootstrapping or querying local storage
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the database directory failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}
