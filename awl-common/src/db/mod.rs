//! Database bootstrap shared by the watchlist crates

pub mod init;

pub use init::*;
