//! Database queries for the watchlist service
//!
//! Schema creation lives in `awl_common::db`; these modules only read and
//! write rows.

pub mod anime;
pub mod shows;
pub mod watchlist;

pub use awl_common::db::{init_database, init_memory_database};
