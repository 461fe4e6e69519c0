//! Media server reconciliation status

use serde::{Deserialize, Serialize};

/// Summary of how the local inventory lines up with the catalog and watchlist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub shows_on_server: i64,
    pub mapped_to_anilist: i64,
    pub unmapped_shows: i64,
    /// Watchlist entries that are linked to a show on the server
    pub watchlist_shows: i64,
    /// Watchlist entries with no linked show on the server
    pub missing_from_server: i64,
}
