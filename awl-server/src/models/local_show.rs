//! Shows known from the personal media server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A show from the media server inventory, optionally linked to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalShow {
    /// Database row id (0 before the show is first persisted)
    pub id: i64,
    /// Media server rating key
    pub plex_id: i64,
    pub title: String,
    /// Catalog link; once set the show is never re-matched
    pub anilist_id: Option<i64>,
    /// Release year, `None` when the media server does not know it
    pub year: Option<i32>,
    pub episode_count: i32,
    pub last_updated: DateTime<Utc>,
}

impl LocalShow {
    pub fn new(plex_id: i64, title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            id: 0,
            plex_id,
            title: title.into(),
            anilist_id: None,
            year: year.filter(|y| *y > 0),
            episode_count: 0,
            last_updated: Utc::now(),
        }
    }

    pub fn is_linked(&self) -> bool {
        self.anilist_id.is_some()
    }

    /// Record the catalog link
    pub fn link(&mut self, anilist_id: i64) {
        self.anilist_id = Some(anilist_id);
        self.last_updated = Utc::now();
    }
}
