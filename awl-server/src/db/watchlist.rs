//! Watchlist persistence and reconciliation status

use super::anime::{entry_from_row, ANIME_COLUMNS};
use crate::models::{CatalogEntry, ServerStatus};
use awl_common::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// A watchlist entry joined with its cached catalog record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistItem {
    pub added_at: DateTime<Utc>,
    #[serde(flatten)]
    pub anime: CatalogEntry,
}

/// Add a catalog id to the watchlist
///
/// The entry must already be cached in `anime`. Returns `false` when the id
/// is already on the watchlist.
pub async fn add_to_watchlist(pool: &SqlitePool, anilist_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO watchlist (anilist_id, added_at) VALUES (?, ?) ON CONFLICT(anilist_id) DO NOTHING",
    )
    .bind(anilist_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns `false` when the id was not on the watchlist
pub async fn remove_from_watchlist(pool: &SqlitePool, anilist_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM watchlist WHERE anilist_id = ?")
        .bind(anilist_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_watching(pool: &SqlitePool, anilist_id: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM watchlist WHERE anilist_id = ?")
        .bind(anilist_id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// Watchlist entries, newest first
pub async fn list_watchlist(pool: &SqlitePool) -> Result<Vec<WatchlistItem>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}, watchlist.added_at AS added_at
        FROM watchlist
        JOIN anime ON anime.anilist_id = watchlist.anilist_id
        ORDER BY watchlist.added_at DESC, watchlist.anilist_id DESC
        "#,
        ANIME_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| WatchlistItem {
            added_at: row.get("added_at"),
            anime: entry_from_row(row),
        })
        .collect())
}

pub async fn count_watchlist(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM watchlist")
        .fetch_one(pool)
        .await?)
}

/// Compare the local inventory against the catalog links and the watchlist
pub async fn server_status(pool: &SqlitePool) -> Result<ServerStatus> {
    let shows_on_server = super::shows::count_shows(pool).await?;
    let mapped_to_anilist = super::shows::count_mapped_shows(pool).await?;
    let unmapped_shows = super::shows::count_unmapped_shows(pool).await?;

    let watchlist_shows: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM watchlist
        WHERE EXISTS (SELECT 1 FROM plex_shows WHERE plex_shows.anilist_id = watchlist.anilist_id)
        "#,
    )
    .fetch_one(pool)
    .await?;

    let missing_from_server = count_watchlist(pool).await? - watchlist_shows;

    Ok(ServerStatus {
        shows_on_server,
        mapped_to_anilist,
        unmapped_shows,
        watchlist_shows,
        missing_from_server,
    })
}
