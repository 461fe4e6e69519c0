//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates the watchlist schema.
//! Every statement is idempotent, so initialization is safe on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create an in-memory database with the full schema
///
/// Limited to one connection: every SQLite `:memory:` connection is a
/// separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table and index used by the service
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_anime_table(pool).await?;
    create_watchlist_table(pool).await?;
    create_plex_shows_table(pool).await?;

    info!("Database tables initialized (anime, watchlist, plex_shows)");
    Ok(())
}

/// Cached catalog entries, keyed by catalog (AniList) id
pub async fn create_anime_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime (
            anilist_id INTEGER PRIMARY KEY,
            title_english TEXT,
            title_romaji TEXT,
            description TEXT,
            cover_image TEXT,
            banner_image TEXT,
            status TEXT,
            format TEXT,
            episodes INTEGER,
            duration INTEGER,
            season TEXT,
            season_year INTEGER,
            genres TEXT NOT NULL DEFAULT '',
            average_score REAL,
            popularity INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_anime_popularity ON anime(popularity DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_watchlist_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS watchlist (
            anilist_id INTEGER PRIMARY KEY REFERENCES anime(anilist_id) ON DELETE CASCADE,
            added_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Shows known from the media server; `anilist_id` is the catalog link
pub async fn create_plex_shows_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plex_shows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plex_id INTEGER NOT NULL UNIQUE,
            title TEXT NOT NULL,
            anilist_id INTEGER,
            year INTEGER,
            episode_count INTEGER NOT NULL DEFAULT 0,
            last_updated TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_plex_shows_anilist_id ON plex_shows(anilist_id)")
        .execute(pool)
        .await?;

    Ok(())
}
