//! Cached catalog entries (`anime` table)

use crate::models::{CatalogEntry, MediaFormat};
use awl_common::Result;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

pub(crate) const ANIME_COLUMNS: &str = r#"
    anime.anilist_id AS anilist_id, anime.title_english AS title_english,
    anime.title_romaji AS title_romaji, anime.description AS description,
    anime.cover_image AS cover_image, anime.banner_image AS banner_image,
    anime.status AS status, anime.format AS format, anime.episodes AS episodes,
    anime.duration AS duration, anime.season AS season,
    anime.season_year AS season_year, anime.genres AS genres,
    anime.average_score AS average_score, anime.popularity AS popularity
"#;

fn split_genres(genres: &str) -> Vec<String> {
    genres
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn entry_from_row(row: &SqliteRow) -> CatalogEntry {
    let title_english: Option<String> = row.get("title_english");
    let title_romaji: Option<String> = row.get("title_romaji");
    let format: Option<String> = row.get("format");
    let genres: String = row.get("genres");

    let title = title_romaji
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| title_english.clone())
        .unwrap_or_default();

    CatalogEntry {
        anilist_id: row.get("anilist_id"),
        title,
        title_english,
        title_romaji,
        description: row.get("description"),
        cover_image: row.get("cover_image"),
        banner_image: row.get("banner_image"),
        status: row.get("status"),
        format: format.and_then(|f| f.parse::<MediaFormat>().ok()),
        episodes: row.get("episodes"),
        duration: row.get("duration"),
        season: row.get("season"),
        season_year: row.get("season_year"),
        genres: split_genres(&genres),
        average_score: row.get("average_score"),
        popularity: row.get("popularity"),
    }
}

/// Insert or refresh a cached catalog entry
pub async fn upsert_anime(pool: &SqlitePool, entry: &CatalogEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO anime (
            anilist_id, title_english, title_romaji, description, cover_image,
            banner_image, status, format, episodes, duration, season,
            season_year, genres, average_score, popularity
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(anilist_id) DO UPDATE SET
            title_english = excluded.title_english,
            title_romaji = excluded.title_romaji,
            description = excluded.description,
            cover_image = excluded.cover_image,
            banner_image = excluded.banner_image,
            status = excluded.status,
            format = excluded.format,
            episodes = excluded.episodes,
            duration = excluded.duration,
            season = excluded.season,
            season_year = excluded.season_year,
            genres = excluded.genres,
            average_score = excluded.average_score,
            popularity = excluded.popularity,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(entry.anilist_id)
    .bind(&entry.title_english)
    .bind(&entry.title_romaji)
    .bind(&entry.description)
    .bind(&entry.cover_image)
    .bind(&entry.banner_image)
    .bind(&entry.status)
    .bind(entry.format.map(|f| f.as_str()))
    .bind(entry.episodes)
    .bind(entry.duration)
    .bind(&entry.season)
    .bind(entry.season_year)
    .bind(entry.genres.join(", "))
    .bind(entry.average_score)
    .bind(entry.popularity)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a cached catalog entry
pub async fn get_anime(pool: &SqlitePool, anilist_id: i64) -> Result<Option<CatalogEntry>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM anime WHERE anime.anilist_id = ?",
        ANIME_COLUMNS
    ))
    .bind(anilist_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(entry_from_row))
}
