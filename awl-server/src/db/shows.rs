//! Local show persistence (`plex_shows` table)

use crate::models::LocalShow;
use awl_common::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

const SHOW_COLUMNS: &str = "id, plex_id, title, anilist_id, year, episode_count, last_updated";

fn show_from_row(row: &SqliteRow) -> LocalShow {
    let last_updated: DateTime<Utc> = row.get("last_updated");
    LocalShow {
        id: row.get("id"),
        plex_id: row.get("plex_id"),
        title: row.get("title"),
        anilist_id: row.get("anilist_id"),
        year: row.get("year"),
        episode_count: row.get("episode_count"),
        last_updated,
    }
}

/// Insert or update a show keyed by its media-server id
///
/// Title, year and episode count always follow the incoming record. The
/// catalog link is only overwritten when the incoming record carries one,
/// so re-syncing from the media server keeps existing links.
pub async fn upsert_show(pool: &SqlitePool, show: &LocalShow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO plex_shows (plex_id, title, anilist_id, year, episode_count, last_updated)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(plex_id) DO UPDATE SET
            title = excluded.title,
            anilist_id = COALESCE(excluded.anilist_id, plex_shows.anilist_id),
            year = excluded.year,
            episode_count = excluded.episode_count,
            last_updated = excluded.last_updated
        "#,
    )
    .bind(show.plex_id)
    .bind(&show.title)
    .bind(show.anilist_id)
    .bind(show.year)
    .bind(show.episode_count)
    .bind(show.last_updated)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load show by media-server id
pub async fn get_show_by_plex_id(pool: &SqlitePool, plex_id: i64) -> Result<Option<LocalShow>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM plex_shows WHERE plex_id = ?",
        SHOW_COLUMNS
    ))
    .bind(plex_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(show_from_row))
}

/// All shows, ordered by title
pub async fn list_shows(pool: &SqlitePool) -> Result<Vec<LocalShow>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM plex_shows ORDER BY title, plex_id",
        SHOW_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(show_from_row).collect())
}

/// Shows with no catalog link, ordered by title
pub async fn list_unmapped_shows(pool: &SqlitePool) -> Result<Vec<LocalShow>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM plex_shows WHERE anilist_id IS NULL ORDER BY title, plex_id",
        SHOW_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(show_from_row).collect())
}

/// Case-insensitive substring search over titles
///
/// The term is matched literally; `%` and `_` are not wildcards.
pub async fn search_shows(pool: &SqlitePool, term: &str) -> Result<Vec<LocalShow>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM plex_shows WHERE instr(lower(title), lower(?)) > 0 ORDER BY title, plex_id",
        SHOW_COLUMNS
    ))
    .bind(term)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(show_from_row).collect())
}

/// First show linked to the given catalog id
pub async fn find_show_by_anilist_id(
    pool: &SqlitePool,
    anilist_id: i64,
) -> Result<Option<LocalShow>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM plex_shows WHERE anilist_id = ? ORDER BY title, plex_id LIMIT 1",
        SHOW_COLUMNS
    ))
    .bind(anilist_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(show_from_row))
}

/// Set the catalog link of a show
///
/// Returns `false` when no show has the given media-server id.
pub async fn update_show_mapping(pool: &SqlitePool, plex_id: i64, anilist_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE plex_shows SET anilist_id = ?, last_updated = ? WHERE plex_id = ?",
    )
    .bind(anilist_id)
    .bind(Utc::now())
    .bind(plex_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_shows(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM plex_shows")
        .fetch_one(pool)
        .await?)
}

pub async fn count_mapped_shows(pool: &SqlitePool) -> Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM plex_shows WHERE anilist_id IS NOT NULL")
            .fetch_one(pool)
            .await?,
    )
}

pub async fn count_unmapped_shows(pool: &SqlitePool) -> Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM plex_shows WHERE anilist_id IS NULL")
            .fetch_one(pool)
            .await?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use awl_common::db::init_memory_database;

    async fn seeded_pool() -> SqlitePool {
        let pool = init_memory_database().await.unwrap();
        for (plex_id, title, year) in [(1, "Mushishi", 2005), (2, "Frieren", 2023), (3, "Akira", 1988)] {
            upsert_show(&pool, &LocalShow::new(plex_id, title, Some(year)))
                .await
                .unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_list_orders_by_title() {
        let pool = seeded_pool().await;
        let titles: Vec<String> = list_shows(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Akira", "Frieren", "Mushishi"]);
    }

    #[tokio::test]
    async fn test_mapping_moves_show_out_of_unmapped() {
        let pool = seeded_pool().await;
        assert!(update_show_mapping(&pool, 1, 457).await.unwrap());
        assert!(!update_show_mapping(&pool, 99, 1).await.unwrap());

        let unmapped = list_unmapped_shows(&pool).await.unwrap();
        assert_eq!(unmapped.len(), 2);
        assert!(unmapped.iter().all(|s| s.plex_id != 1));

        assert_eq!(count_shows(&pool).await.unwrap(), 3);
        assert_eq!(count_mapped_shows(&pool).await.unwrap(), 1);
        assert_eq!(count_unmapped_shows(&pool).await.unwrap(), 2);

        let linked = find_show_by_anilist_id(&pool, 457).await.unwrap().unwrap();
        assert_eq!(linked.title, "Mushishi");
    }

    #[tokio::test]
    async fn test_resync_keeps_existing_link() {
        let pool = seeded_pool().await;
        update_show_mapping(&pool, 2, 154587).await.unwrap();

        let mut refreshed = LocalShow::new(2, "Sousou no Frieren", Some(2023));
        refreshed.episode_count = 28;
        upsert_show(&pool, &refreshed).await.unwrap();

        let show = get_show_by_plex_id(&pool, 2).await.unwrap().unwrap();
        assert_eq!(show.title, "Sousou no Frieren");
        assert_eq!(show.episode_count, 28);
        assert_eq!(show.anilist_id, Some(154587));
    }

    #[tokio::test]
    async fn test_search_is_substring() {
        let pool = seeded_pool().await;
        let found = search_shows(&pool, "ier").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].plex_id, 2);

        let upper = search_shows(&pool, "MUSHI").await.unwrap();
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].plex_id, 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let pool = seeded_pool().await;
        assert!(search_shows(&pool, "_").await.unwrap().is_empty());
        assert!(search_shows(&pool, "%").await.unwrap().is_empty());
        assert!(search_shows(&pool, "Ak_ra").await.unwrap().is_empty());

        upsert_show(&pool, &LocalShow::new(4, "100% Pascal-sensei", Some(2017)))
            .await
            .unwrap();
        let found = search_shows(&pool, "%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].plex_id, 4);
    }
}
