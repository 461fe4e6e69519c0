//! AniList GraphQL client
//!
//! Transport for the catalog: title search and fetch-by-id. Pacing is not
//! done here; wrap the client in a [`RateLimitedCatalog`] to share the
//! catalog's request budget.
//!
//! [`RateLimitedCatalog`]: crate::services::RateLimitedCatalog

use crate::models::{CatalogEntry, MediaFormat};
use crate::services::catalog::{CatalogError, CatalogQuery, CatalogSearch};
use async_trait::async_trait;
use awl_common::config::CatalogConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

const USER_AGENT: &str = concat!("awl-server/", env!("CARGO_PKG_VERSION"));

const MEDIA_FIELDS: &str = r#"
      id
      title {
        romaji
        english
      }
      description
      coverImage {
        large
      }
      bannerImage
      status
      format
      episodes
      duration
      season
      seasonYear
      genres
      averageScore
      popularity
"#;

fn search_query() -> String {
    format!(
        r#"query ($page: Int, $perPage: Int, $search: String, $status: MediaStatus, $season: MediaSeason, $seasonYear: Int) {{
  Page(page: $page, perPage: $perPage) {{
    media(type: ANIME, search: $search, status: $status, season: $season, seasonYear: $seasonYear, sort: POPULARITY_DESC, isAdult: false) {{{}    }}
  }}
}}"#,
        MEDIA_FIELDS
    )
}

fn media_query() -> String {
    format!(
        r#"query ($id: Int) {{
  Media(id: $id, type: ANIME) {{{}  }}
}}"#,
        MEDIA_FIELDS
    )
}

#[derive(Debug, Serialize)]
struct GraphQLRequest {
    query: String,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PageData {
    #[serde(rename = "Page")]
    page: MediaPage,
}

#[derive(Debug, Deserialize)]
struct MediaPage {
    #[serde(default)]
    media: Vec<AniListMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    #[serde(rename = "Media")]
    media: Option<AniListMedia>,
}

/// AniList `Media` object as returned by the GraphQL API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AniListMedia {
    id: i64,
    #[serde(default)]
    title: MediaTitle,
    description: Option<String>,
    cover_image: Option<CoverImage>,
    banner_image: Option<String>,
    status: Option<String>,
    format: Option<MediaFormat>,
    episodes: Option<i32>,
    duration: Option<i32>,
    season: Option<String>,
    season_year: Option<i32>,
    #[serde(default)]
    genres: Option<Vec<String>>,
    average_score: Option<f64>,
    popularity: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MediaTitle {
    romaji: Option<String>,
    english: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CoverImage {
    large: Option<String>,
}

impl From<AniListMedia> for CatalogEntry {
    fn from(media: AniListMedia) -> Self {
        let title = media
            .title
            .romaji
            .clone()
            .or_else(|| media.title.english.clone())
            .unwrap_or_default();

        CatalogEntry {
            anilist_id: media.id,
            title,
            title_english: media.title.english,
            title_romaji: media.title.romaji,
            description: media.description,
            cover_image: media.cover_image.and_then(|c| c.large),
            banner_image: media.banner_image,
            status: media.status,
            format: media.format,
            episodes: media.episodes,
            duration: media.duration,
            season: media.season,
            season_year: media.season_year,
            genres: media.genres.unwrap_or_default(),
            average_score: media.average_score,
            popularity: media.popularity,
        }
    }
}

/// Build the GraphQL variables for a search, omitting unset filters
fn search_variables(query: &CatalogQuery) -> Value {
    let mut vars = Map::new();
    vars.insert("page".to_string(), json!(query.page));
    vars.insert("perPage".to_string(), json!(query.per_page));
    if let Some(search) = &query.search {
        vars.insert("search".to_string(), json!(search));
    }
    if let Some(status) = &query.status {
        vars.insert("status".to_string(), json!(status));
    }
    if let Some(season) = &query.season {
        vars.insert("season".to_string(), json!(season));
    }
    if let Some(year) = query.season_year {
        vars.insert("seasonYear".to_string(), json!(year));
    }
    Value::Object(vars)
}

fn parse_search_body(body: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let response: GraphQLResponse<PageData> =
        serde_json::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))?;

    Ok(response
        .data
        .map(|d| d.page.media.into_iter().map(CatalogEntry::from).collect())
        .unwrap_or_default())
}

fn parse_media_body(body: &str) -> Result<Option<CatalogEntry>, CatalogError> {
    let response: GraphQLResponse<MediaData> =
        serde_json::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))?;

    Ok(response
        .data
        .and_then(|d| d.media)
        .map(CatalogEntry::from))
}

/// Outcome of one HTTP exchange with the catalog
enum Reply {
    Body(String),
    NotFound,
}

/// AniList API client
pub struct AniListClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AniListClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
        })
    }

    async fn post(&self, request: &GraphQLRequest) -> Result<Reply, CatalogError> {
        let response = self
            .http_client
            .post(&self.base_url)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(CatalogError::RateLimited);
        }

        if status == 404 {
            return Ok(Reply::NotFound);
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(CatalogError::Api(status, body));
        }

        Ok(Reply::Body(body))
    }
}

#[async_trait]
impl CatalogSearch for AniListClient {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError> {
        let request = GraphQLRequest {
            query: search_query(),
            variables: search_variables(query),
        };

        tracing::debug!(
            search = ?query.search,
            season_year = ?query.season_year,
            "Querying AniList"
        );

        match self.post(&request).await? {
            Reply::Body(body) => parse_search_body(&body),
            Reply::NotFound => Ok(Vec::new()),
        }
    }

    async fn get_by_id(&self, anilist_id: i64) -> Result<Option<CatalogEntry>, CatalogError> {
        let request = GraphQLRequest {
            query: media_query(),
            variables: json!({ "id": anilist_id }),
        };

        tracing::debug!(anilist_id, "Fetching AniList media");

        match self.post(&request).await? {
            Reply::Body(body) => parse_media_body(&body),
            Reply::NotFound => Ok(None),
        }
    }
}
