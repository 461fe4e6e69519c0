//! Plex media server client
//!
//! Reads the show inventory of one library section. Shows come back
//! unlinked; catalog links are owned by the local database.

use crate::models::LocalShow;
use async_trait::async_trait;
use awl_common::config::PlexConfig;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Media server errors
#[derive(Debug, Error)]
pub enum MediaServerError {
    #[error("Plex sync is disabled")]
    SyncDisabled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Plex API returned status {0}")]
    Api(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of locally-known shows
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn fetch_shows(&self) -> Result<Vec<LocalShow>, MediaServerError>;
}

#[derive(Debug, Deserialize)]
struct PlexShowResponse {
    #[serde(rename = "MediaContainer")]
    media_container: MediaContainer,
}

#[derive(Debug, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexShowMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexShowMetadata {
    rating_key: String,
    title: String,
    year: Option<i32>,
    child_count: Option<i32>,
}

fn parse_library_body(body: &str) -> Result<Vec<LocalShow>, MediaServerError> {
    let response: PlexShowResponse =
        serde_json::from_str(body).map_err(|e| MediaServerError::Parse(e.to_string()))?;

    let shows = response
        .media_container
        .metadata
        .into_iter()
        .filter_map(|metadata| match metadata.rating_key.parse::<i64>() {
            Ok(plex_id) => {
                let mut show = LocalShow::new(plex_id, metadata.title, metadata.year);
                show.episode_count = metadata.child_count.unwrap_or(0);
                Some(show)
            }
            Err(_) => {
                tracing::warn!(
                    rating_key = %metadata.rating_key,
                    title = %metadata.title,
                    "Skipping Plex entry with non-numeric rating key"
                );
                None
            }
        })
        .collect();

    Ok(shows)
}

/// Plex HTTP client for one library section
pub struct PlexClient {
    http_client: reqwest::Client,
    config: PlexConfig,
}

impl PlexClient {
    pub fn new(config: PlexConfig) -> Result<Self, MediaServerError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MediaServerError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn library_url(&self) -> String {
        format!(
            "{}/library/sections/{}/all",
            self.config.server_url.trim_end_matches('/'),
            self.config.library_id
        )
    }
}

#[async_trait]
impl MediaLibrary for PlexClient {
    async fn fetch_shows(&self) -> Result<Vec<LocalShow>, MediaServerError> {
        if !self.config.sync_enabled {
            return Err(MediaServerError::SyncDisabled);
        }

        let url = self.library_url();
        tracing::debug!(url = %url, "Fetching shows from Plex");

        let response = self
            .http_client
            .get(&url)
            .header("X-Plex-Token", &self.config.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| MediaServerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaServerError::Api(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MediaServerError::Network(e.to_string()))?;

        let shows = parse_library_body(&body)?;
        tracing::info!(count = shows.len(), "Fetched shows from Plex");
        Ok(shows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_library_body() {
        let body = r#"{
          "MediaContainer": {
            "size": 3,
            "Metadata": [
              { "ratingKey": "101", "title": "Mushishi", "year": 2005, "childCount": 2 },
              { "ratingKey": "abc", "title": "Broken Key" },
              { "ratingKey": "102", "title": "Frieren" }
            ]
          }
        }"#;

        let shows = parse_library_body(body).unwrap();
        assert_eq!(shows.len(), 2);
        assert_eq!(shows[0].plex_id, 101);
        assert_eq!(shows[0].year, Some(2005));
        assert_eq!(shows[0].episode_count, 2);
        assert_eq!(shows[1].title, "Frieren");
        assert_eq!(shows[1].year, None);
        assert!(shows.iter().all(|s| s.anilist_id.is_none()));
    }

    #[test]
    fn test_empty_library() {
        let shows = parse_library_body(r#"{"MediaContainer":{"size":0}}"#).unwrap();
        assert!(shows.is_empty());
    }

    #[test]
    fn test_library_url() {
        let client = PlexClient::new(PlexConfig {
            server_url: "http://plex.local:32400/".to_string(),
            token: "t".to_string(),
            library_id: 4,
            sync_enabled: true,
        })
        .unwrap();
        assert_eq!(client.library_url(), "http://plex.local:32400/library/sections/4/all");
    }

    #[tokio::test]
    async fn test_disabled_sync_makes_no_request() {
        let client = PlexClient::new(PlexConfig::default()).unwrap();
        let err = client.fetch_shows().await.unwrap_err();
        assert!(matches!(err, MediaServerError::SyncDisabled));
    }
}
