//! Catalog entries (AniList media records)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Media format category reported by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaFormat {
    Tv,
    TvShort,
    Movie,
    Special,
    Ova,
    Ona,
    Music,
    /// Any format this build does not know about
    #[serde(other)]
    Unknown,
}

impl MediaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Tv => "TV",
            MediaFormat::TvShort => "TV_SHORT",
            MediaFormat::Movie => "MOVIE",
            MediaFormat::Special => "SPECIAL",
            MediaFormat::Ova => "OVA",
            MediaFormat::Ona => "ONA",
            MediaFormat::Music => "MUSIC",
            MediaFormat::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "TV" => MediaFormat::Tv,
            "TV_SHORT" => MediaFormat::TvShort,
            "MOVIE" => MediaFormat::Movie,
            "SPECIAL" => MediaFormat::Special,
            "OVA" => MediaFormat::Ova,
            "ONA" => MediaFormat::Ona,
            "MUSIC" => MediaFormat::Music,
            _ => MediaFormat::Unknown,
        })
    }
}

/// A single metadata record returned by the catalog
///
/// Only the titles, season year and format take part in match scoring; the
/// remaining fields are descriptive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog (AniList) identifier
    pub anilist_id: i64,
    /// Display title (romanized when available, else English)
    pub title: String,
    pub title_english: Option<String>,
    pub title_romaji: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub status: Option<String>,
    pub format: Option<MediaFormat>,
    pub episodes: Option<i32>,
    /// Episode duration in minutes
    pub duration: Option<i32>,
    pub season: Option<String>,
    pub season_year: Option<i32>,
    pub genres: Vec<String>,
    pub average_score: Option<f64>,
    pub popularity: Option<i64>,
}

impl CatalogEntry {
    /// Minimal entry with only an id and a romanized title
    pub fn new(anilist_id: i64, title_romaji: impl Into<String>) -> Self {
        let title_romaji = title_romaji.into();
        Self {
            anilist_id,
            title: title_romaji.clone(),
            title_english: None,
            title_romaji: Some(title_romaji),
            description: None,
            cover_image: None,
            banner_image: None,
            status: None,
            format: None,
            episodes: None,
            duration: None,
            season: None,
            season_year: None,
            genres: Vec::new(),
            average_score: None,
            popularity: None,
        }
    }

    pub fn with_english(mut self, title: impl Into<String>) -> Self {
        self.title_english = Some(title.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.season_year = Some(year);
        self
    }

    pub fn with_format(mut self, format: MediaFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// English and romanized titles that are present and non-empty
    pub fn known_titles(&self) -> impl Iterator<Item = &str> {
        [self.title_english.as_deref(), self.title_romaji.as_deref()]
            .into_iter()
            .flatten()
            .filter(|t| !t.trim().is_empty())
    }
}
