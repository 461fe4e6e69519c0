//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use awl_server::models::{CatalogEntry, LocalShow, MediaFormat};
use awl_server::services::{
    CatalogError, CatalogQuery, CatalogSearch, MediaLibrary, MediaServerError,
};
use std::collections::HashSet;
use std::sync::Mutex;

/// In-memory catalog
///
/// A search returns the entries whose English or romanized title contains
/// the search term (case-insensitive), restricted to the query's season year
/// when one is given, most popular first. Every query is recorded.
#[derive(Default)]
pub struct FakeCatalog {
    entries: Vec<CatalogEntry>,
    rate_limited_terms: HashSet<String>,
    failing_terms: HashSet<String>,
    queries: Mutex<Vec<CatalogQuery>>,
}

impl FakeCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Searches for exactly this term are refused with a rate-limit error
    pub fn rate_limit_term(mut self, term: &str) -> Self {
        self.rate_limited_terms.insert(term.to_string());
        self
    }

    /// Searches for exactly this term fail with a network error
    pub fn fail_term(mut self, term: &str) -> Self {
        self.failing_terms.insert(term.to_string());
        self
    }

    pub fn queries(&self) -> Vec<CatalogQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn search_terms(&self) -> Vec<String> {
        self.queries()
            .into_iter()
            .filter_map(|q| q.search)
            .collect()
    }
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.queries.lock().unwrap().push(query.clone());

        let term = query.search.clone().unwrap_or_default();
        if self.rate_limited_terms.contains(&term) {
            return Err(CatalogError::RateLimited);
        }
        if self.failing_terms.contains(&term) {
            return Err(CatalogError::Network("connection reset".to_string()));
        }

        let needle = term.to_lowercase();
        let mut results: Vec<CatalogEntry> = self
            .entries
            .iter()
            .filter(|e| {
                e.known_titles()
                    .any(|t| t.to_lowercase().contains(needle.as_str()))
            })
            .filter(|e| query.season_year.map_or(true, |y| e.season_year == Some(y)))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        results.truncate(query.per_page as usize);
        Ok(results)
    }

    async fn get_by_id(&self, anilist_id: i64) -> Result<Option<CatalogEntry>, CatalogError> {
        Ok(self
            .entries
            .iter()
            .find(|e| e.anilist_id == anilist_id)
            .cloned())
    }
}

/// Media library returning a fixed inventory
pub struct FakeLibrary {
    shows: Vec<LocalShow>,
    enabled: bool,
}

impl FakeLibrary {
    pub fn new(shows: Vec<LocalShow>) -> Self {
        Self {
            shows,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            shows: Vec::new(),
            enabled: false,
        }
    }
}

#[async_trait]
impl MediaLibrary for FakeLibrary {
    async fn fetch_shows(&self) -> Result<Vec<LocalShow>, MediaServerError> {
        if !self.enabled {
            return Err(MediaServerError::SyncDisabled);
        }
        Ok(self.shows.clone())
    }
}

fn entry(
    id: i64,
    romaji: &str,
    english: Option<&str>,
    year: i32,
    format: MediaFormat,
    popularity: i64,
) -> CatalogEntry {
    let mut entry = CatalogEntry::new(id, romaji)
        .with_year(year)
        .with_format(format);
    entry.title_english = english.map(str::to_string);
    entry.popularity = Some(popularity);
    entry
}

/// A small catalog of well-known titles
pub fn sample_catalog() -> Vec<CatalogEntry> {
    vec![
        entry(16498, "Shingeki no Kyojin", Some("Attack on Titan"), 2013, MediaFormat::Tv, 900_000),
        entry(457, "Mushishi", Some("Mushi-Shi"), 2005, MediaFormat::Tv, 150_000),
        entry(1, "Cowboy Bebop", Some("Cowboy Bebop"), 1998, MediaFormat::Tv, 400_000),
        entry(356, "Fate/stay night", Some("Fate/stay night"), 2006, MediaFormat::Tv, 120_000),
        entry(47, "Akira", Some("Akira"), 1988, MediaFormat::Movie, 200_000),
        entry(20954, "Koe no Katachi", Some("A Silent Voice"), 2016, MediaFormat::Movie, 500_000),
        entry(154587, "Sousou no Frieren", Some("Frieren: Beyond Journey's End"), 2023, MediaFormat::Tv, 600_000),
    ]
}
