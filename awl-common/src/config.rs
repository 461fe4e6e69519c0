//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (applied by the binary after loading)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing configuration file is not fatal: a warning is logged and the
//! compiled defaults are used. A file that exists but cannot be parsed is a
//! configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default AniList GraphQL endpoint
pub const DEFAULT_CATALOG_URL: &str = "https://graphql.anilist.co";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// SQLite database location
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// External anime catalog (AniList)
    pub catalog: CatalogConfig,
    /// Personal media server (Plex)
    pub plex: PlexConfig,
    /// Cross-origin policy for the HTTP API
    pub cors: CorsConfig,
    /// Directory served as static files (optional)
    pub static_assets: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/anime.db"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Catalog client settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// GraphQL endpoint
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Minimum spacing between outbound catalog requests
    pub min_request_interval_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            timeout_secs: 30,
            min_request_interval_ms: 1000,
        }
    }
}

/// Plex media server settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PlexConfig {
    pub server_url: String,
    pub token: String,
    pub library_id: u32,
    pub sync_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a TOML file
    ///
    /// Returns compiled defaults (with a warning) when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve and load configuration
    ///
    /// Uses the explicit path when given, otherwise the per-user default
    /// location. Environment overrides are applied on top.
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::load(path)?,
            None => match default_config_path() {
                Some(path) => Self::load(&path)?,
                None => {
                    warn!("Could not determine config directory, using compiled defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply overrides from process environment variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    ///
    /// Empty values are ignored. Values that fail to parse as numbers or
    /// booleans keep the current setting.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT").and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(path) = get("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(level) = get("AWL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(url) = get("ANILIST_URL") {
            self.catalog.base_url = url;
        }
        if let Some(url) = get("PLEX_SERVER_URL") {
            self.plex.server_url = url;
        }
        if let Some(token) = get("PLEX_TOKEN") {
            self.plex.token = token;
        }
        if let Some(id) = get("PLEX_LIBRARY_ID").and_then(|v| v.trim().parse().ok()) {
            self.plex.library_id = id;
        }
        if let Some(enabled) = get("PLEX_SYNC_ENABLED").and_then(|v| parse_bool(&v)) {
            self.plex.sync_enabled = enabled;
        }
    }
}

/// Default configuration file location (`<config_dir>/awl/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("awl").join("config.toml"))
}

/// Parse the boolean spellings accepted in environment variables
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
