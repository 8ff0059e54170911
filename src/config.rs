//! Configuration management for spotharvest.
//!
//! All settings come from environment variables. Before anything else runs,
//! [`load_env`] merges the `.env` file from the local data directory into
//! the process environment, so the lookup order is:
//! 1. Environment variables already set (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Built-in defaults (only for the enrichment settings)
//!
//! Spotify settings are read lazily by the functions in this module. The
//! enrichment settings are gathered once into an [`EnrichConfig`].

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

pub const DEFAULT_MONTHLY_LIMIT: u64 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_THROTTLE_MILLIS: u64 = 1000;
pub const DEFAULT_RAPIDAPI_HOST: &str = "track-analysis.p.rapidapi.com";
pub const DEFAULT_RAPIDAPI_URL: &str = "https://track-analysis.p.rapidapi.com/pktx/spotify";
pub const DEFAULT_PROVIDER: &str = "rapidapi";
pub const DEFAULT_TRACK_BUCKET: &str = "spotify-audio-features";
pub const DEFAULT_USAGE_BUCKET: &str = "spotify-rapidapi-tracker";
pub const DEFAULT_TOP_TRACKS_LIMIT: u32 = 25;
pub const DEFAULT_TOP_TRACKS_TIME_RANGE: &str = "short_term";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Loads environment variables from the `.env` file in the local data directory.
///
/// The file is looked up in:
/// - Linux: `~/.local/share/spotharvest/.env`
/// - macOS: `~/Library/Application Support/spotharvest/.env`
/// - Windows: `%LOCALAPPDATA%/spotharvest/.env`
///
/// The directory is created if needed. A missing `.env` file is fine, the
/// settings may come from the environment directly; a file that exists but
/// cannot be parsed is an error.
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotharvest/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Address the local OAuth callback server binds to, e.g. `127.0.0.1:8888`.
pub fn server_addr() -> Result<String, ConfigError> {
    required("SERVER_ADDRESS")
}

/// Client ID of the registered Spotify application.
///
/// The PKCE flow does not need the client secret, so none is read.
pub fn spotify_client_id() -> Result<String, ConfigError> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Redirect URI; must match the one registered with Spotify and point at
/// the `/callback` route of the local server.
pub fn spotify_redirect_uri() -> Result<String, ConfigError> {
    required("SPOTIFY_API_REDIRECT_URI")
}

/// Requested OAuth scope. Reading top tracks only needs `user-top-read`.
pub fn spotify_scope() -> String {
    env::var("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|_| "user-top-read".to_string())
}

/// e.g. `https://accounts.spotify.com/authorize`
pub fn spotify_apiauth_url() -> Result<String, ConfigError> {
    required("SPOTIFY_API_AUTH_URL")
}

/// e.g. `https://api.spotify.com/v1`
pub fn spotify_apiurl() -> Result<String, ConfigError> {
    required("SPOTIFY_API_URL")
}

/// e.g. `https://accounts.spotify.com/api/token`
pub fn spotify_apitoken_url() -> Result<String, ConfigError> {
    required("SPOTIFY_API_TOKEN_URL")
}

/// Settings for the enrichment pipeline: metrics API access, quota,
/// throttling and where the blobs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
    pub api_key: String,
    pub api_host: String,
    pub api_url: String,
    pub monthly_limit: u64,
    pub request_timeout: Duration,
    pub throttle: Duration,
    pub provider: String,
    pub store_root: PathBuf,
    pub track_bucket: String,
    pub usage_bucket: String,
    pub top_tracks_limit: u32,
    pub top_tracks_time_range: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        let mut store_root = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        store_root.push("spotharvest/buckets");

        Self {
            api_key: String::new(),
            api_host: DEFAULT_RAPIDAPI_HOST.to_string(),
            api_url: DEFAULT_RAPIDAPI_URL.to_string(),
            monthly_limit: DEFAULT_MONTHLY_LIMIT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MILLIS),
            provider: DEFAULT_PROVIDER.to_string(),
            store_root,
            track_bucket: DEFAULT_TRACK_BUCKET.to_string(),
            usage_bucket: DEFAULT_USAGE_BUCKET.to_string(),
            top_tracks_limit: DEFAULT_TOP_TRACKS_LIMIT,
            top_tracks_time_range: DEFAULT_TOP_TRACKS_TIME_RANGE.to_string(),
        }
    }
}

impl EnrichConfig {
    /// Reads every enrichment setting from the environment, falling back to
    /// the defaults. `RAPIDAPI_KEY` may be empty here; commands that call
    /// the metrics API check it with [`EnrichConfig::require_api_key`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`EnrichConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str, default: String| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };

        Ok(Self {
            api_key: text("RAPIDAPI_KEY", defaults.api_key),
            api_host: text("RAPIDAPI_HOST", defaults.api_host),
            api_url: text("RAPIDAPI_URL", defaults.api_url)
                .trim_end_matches('/')
                .to_string(),
            monthly_limit: parsed(&lookup, "MONTHLY_LIMIT", defaults.monthly_limit)?,
            request_timeout: Duration::from_secs(parsed(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            throttle: Duration::from_millis(parsed(
                &lookup,
                "THROTTLE_MILLIS",
                DEFAULT_THROTTLE_MILLIS,
            )?),
            provider: text("USAGE_PROVIDER", defaults.provider),
            store_root: lookup("STORE_ROOT")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.store_root),
            track_bucket: text("TRACK_BUCKET", defaults.track_bucket),
            usage_bucket: text("USAGE_BUCKET", defaults.usage_bucket),
            top_tracks_limit: parsed(&lookup, "TOP_TRACKS_LIMIT", defaults.top_tracks_limit)?,
            top_tracks_time_range: text("TOP_TRACKS_TIME_RANGE", defaults.top_tracks_time_range),
        })
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("RAPIDAPI_KEY"));
        }
        Ok(&self.api_key)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                name,
                value: value.clone(),
            })
        }
        _ => Ok(default),
    }
}
