//! Configuration management for the Spotify listening-data service.
//!
//! This module handles loading configuration values from environment variables
//! and `.env` files and turns them into a single [`Config`] value that the
//! composition root in `main` owns and hands to every service. Nothing in the
//! crate reads the environment after start-up.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults (where applicable)

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::{Res, error::Error};

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_SCOPE: &str = concat!(
    "user-read-email user-read-private user-top-read ",
    "user-read-recently-played playlist-read-private"
);
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_STATE_COOKIE: &str = "spotify_auth_state";
const DEFAULT_REDIRECT: &str = "/api/v1/spotify/profile";
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_STATE_TTL_SECS: u64 = 600;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Spotify application registration and endpoint locations.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub spotify: SpotifyConfig,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub state_cookie_name: String,
    pub state_ttl: Duration,
    pub default_redirect: String,
    /// Origins a login may redirect to; empty allows any target.
    pub allowed_redirect_origins: Vec<String>,
    pub http_timeout: Duration,
    pub redis_url: Option<String>,
    pub profile_store_path: PathBuf,
}

/// Loads environment variables from `.env` files.
///
/// Looks for a `.env` file in the platform-specific local data directory under
/// `sporlapi/.env` first and then in the current working directory. Missing
/// files are not an error: a deployed service usually gets its configuration
/// straight from the process environment.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/sporlapi/.env`
/// - macOS: `~/Library/Application Support/sporlapi/.env`
/// - Windows: `%LOCALAPPDATA%/sporlapi/.env`
///
/// # Errors
///
/// Returns [`Error::Config`] if a `.env` file exists but cannot be parsed.
///
/// # Example
///
/// ```
/// use sporlapi::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Res<()> {
    let mut path = data_dir();
    path.push(".env");

    if async_fs::metadata(&path).await.is_ok() {
        dotenv::from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    }

    match dotenv::dotenv() {
        Ok(_) => Ok(()),
        Err(dotenv::Error::Io(_)) => Ok(()),
        Err(e) => Err(Error::Config(e.to_string())),
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// # Required Variables
    ///
    /// - `SPOTIFY_API_AUTH_CLIENT_ID` - client ID from the Spotify developer dashboard
    /// - `SPOTIFY_API_AUTH_CLIENT_SECRET` - matching client secret
    /// - `SPOTIFY_API_REDIRECT_URI` - callback URL registered with Spotify
    /// - `SESSION_SECRET` - shared secret used to sign session tokens
    ///
    /// Every other variable (`SERVER_ADDRESS`, `SPOTIFY_API_*_URL`, `SESSION_TTL_SECS`,
    /// `STATE_COOKIE_NAME`, `STATE_TTL_SECS`, `DEFAULT_REDIRECT`, `ALLOWED_REDIRECT_ORIGINS`,
    /// `HTTP_TIMEOUT_SECS`, `REDIS_URL`, `PROFILE_STORE_PATH`) has a default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing or malformed variable.
    ///
    /// # Security Note
    ///
    /// The client secret and session secret should be kept confidential and
    /// never exposed in logs or version control.
    pub fn from_env() -> Res<Self> {
        let server_addr = optional("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS);
        let server_addr = SocketAddr::from_str(&server_addr)
            .map_err(|e| Error::Config(format!("SERVER_ADDRESS '{}': {}", server_addr, e)))?;

        let spotify = SpotifyConfig {
            client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            client_secret: required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
            redirect_uri: required("SPOTIFY_API_REDIRECT_URI")?,
            scope: optional("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
            auth_url: optional("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: optional("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: optional("SPOTIFY_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
        };

        let profile_store_path = match env::var("PROFILE_STORE_PATH") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => data_dir().join("profiles.json"),
        };

        Ok(Self {
            server_addr,
            spotify,
            session_secret: required("SESSION_SECRET")?,
            session_ttl: seconds("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            state_cookie_name: optional("STATE_COOKIE_NAME", DEFAULT_STATE_COOKIE),
            state_ttl: seconds("STATE_TTL_SECS", DEFAULT_STATE_TTL_SECS)?,
            default_redirect: optional("DEFAULT_REDIRECT", DEFAULT_REDIRECT),
            allowed_redirect_origins: list("ALLOWED_REDIRECT_ORIGINS"),
            http_timeout: seconds("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            profile_store_path,
        })
    }
}

fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporlapi");
    path
}

fn required(name: &str) -> Res<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{} must be set", name))),
    }
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Comma-separated values, trimmed, without trailing slashes.
fn list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|value| {
            value
                .split(',')
                .map(|item| item.trim().trim_end_matches('/').to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn seconds(name: &str, default: u64) -> Res<Duration> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| Error::Config(format!("{} '{}': {}", name, value, e))),
        _ => Ok(Duration::from_secs(default)),
    }
}
