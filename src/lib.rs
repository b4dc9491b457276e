//! Spotify Listening Data Service Library
//!
//! This library signs users in with Spotify's authorization-code flow, keeps
//! their provider credentials fresh, issues its own session tokens and serves
//! personal listening data, including a statistical summary of the audio
//! features of a user's top tracks.
//!
//! # Modules
//!
//! - `api` - HTTP handlers and the session-token extractor
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy and its HTTP rendering
//! - `management` - Login flow, token lifecycle, aggregation and data services
//! - `server` - Service wiring, router and HTTP server
//! - `spotify` - Spotify accounts and Web API client
//! - `storage` - Cache and profile store interfaces and implementations
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use sporlapi::{config::{self, Config}, server, storage, spotify::ReqwestClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> sporlapi::Res<()> {
//!     config::load_env().await?;
//!     let config = Config::from_env()?;
//!     let state = server::build_state(
//!         &config,
//!         Arc::new(storage::MemoryCache::new()),
//!         Arc::new(storage::JsonFileStore::new(config.profile_store_path.clone())),
//!         Arc::new(ReqwestClient::new(config.http_timeout)?),
//!     );
//!     server::start_api_server(&config, state).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod storage;
pub mod types;
pub mod utils;

pub use error::Error;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate reports an [`Error`], which carries
/// enough information to be rendered as an HTTP response at the API boundary.
///
/// # Type Parameters
///
/// - `T` - The success type returned on successful operations
///
/// # Example
///
/// ```
/// use sporlapi::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, error::Error>;
