//! # Spotify Integration Module
//!
//! This module is the only place that talks to Spotify. It wraps the accounts
//! service (authorization and token endpoints) and the Web API endpoints the
//! service proxies or aggregates, and hides URL building, authentication
//! headers, status handling and JSON decoding behind [`SpotifyClient`].
//!
//! ## Architecture
//!
//! ```text
//! HTTP handlers (api)
//!          ↓
//! Services (management: login flow, token lifecycle, aggregation)
//!          ↓
//! SpotifyClient
//!     ├── Accounts (authorize URL, code exchange, refresh)
//!     └── Web API (profile, top items, recently played, playlists, audio features)
//!          ↓
//! HttpClient (reqwest, bounded by a timeout)
//!          ↓
//! Spotify
//! ```
//!
//! ## Core Modules
//!
//! ### Accounts
//!
//! [`auth`] - The confidential-client authorization-code flow:
//! - **Authorize URL**: `client_id`, `scope`, `response_type=code`, `redirect_uri`
//!   and the CSRF `state`
//! - **Code Exchange**: `grant_type=authorization_code` with HTTP Basic client
//!   authentication
//! - **Refresh**: `grant_type=refresh_token`; the response may omit a new
//!   refresh token, in which case callers keep the previous one
//! - **Profile**: `GET /me` with the freshly issued access token
//!
//! ### Personal Data
//!
//! [`personal`] - Read-only user data:
//! - `GET /me/top/{tracks|artists}`
//! - `GET /me/player/recently-played`
//! - `GET /me/playlists`
//! - `GET /audio-features?ids=…`, batched at 100 ids per request
//!
//! ## Error Handling
//!
//! Every call maps failures onto the crate error taxonomy:
//! - **Transport failures and non-2xx responses** become
//!   [`Error::Upstream`](crate::error::Error::Upstream) carrying the status and
//!   the response text
//! - **Bodies that do not match the expected shape** become
//!   [`Error::Decode`](crate::error::Error::Decode)
//!
//! There is no retry or backoff; every failure is terminal for the request
//! that triggered it.
//!
//! ## Transport
//!
//! All requests go through the [`HttpClient`] capability so the composition
//! root decides the transport. [`ReqwestClient`] is the production
//! implementation and applies the configured request timeout to every call.

pub mod auth;
mod http;
pub mod personal;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{Res, config::SpotifyConfig, error::Error};

pub use http::{HttpClient, ProviderAuth, ProviderRequest, ProviderResponse, ReqwestClient};

#[derive(Clone)]
pub struct SpotifyClient {
    http: Arc<dyn HttpClient>,
    config: SpotifyConfig,
}

impl SpotifyClient {
    pub fn new(http: Arc<dyn HttpClient>, config: SpotifyConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: ProviderRequest) -> Res<T> {
        let body = self.send_raw(request).await?;
        serde_json::from_slice(&body).map_err(|e| Error::Decode(e.to_string()))
    }

    async fn send_raw(&self, request: ProviderRequest) -> Res<Vec<u8>> {
        let method = request.method.clone();
        let path = request
            .url
            .split('?')
            .next()
            .unwrap_or_default()
            .to_string();

        let response = self.http.request(request).await?;
        if !response.status.is_success() {
            let text = String::from_utf8_lossy(&response.body);
            warn!(%method, %path, status = response.status.as_u16(), "Spotify rejected request");
            return Err(Error::upstream(
                Some(response.status.as_u16()),
                format!("{} {} returned {}: {}", method, path, response.status, text.trim()),
            ));
        }

        Ok(response.body)
    }
}
