//! # API Module
//!
//! HTTP handlers for the service, built on [Axum](https://docs.rs/axum).
//! Handlers stay thin: they pull parameters out of the request, call one of the
//! services in [`crate::management`] and let [`Error`](crate::error::Error)
//! render failures.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - Issues a CSRF state, stores it in an HTTP-only cookie and
//!   redirects the browser to Spotify's consent screen.
//! - [`callback`] - Completes the authorization-code flow, stores the profile,
//!   signs a session token and redirects with `token=<session>` appended.
//!
//! ### Personal Data
//!
//! Every handler below requires a session token, either in the
//! `Authorization` header (with or without a `Bearer ` prefix) or in a `token`
//! query parameter. See [`AuthUser`].
//!
//! - [`profile`] - The stored profile, without credentials
//! - [`recently_played`] - Recently played tracks
//! - [`top`] - Top tracks or artists
//! - [`playlists`] - The user's playlists
//! - [`audio_features`] - Mean audio features of the user's top tracks
//! - [`tracks_audio_features`] - Audio features for explicit track ids
//!
//! ### Monitoring
//!
//! - [`health`] - Liveness and version information.
//!
//! ## Error Responses
//!
//! Failures are returned as `{"error": {"code", "message"}}` with status 400
//! (bad parameters), 403 (state mismatch or missing/invalid session), 404
//! (unknown profile or login state) or 500 (Spotify or storage failure). An
//! aggregation over zero tracks answers `204 No Content`.

mod callback;
mod extract;
mod health;
mod personal;

use std::sync::Arc;

use crate::management::{AggregationEngine, LoginFlow, PersonalInfo, SessionIssuer};

pub use callback::{callback, login};
pub use extract::AuthUser;
pub use health::health;
pub use personal::{audio_features, playlists, profile, recently_played, top, tracks_audio_features};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub login: Arc<LoginFlow>,
    pub sessions: Arc<SessionIssuer>,
    pub personal: Arc<PersonalInfo>,
    pub features: Arc<AggregationEngine>,
    pub state_cookie_name: String,
}
