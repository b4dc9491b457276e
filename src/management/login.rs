use std::sync::Arc;

use reqwest::Url;
use tracing::{info, warn};

use crate::{
    Res,
    error::Error,
    spotify::SpotifyClient,
    storage::ProfileStore,
    types::Profile,
    utils,
};

use super::{SessionIssuer, StateStore};

pub struct LoginStart {
    pub state: String,
    pub authorize_url: String,
}

pub struct LoginOutcome {
    pub profile: Profile,
    pub token: String,
    pub redirect_to: String,
}

/// Drives one login attempt from the Spotify redirect to a signed session token.
pub struct LoginFlow {
    states: StateStore,
    spotify: SpotifyClient,
    store: Arc<dyn ProfileStore>,
    sessions: Arc<SessionIssuer>,
    default_redirect: String,
    allowed_origins: Vec<String>,
}

impl LoginFlow {
    pub fn new(
        states: StateStore,
        spotify: SpotifyClient,
        store: Arc<dyn ProfileStore>,
        sessions: Arc<SessionIssuer>,
        default_redirect: String,
    ) -> Self {
        Self {
            states,
            spotify,
            store,
            sessions,
            default_redirect,
            allowed_origins: Vec::new(),
        }
    }

    /// Restricts absolute redirect targets to these origins (`scheme://host[:port]`).
    /// Paths on this service are always accepted.
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// The caller must also hand `state` to the browser in an HTTP-only cookie.
    pub async fn begin_login(&self, redirect: Option<&str>) -> Res<LoginStart> {
        let redirect = redirect.filter(|target| !target.is_empty());
        if let Some(target) = redirect {
            self.check_redirect(target)?;
        }
        let state = self.states.issue(redirect).await?;
        let authorize_url = self.spotify.authorize_url(&state)?;
        Ok(LoginStart {
            state,
            authorize_url,
        })
    }

    pub async fn complete_login(
        &self,
        code: &str,
        state: &str,
        cookie_state: Option<&str>,
    ) -> Res<LoginOutcome> {
        if state.is_empty() || cookie_state.is_some_and(|cookie| cookie != state) {
            warn!("login callback with mismatching state");
            return Err(Error::StateMismatch);
        }
        if code.is_empty() {
            return Err(Error::Validation("missing authorization code".to_string()));
        }

        // consumed up front so a replayed callback never reaches Spotify
        let target = self.states.consume(state).await?;

        let credentials = self.spotify.exchange_code(code).await?;
        let user = self.spotify.get_profile(&credentials.access_token).await?;
        let email = user
            .email
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| Error::Decode("Spotify profile has no email".to_string()))?;

        let profile = self
            .store
            .create_or_update_profile(Profile::new(email.clone(), user, credentials))
            .await?;
        let token = self.sessions.issue(&email)?;

        let redirect_to = utils::append_token(
            target.as_deref().unwrap_or(&self.default_redirect),
            &token,
        );

        info!(%email, first_login = profile.created_at == profile.updated_at, "user signed in");
        Ok(LoginOutcome {
            profile,
            token,
            redirect_to,
        })
    }

    fn check_redirect(&self, target: &str) -> Res<()> {
        if self.allowed_origins.is_empty() {
            return Ok(());
        }
        // "//host" and "/\host" are protocol-relative in browsers
        let local_path =
            target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\");
        if local_path {
            return Ok(());
        }

        let origin = Url::parse(target)
            .map(|url| url.origin().ascii_serialization())
            .map_err(|_| Error::Validation(format!("redirect '{}' is not a valid URL", target)))?;
        if self.allowed_origins.iter().any(|allowed| *allowed == origin) {
            Ok(())
        } else {
            warn!(%origin, "login redirect to foreign origin refused");
            Err(Error::Validation(format!(
                "redirect origin '{}' is not allowed",
                origin
            )))
        }
    }
}
