use chrono::Utc;
use reqwest::Url;
use tracing::debug;

use crate::{
    Res,
    error::Error,
    types::{Credentials, SpotifyUser, TokenResponse},
};

use super::{ProviderAuth, ProviderRequest, SpotifyClient};

impl SpotifyClient {
    /// Builds the Spotify authorization URL the user is redirected to.
    ///
    /// The URL carries the configured client ID, scope and redirect URI,
    /// requests an authorization code (`response_type=code`) and embeds the
    /// CSRF `state` that the callback must echo back.
    ///
    /// # Arguments
    ///
    /// * `state` - Unpredictable nonce issued for this login attempt
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing:
    /// - `Ok(String)` - Fully encoded authorization URL
    /// - `Err(Error::Config)` - The configured authorization URL is not a valid URL
    ///
    /// # Example
    ///
    /// ```
    /// let url = spotify.authorize_url("q1w2e3")?;
    /// // https://accounts.spotify.com/authorize?client_id=...&state=q1w2e3
    /// ```
    pub fn authorize_url(&self, state: &str) -> Res<String> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| Error::Config(format!("SPOTIFY_API_AUTH_URL: {}", e)))?;

        Ok(url.to_string())
    }

    /// Exchanges an authorization code for access and refresh tokens.
    ///
    /// Completes the authorization-code flow by posting the code together
    /// with the registered redirect URI to the token endpoint. The client
    /// authenticates with HTTP Basic using its ID and secret.
    ///
    /// # Arguments
    ///
    /// * `code` - Authorization code received on the OAuth callback
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing:
    /// - `Ok(Credentials)` - Tokens stamped with the current time
    /// - `Err(Error::Upstream)` - Network failure or non-2xx answer (e.g. `invalid_grant`)
    /// - `Err(Error::Decode)` - The response body is not a token response
    ///
    /// # Security Note
    ///
    /// The authorization code is single-use and expires quickly (typically
    /// 10 minutes), so the exchange happens straight from the callback.
    pub async fn exchange_code(&self, code: &str) -> Res<Credentials> {
        let form = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
        ];

        let response: TokenResponse = self
            .send(ProviderRequest::post_form(
                &self.config.token_url,
                form,
                self.client_auth(),
            ))
            .await?;

        debug!(expires_in = response.expires_in, "authorization code exchanged");
        Ok(Credentials::from_response(response, Utc::now()))
    }

    /// Refreshes an access token using a refresh token.
    ///
    /// # Arguments
    ///
    /// * `refresh_token` - Refresh token stored with the user's profile
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing:
    /// - `Ok(Credentials)` - New access token stamped with the current time
    /// - `Err(Error::Upstream)` - Network failure, revoked or invalid refresh token
    /// - `Err(Error::Decode)` - The response body is not a token response
    ///
    /// # Token Rotation
    ///
    /// Spotify may or may not rotate the refresh token. When the response
    /// carries none, the returned credentials have an empty `refresh_token`
    /// and the caller must keep the previous value
    /// (see [`Credentials::merge_refreshed`]).
    pub async fn refresh_token(&self, refresh_token: &str) -> Res<Credentials> {
        let form = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
        ];

        let response: TokenResponse = self
            .send(ProviderRequest::post_form(
                &self.config.token_url,
                form,
                self.client_auth(),
            ))
            .await?;

        debug!(
            rotated = response.refresh_token.is_some(),
            "access token refreshed"
        );
        Ok(Credentials::from_response(response, Utc::now()))
    }

    /// Fetches the current user's Spotify profile.
    ///
    /// # Arguments
    ///
    /// * `access_token` - Access token of the user whose profile is requested
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing:
    /// - `Ok(SpotifyUser)` - Profile as returned by `GET /me`
    /// - `Err(Error::Upstream)` - Network failure or non-2xx answer
    /// - `Err(Error::Decode)` - The response body is not a user object
    pub async fn get_profile(&self, access_token: &str) -> Res<SpotifyUser> {
        self.send(ProviderRequest::get(
            self.api_url("/me"),
            ProviderAuth::Bearer(access_token.to_string()),
        ))
        .await
    }

    fn client_auth(&self) -> ProviderAuth {
        ProviderAuth::Basic {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
        }
    }
}
