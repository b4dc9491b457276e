use std::sync::Arc;

use serde_json::Value;

use crate::{
    Res,
    error::Error,
    spotify::{SpotifyClient, personal::PlayedCursor},
    storage::ProfileStore,
    types::{AudioFeatures, Profile, TimeRange, TopKind},
};

use super::TokenManager;

/// Proxies the read-only personal endpoints on behalf of a signed-in user.
pub struct PersonalInfo {
    tokens: Arc<TokenManager>,
    spotify: SpotifyClient,
    store: Arc<dyn ProfileStore>,
}

impl PersonalInfo {
    pub fn new(
        tokens: Arc<TokenManager>,
        spotify: SpotifyClient,
        store: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            tokens,
            spotify,
            store,
        }
    }

    pub async fn profile(&self, email: &str) -> Res<Profile> {
        self.store
            .get_profile_with_email(email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no profile for {}", email)))
    }

    pub async fn recently_played(
        &self,
        email: &str,
        limit: u32,
        cursor: Option<PlayedCursor>,
    ) -> Res<Value> {
        let token = self.access_token(email).await?;
        self.spotify.recently_played(&token, limit, cursor).await
    }

    pub async fn top(
        &self,
        email: &str,
        kind: TopKind,
        time_range: TimeRange,
        limit: u32,
        offset: u32,
    ) -> Res<Value> {
        let token = self.access_token(email).await?;
        self.spotify
            .top_items(&token, kind, time_range, limit, offset)
            .await
    }

    pub async fn playlists(&self, email: &str, limit: u32, offset: u32) -> Res<Value> {
        let token = self.access_token(email).await?;
        self.spotify.playlists(&token, limit, offset).await
    }

    pub async fn tracks_audio_features(
        &self,
        email: &str,
        ids: &[String],
    ) -> Res<Vec<AudioFeatures>> {
        if ids.is_empty() {
            return Err(Error::Validation("at least one track id expected".to_string()));
        }
        let token = self.access_token(email).await?;
        self.spotify.audio_features(&token, ids).await
    }

    async fn access_token(&self, email: &str) -> Res<String> {
        Ok(self.tokens.get_valid_credentials(email).await?.access_token)
    }
}
