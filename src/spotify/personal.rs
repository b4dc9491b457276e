use serde_json::Value;

use crate::{
    Res,
    types::{AudioFeatures, AudioFeaturesResponse, TimeRange, TopKind, TopTracksResponse, Track},
};

use super::{ProviderAuth, ProviderRequest, SpotifyClient};

/// Maximum number of ids `GET /audio-features` accepts per request.
pub const AUDIO_FEATURES_BATCH: usize = 100;

/// Pagination cursor for recently played tracks, in unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayedCursor {
    Before(i64),
    After(i64),
}

impl SpotifyClient {
    /// Retrieves the user's top artists or tracks.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token
    /// * `kind` - Whether to rank tracks or artists
    /// * `time_range` - Affinity window (`short_term`, `medium_term`, `long_term`)
    /// * `limit` - Number of items (1-50)
    /// * `offset` - Index of the first item
    ///
    /// # Returns
    ///
    /// The Spotify paging object, unchanged.
    pub async fn top_items(
        &self,
        token: &str,
        kind: TopKind,
        time_range: TimeRange,
        limit: u32,
        offset: u32,
    ) -> Res<Value> {
        let url = self.api_url(&format!(
            "/me/top/{kind}?limit={limit}&offset={offset}&time_range={time_range}"
        ));
        self.send(ProviderRequest::get(url, bearer(token))).await
    }

    /// Retrieves the user's top tracks as typed records, preserving rank order.
    pub async fn top_tracks(
        &self,
        token: &str,
        time_range: TimeRange,
        limit: u32,
    ) -> Res<Vec<Track>> {
        let url = self.api_url(&format!(
            "/me/top/tracks?limit={limit}&offset=0&time_range={time_range}"
        ));
        let response: TopTracksResponse = self
            .send(ProviderRequest::get(url, bearer(token)))
            .await?;
        Ok(response.items)
    }

    /// Retrieves tracks from the user's recently played history.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token
    /// * `limit` - Number of items (1-50)
    /// * `cursor` - Optional `before`/`after` boundary; Spotify accepts only one
    ///
    /// # Returns
    ///
    /// The Spotify cursor-paging object, unchanged.
    pub async fn recently_played(
        &self,
        token: &str,
        limit: u32,
        cursor: Option<PlayedCursor>,
    ) -> Res<Value> {
        let mut path = format!("/me/player/recently-played?limit={limit}");
        match cursor {
            Some(PlayedCursor::Before(ms)) => path.push_str(&format!("&before={ms}")),
            Some(PlayedCursor::After(ms)) => path.push_str(&format!("&after={ms}")),
            None => {}
        }
        self.send(ProviderRequest::get(self.api_url(&path), bearer(token)))
            .await
    }

    /// Retrieves playlists owned or followed by the user.
    pub async fn playlists(&self, token: &str, limit: u32, offset: u32) -> Res<Value> {
        let url = self.api_url(&format!("/me/playlists?limit={limit}&offset={offset}"));
        self.send(ProviderRequest::get(url, bearer(token))).await
    }

    /// Retrieves audio features for several tracks.
    ///
    /// Ids are sent in batches of [`AUDIO_FEATURES_BATCH`] and the results are
    /// concatenated in request order. Tracks Spotify has no analysis for come
    /// back as `null` and are skipped.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token
    /// * `ids` - Spotify track ids
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing:
    /// - `Ok(Vec<AudioFeatures>)` - One record per analysed track (empty for no ids)
    /// - `Err(Error::Upstream)` - A batch request failed
    /// - `Err(Error::Decode)` - A batch response was malformed
    pub async fn audio_features(&self, token: &str, ids: &[String]) -> Res<Vec<AudioFeatures>> {
        let mut features = Vec::with_capacity(ids.len());

        for batch in ids.chunks(AUDIO_FEATURES_BATCH) {
            let url = self.api_url(&format!("/audio-features?ids={}", batch.join(",")));
            let response: AudioFeaturesResponse =
                self.send(ProviderRequest::get(url, bearer(token))).await?;
            features.extend(response.audio_features.into_iter().flatten());
        }

        Ok(features)
    }
}

fn bearer(token: &str) -> ProviderAuth {
    ProviderAuth::Bearer(token.to_string())
}
