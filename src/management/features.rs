use std::sync::Arc;

use tracing::debug;

use crate::{
    Res,
    error::Error,
    spotify::SpotifyClient,
    types::{AudioFeatureVector, AudioFeatures, TimeRange},
};

use super::TokenManager;

/// Number of top tracks the personal feature vector is computed over.
pub const TOP_TRACKS_SAMPLE: u32 = 50;

/// Summarises a user's listening as the mean audio features of their top tracks.
pub struct AggregationEngine {
    tokens: Arc<TokenManager>,
    spotify: SpotifyClient,
}

impl AggregationEngine {
    pub fn new(tokens: Arc<TokenManager>, spotify: SpotifyClient) -> Self {
        Self { tokens, spotify }
    }

    /// Computes the mean audio feature vector of the user's top tracks.
    ///
    /// # Arguments
    ///
    /// * `email` - Profile whose credentials are used
    /// * `time_range` - Affinity window for the top tracks
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing:
    /// - `Ok(AudioFeatureVector)` - Means over every track Spotify analysed
    /// - `Err(Error::EmptyResult)` - No top tracks, or none of them analysed
    /// - `Err(Error::NotFound)` - No profile stored for `email`
    /// - `Err(Error::Upstream)` - Spotify refused one of the calls
    pub async fn personal_audio_features(
        &self,
        email: &str,
        time_range: TimeRange,
    ) -> Res<AudioFeatureVector> {
        let credentials = self.tokens.get_valid_credentials(email).await?;
        let token = credentials.access_token.as_str();

        let tracks = self
            .spotify
            .top_tracks(token, time_range, TOP_TRACKS_SAMPLE)
            .await?;
        if tracks.is_empty() {
            debug!(%email, %time_range, "no top tracks to aggregate");
            return Err(Error::EmptyResult);
        }

        let ids: Vec<String> = tracks.into_iter().map(|track| track.id).collect();
        let features = self.spotify.audio_features(token, &ids).await?;
        debug!(%email, tracks = ids.len(), analysed = features.len(), "aggregating audio features");

        average_features(&features)
    }
}

/// Averages a set of audio feature records component by component.
///
/// `time_signature` is an integer average: the sum divided by the count,
/// truncated toward zero.
pub fn average_features(features: &[AudioFeatures]) -> Res<AudioFeatureVector> {
    if features.is_empty() {
        return Err(Error::EmptyResult);
    }

    let mut sum = AudioFeatureVector::default();
    for f in features {
        sum.danceability += f.danceability;
        sum.energy += f.energy;
        sum.loudness += f.loudness;
        sum.speechiness += f.speechiness;
        sum.acousticness += f.acousticness;
        sum.instrumentalness += f.instrumentalness;
        sum.liveness += f.liveness;
        sum.valence += f.valence;
        sum.tempo += f.tempo;
        sum.time_signature += f.time_signature;
    }

    let n = features.len() as f64;
    Ok(AudioFeatureVector {
        danceability: sum.danceability / n,
        energy: sum.energy / n,
        loudness: sum.loudness / n,
        speechiness: sum.speechiness / n,
        acousticness: sum.acousticness / n,
        instrumentalness: sum.instrumentalness / n,
        liveness: sum.liveness / n,
        valence: sum.valence / n,
        tempo: sum.tempo / n,
        time_signature: sum.time_signature / features.len() as i64,
    })
}
