use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Res,
    error::Error,
    spotify::personal::PlayedCursor,
    types::{AudioFeatureVector, AudioFeatures, PublicProfile},
    utils,
};

use super::{AppState, AuthUser};

const MAX_LIMIT: u32 = 50;
const DEFAULT_RECENT_LIMIT: u32 = 20;
const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct RecentlyPlayedParams {
    pub limit: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub time_range: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AudioFeaturesParams {
    pub timespan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackIdsParams {
    pub ids: Option<String>,
}

pub async fn profile(
    State(app): State<AppState>,
    AuthUser(email): AuthUser,
) -> Res<Json<PublicProfile>> {
    let profile = app.personal.profile(&email).await?;
    Ok(Json(profile.into()))
}

pub async fn recently_played(
    State(app): State<AppState>,
    AuthUser(email): AuthUser,
    Query(params): Query<RecentlyPlayedParams>,
) -> Res<Json<Value>> {
    let limit = match params.limit.as_deref().filter(|v| !v.is_empty()) {
        Some(raw) => {
            let limit = raw
                .parse::<u32>()
                .map_err(|_| Error::Validation(format!("limit '{}' is not a number", raw)))?;
            utils::validate_limit(limit, MAX_LIMIT)?
        }
        None => DEFAULT_RECENT_LIMIT,
    };

    // Spotify accepts a single cursor, before wins
    let cursor = match (non_empty(params.before), non_empty(params.after)) {
        (Some(before), _) => Some(PlayedCursor::Before(utils::date_to_millis(&before)?)),
        (None, Some(after)) => Some(PlayedCursor::After(utils::date_to_millis(&after)?)),
        (None, None) => None,
    };

    let body = app.personal.recently_played(&email, limit, cursor).await?;
    Ok(Json(body))
}

pub async fn top(
    State(app): State<AppState>,
    AuthUser(email): AuthUser,
    Query(params): Query<TopParams>,
) -> Res<Json<Value>> {
    let kind = utils::parse_top_kind(params.kind.as_deref());
    let time_range = utils::parse_time_range(params.time_range.as_deref());
    let limit = utils::validate_limit(lenient(params.limit, DEFAULT_PAGE_LIMIT), MAX_LIMIT)?;
    let offset = lenient(params.offset, 0);

    let body = app
        .personal
        .top(&email, kind, time_range, limit, offset)
        .await?;
    Ok(Json(body))
}

pub async fn playlists(
    State(app): State<AppState>,
    AuthUser(email): AuthUser,
    Query(params): Query<PageParams>,
) -> Res<Json<Value>> {
    let limit = utils::validate_limit(lenient(params.limit, DEFAULT_PAGE_LIMIT), MAX_LIMIT)?;
    let offset = lenient(params.offset, 0);

    let body = app.personal.playlists(&email, limit, offset).await?;
    Ok(Json(body))
}

pub async fn audio_features(
    State(app): State<AppState>,
    AuthUser(email): AuthUser,
    Query(params): Query<AudioFeaturesParams>,
) -> Res<Json<AudioFeatureVector>> {
    let time_range = utils::parse_time_range(params.timespan.as_deref());
    let vector = app
        .features
        .personal_audio_features(&email, time_range)
        .await?;
    Ok(Json(vector))
}

pub async fn tracks_audio_features(
    State(app): State<AppState>,
    AuthUser(email): AuthUser,
    Query(params): Query<TrackIdsParams>,
) -> Res<Json<Vec<AudioFeatures>>> {
    let ids: Vec<String> = params
        .ids
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect();

    let features = app.personal.tracks_audio_features(&email, &ids).await?;
    Ok(Json(features))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Unparseable values fall back to `default`.
fn lenient(value: Option<String>, default: u32) -> u32 {
    value
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}
