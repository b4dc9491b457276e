use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{NaiveDate, NaiveTime};
use rand::{Rng, distr::Alphanumeric};

use crate::{
    Res,
    error::Error,
    types::{TimeRange, TopKind},
};

const STATE_LENGTH: usize = 32;

pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let raw = format!("{}:{}", client_id, client_secret);
    format!("Basic {}", STANDARD.encode(raw))
}

/// Unknown or missing values fall back to `medium_term`.
pub fn parse_time_range(value: Option<&str>) -> TimeRange {
    match value {
        Some("short_term") => TimeRange::ShortTerm,
        Some("long_term") => TimeRange::LongTerm,
        _ => TimeRange::MediumTerm,
    }
}

/// Unknown or missing values fall back to `tracks`.
pub fn parse_top_kind(value: Option<&str>) -> TopKind {
    match value {
        Some("artists") => TopKind::Artists,
        _ => TopKind::Tracks,
    }
}

/// Converts a `YYYY-MM-DD` date into unix milliseconds at midnight UTC.
pub fn date_to_millis(date: &str) -> Res<i64> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("invalid date '{}': {}", date, e)))?;
    Ok(day.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

pub fn validate_limit(limit: u32, max: u32) -> Res<u32> {
    if limit == 0 || limit > max {
        return Err(Error::Validation(format!(
            "limit must be between 1 and {}, got {}",
            max, limit
        )));
    }
    Ok(limit)
}

pub fn append_token(target: &str, token: &str) -> String {
    let separator = if target.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", target, separator, token)
}
