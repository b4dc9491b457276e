use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};

use crate::error::Error;

use super::AppState;

/// Email of the caller, taken from a verified session token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = header_token(parts)
            .or_else(|| query_token(parts))
            .ok_or_else(|| Error::InvalidToken("missing session token".to_string()))?;

        let email = state.sessions.verify(&token)?;
        Ok(AuthUser(email))
    }
}

fn header_token(parts: &Parts) -> Option<String> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn query_token(parts: &Parts) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri).ok()?;
    params.get("token").filter(|token| !token.is_empty()).cloned()
}
