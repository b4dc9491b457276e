use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use tracing::warn;

use crate::{Res, error::Error};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn login(
    State(app): State<AppState>,
    cookies: Cookies,
    Query(params): Query<LoginParams>,
) -> Res<Response> {
    let start = app.login.begin_login(params.redirect.as_deref()).await?;

    let cookie = Cookie::build((app.state_cookie_name.clone(), start.state))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .build();
    cookies.add(cookie);

    Ok(found(&start.authorize_url))
}

pub async fn callback(
    State(app): State<AppState>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
) -> Res<Response> {
    let cookie_state = cookies
        .get(&app.state_cookie_name)
        .map(|cookie| cookie.value().to_string());
    if cookie_state.is_some() {
        cookies.remove(
            Cookie::build((app.state_cookie_name.clone(), ""))
                .path("/")
                .build(),
        );
    }

    if let Some(reason) = params.error {
        warn!(%reason, "Spotify denied authorization");
        return Err(Error::Validation(format!("authorization denied: {}", reason)));
    }

    let outcome = app
        .login
        .complete_login(
            params.code.as_deref().unwrap_or_default(),
            params.state.as_deref().unwrap_or_default(),
            cookie_state.as_deref(),
        )
        .await?;

    Ok(found(&outcome.redirect_to))
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
