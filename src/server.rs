use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    Res,
    api::{self, AppState},
    config::Config,
    management::{
        AggregationEngine, LoginFlow, PersonalInfo, SessionIssuer, StateStore, TokenManager,
    },
    spotify::{HttpClient, SpotifyClient},
    storage::{Cache, ProfileStore},
};

/// Wires the services together from explicitly constructed collaborators.
pub fn build_state(
    config: &Config,
    cache: Arc<dyn Cache>,
    store: Arc<dyn ProfileStore>,
    http: Arc<dyn HttpClient>,
) -> AppState {
    let spotify = SpotifyClient::new(http, config.spotify.clone());
    let sessions = Arc::new(SessionIssuer::new(&config.session_secret, config.session_ttl));
    let tokens = Arc::new(TokenManager::new(Arc::clone(&store), spotify.clone()));

    let login = LoginFlow::new(
        StateStore::new(cache, config.state_ttl),
        spotify.clone(),
        Arc::clone(&store),
        Arc::clone(&sessions),
        config.default_redirect.clone(),
    )
    .with_allowed_origins(config.allowed_redirect_origins.clone());

    AppState {
        login: Arc::new(login),
        sessions,
        personal: Arc::new(PersonalInfo::new(Arc::clone(&tokens), spotify.clone(), store)),
        features: Arc::new(AggregationEngine::new(tokens, spotify)),
        state_cookie_name: config.state_cookie_name.clone(),
    }
}

pub fn router(state: AppState) -> Router {
    let spotify = Router::new()
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/profile", get(api::profile))
        .route("/recently_played", get(api::recently_played))
        .route("/top", get(api::top))
        .route("/playlists", get(api::playlists))
        .route("/audio_features", get(api::audio_features))
        .route("/tracks/audio_features", get(api::tracks_audio_features));

    Router::new()
        .route("/health", get(api::health))
        .nest("/api/v1/spotify", spotify)
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
}

pub async fn start_api_server(config: &Config, state: AppState) -> Res<()> {
    let listener = TcpListener::bind(config.server_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutting down"),
                Err(e) => {
                    warn!(error = %e, "cannot listen for Ctrl-C, serving until killed");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    Ok(())
}
