#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::Utc;
use serde_json::{Value, json};
use sporlapi::{
    api::AppState,
    config::{Config, SpotifyConfig},
    management::{
        AggregationEngine, LoginFlow, PersonalInfo, SessionIssuer, StateStore, TokenManager,
    },
    server,
    spotify::{ReqwestClient, SpotifyClient},
    storage::{MemoryCache, MemoryStore},
    types::{Credentials, Profile, SpotifyUser},
    utils,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

pub const SESSION_SECRET: &str = "integration_session_secret";
pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const AUTH_URL: &str = "https://accounts.example.com/authorize";

/// A mock Spotify plus in-memory collaborators, wired like the real service.
pub struct Harness {
    pub server: MockServer,
    pub config: Config,
    pub cache: Arc<MemoryCache>,
    pub store: Arc<MemoryStore>,
    pub sessions: Arc<SessionIssuer>,
}

impl Harness {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let config = config(&server.uri());
        let sessions = Arc::new(SessionIssuer::new(&config.session_secret, config.session_ttl));

        Self {
            server,
            config,
            cache: Arc::new(MemoryCache::new()),
            store: Arc::new(MemoryStore::new()),
            sessions,
        }
    }

    pub fn spotify(&self) -> SpotifyClient {
        let http = ReqwestClient::new(self.config.http_timeout).unwrap();
        SpotifyClient::new(Arc::new(http), self.config.spotify.clone())
    }

    pub fn login_flow(&self) -> LoginFlow {
        LoginFlow::new(
            StateStore::new(self.cache.clone(), self.config.state_ttl),
            self.spotify(),
            self.store.clone(),
            Arc::clone(&self.sessions),
            self.config.default_redirect.clone(),
        )
        .with_allowed_origins(self.config.allowed_redirect_origins.clone())
    }

    pub fn token_manager(&self) -> Arc<TokenManager> {
        Arc::new(TokenManager::new(self.store.clone(), self.spotify()))
    }

    pub fn aggregation(&self) -> AggregationEngine {
        AggregationEngine::new(self.token_manager(), self.spotify())
    }

    pub fn personal(&self) -> PersonalInfo {
        PersonalInfo::new(self.token_manager(), self.spotify(), self.store.clone())
    }

    pub fn app_state(&self) -> AppState {
        let http = ReqwestClient::new(self.config.http_timeout).unwrap();
        server::build_state(
            &self.config,
            self.cache.clone(),
            self.store.clone(),
            Arc::new(http),
        )
    }

    /// Token endpoint answering an authorization-code exchange for `code`.
    pub async fn mount_code_exchange(&self, code: &str, access_token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(header("authorization", basic_auth().as_str()))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains(format!("code={}", code)))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
                access_token,
                Some("refresh-1"),
                3600,
            )))
            .mount(&self.server)
            .await;
    }

    /// `GET /me` answering for `access_token`.
    pub async fn mount_me(&self, access_token: &str, user: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(header("authorization", format!("Bearer {}", access_token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(user))
            .mount(&self.server)
            .await;
    }

    /// Stores a profile whose credentials were last written `age_secs` ago.
    pub async fn seed_profile(&self, email: &str, age_secs: i64) -> Profile {
        let profile = profile(email, credentials("access-1", "refresh-1", 3600, age_secs));
        self.store.insert(profile.clone()).await;
        profile
    }
}

pub fn config(server_uri: &str) -> Config {
    Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        spotify: SpotifyConfig {
            client_id: CLIENT_ID.to_string(),
            client_secret: CLIENT_SECRET.to_string(),
            redirect_uri: "http://localhost:8080/api/v1/spotify/callback".to_string(),
            scope: "user-read-email user-top-read".to_string(),
            auth_url: AUTH_URL.to_string(),
            token_url: format!("{}/api/token", server_uri),
            api_url: format!("{}/v1", server_uri),
        },
        session_secret: SESSION_SECRET.to_string(),
        session_ttl: Duration::from_secs(3600),
        state_cookie_name: "spotify_auth_state".to_string(),
        state_ttl: Duration::from_secs(600),
        default_redirect: "/api/v1/spotify/profile".to_string(),
        allowed_redirect_origins: Vec::new(),
        http_timeout: Duration::from_secs(5),
        redis_url: None,
        profile_store_path: PathBuf::from("profiles.json"),
    }
}

pub fn basic_auth() -> String {
    utils::basic_auth_header(CLIENT_ID, CLIENT_SECRET)
}

pub fn token_body(access_token: &str, refresh_token: Option<&str>, expires_in: u64) -> Value {
    let mut body = json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "scope": "user-read-email user-top-read",
        "expires_in": expires_in,
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    body
}

pub fn user_body(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "display_name": "Test User",
        "country": "DE",
        "product": "premium",
        "uri": format!("spotify:user:{}", id),
        "href": format!("https://api.spotify.com/v1/users/{}", id),
        "external_urls": { "spotify": format!("https://open.spotify.com/user/{}", id) },
        "followers": { "href": null, "total": 3 },
        "images": [],
    })
}

pub fn credentials(
    access_token: &str,
    refresh_token: &str,
    expires_in: u64,
    age_secs: i64,
) -> Credentials {
    let written = Utc::now() - chrono::Duration::seconds(age_secs);
    Credentials {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        token_type: "Bearer".to_string(),
        scope: "user-read-email user-top-read".to_string(),
        expires_in,
        created_at: written,
        updated_at: written,
    }
}

pub fn profile(email: &str, credentials: Credentials) -> Profile {
    let user = SpotifyUser {
        id: "user-a".to_string(),
        email: Some(email.to_string()),
        ..Default::default()
    };
    Profile::new(email.to_string(), user, credentials)
}

pub fn features_body(
    id: &str,
    danceability: f64,
    energy: f64,
    tempo: f64,
    time_signature: i64,
) -> Value {
    json!({
        "id": id,
        "danceability": danceability,
        "energy": energy,
        "key": 5,
        "loudness": -6.5,
        "mode": 1,
        "speechiness": 0.05,
        "acousticness": 0.1,
        "instrumentalness": 0.0,
        "liveness": 0.12,
        "valence": 0.5,
        "tempo": tempo,
        "duration_ms": 200000,
        "time_signature": time_signature,
        "type": "audio_features",
        "uri": format!("spotify:track:{}", id),
    })
}
