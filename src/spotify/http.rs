use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Method, StatusCode,
    header::{ACCEPT, AUTHORIZATION},
};

use crate::{Res, error::Error, utils};

#[derive(Debug, Clone)]
pub enum ProviderAuth {
    Basic {
        client_id: String,
        client_secret: String,
    },
    Bearer(String),
}

impl ProviderAuth {
    pub fn header_value(&self) -> String {
        match self {
            ProviderAuth::Basic {
                client_id,
                client_secret,
            } => utils::basic_auth_header(client_id, client_secret),
            ProviderAuth::Bearer(token) => format!("Bearer {}", token),
        }
    }
}

/// A single outbound call to Spotify. A `form` body is sent as
/// `application/x-www-form-urlencoded`, otherwise JSON is requested.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub method: Method,
    pub url: String,
    pub form: Option<Vec<(String, String)>>,
    pub auth: ProviderAuth,
}

impl ProviderRequest {
    pub fn get(url: impl Into<String>, auth: ProviderAuth) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            form: None,
            auth,
        }
    }

    pub fn post_form(
        url: impl Into<String>,
        form: Vec<(String, String)>,
        auth: ProviderAuth,
    ) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            form: Some(form),
            auth,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Transport used for every Spotify call. Only transport failures are
/// errors here; HTTP status handling belongs to the caller.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, request: ProviderRequest) -> Res<ProviderResponse>;
}

pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Res<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn request(&self, request: ProviderRequest) -> Res<ProviderResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .header(AUTHORIZATION, request.auth.header_value());

        builder = match &request.form {
            Some(form) => builder.form(form),
            None => builder.header(ACCEPT, "application/json"),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        Ok(ProviderResponse { status, body })
    }
}
