use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{Res, error::Error, types::SessionClaims};

/// Signs and verifies the service's own session tokens (HS256 over a shared secret).
///
/// A session token is independent of the Spotify credentials behind it: it
/// stays valid until its own expiry even after those credentials have been
/// refreshed or revoked.
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, email: &str) -> Res<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Config(format!("cannot sign session token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Res<String> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<SessionClaims>(token, &self.decoding, &validation)?.claims;

        if claims.email.trim().is_empty() {
            return Err(Error::InvalidToken("session token has no email".to_string()));
        }
        Ok(claims.email)
    }
}
