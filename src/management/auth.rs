use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    Res,
    error::Error,
    spotify::SpotifyClient,
    storage::ProfileStore,
    types::{Credentials, Profile},
};

/// Credentials with this many seconds or fewer left are refreshed before use.
pub const REFRESH_THRESHOLD_SECS: i64 = 10;

/// Lifetime assumed when Spotify did not report `expires_in`.
pub const DEFAULT_LIFETIME_SECS: u64 = 3600;

pub fn remaining_lifetime(credentials: &Credentials, now: DateTime<Utc>) -> i64 {
    let lifetime = match credentials.expires_in {
        0 => DEFAULT_LIFETIME_SECS,
        secs => secs,
    };
    lifetime as i64 - (now - credentials.updated_at).num_seconds()
}

pub fn is_fresh(credentials: &Credentials, now: DateTime<Utc>) -> bool {
    remaining_lifetime(credentials, now) > REFRESH_THRESHOLD_SECS
}

/// Hands out usable Spotify credentials, refreshing them when they are about to expire.
pub struct TokenManager {
    store: Arc<dyn ProfileStore>,
    spotify: SpotifyClient,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn ProfileStore>, spotify: SpotifyClient) -> Self {
        Self {
            store,
            spotify,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_valid_credentials(&self, email: &str) -> Res<Credentials> {
        let profile = self.load(email).await?;
        if is_fresh(&profile.credentials, Utc::now()) {
            return Ok(profile.credentials);
        }

        // one refresh per email at a time within this process
        let lock = self.refresh_lock(email).await;
        let guard = lock.lock().await;

        let profile = self.load(email).await?;
        let result = if is_fresh(&profile.credentials, Utc::now()) {
            Ok(profile.credentials)
        } else {
            self.refresh(email, &profile).await
        };

        drop(guard);
        self.release_lock(email, lock).await;
        result
    }

    async fn refresh(&self, email: &str, profile: &Profile) -> Res<Credentials> {
        let refreshed = match self
            .spotify
            .refresh_token(&profile.credentials.refresh_token)
            .await
        {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(%email, error = %e, "credential refresh failed");
                return Err(e);
            }
        };

        let merged = profile.credentials.merge_refreshed(refreshed);
        let updated = self.store.update_credentials(email, &merged).await?;
        info!(%email, "credentials refreshed");
        Ok(updated.credentials)
    }

    async fn load(&self, email: &str) -> Res<Profile> {
        if email.is_empty() {
            return Err(Error::Validation("email expected".to_string()));
        }
        self.store
            .get_profile_with_email(email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no profile for {}", email)))
    }

    async fn refresh_lock(&self, email: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        Arc::clone(locks.entry(email.to_string()).or_default())
    }

    async fn release_lock(&self, email: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.refresh_locks.lock().await;
        // map entry + ours: nobody else is waiting
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(email);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn credentials(expires_in: u64, age_secs: i64) -> Credentials {
        let updated_at = Utc::now() - Duration::seconds(age_secs);
        Credentials {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            token_type: "Bearer".into(),
            scope: String::new(),
            expires_in,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn test_remaining_lifetime_uses_reported_expiry() {
        let creds = credentials(1800, 100);
        let remaining = remaining_lifetime(&creds, creds.updated_at + Duration::seconds(100));
        assert_eq!(remaining, 1700);
    }

    #[test]
    fn test_missing_expiry_defaults_to_an_hour() {
        let creds = credentials(0, 0);
        assert_eq!(remaining_lifetime(&creds, creds.updated_at), 3600);
    }

    #[test]
    fn test_threshold_boundary() {
        let creds = credentials(3600, 0);
        assert!(is_fresh(&creds, creds.updated_at + Duration::seconds(3589)));
        assert!(!is_fresh(&creds, creds.updated_at + Duration::seconds(3590)));
    }
}
