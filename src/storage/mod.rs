//! # Storage Module
//!
//! Capability interfaces for the two pieces of external state the service
//! depends on, together with one implementation per backing technology.
//!
//! ## Interfaces
//!
//! - [`Cache`] - short-lived key/value entries with an optional time-to-live.
//!   Used for CSRF login state, which must be visible to every instance of
//!   the service, so production deployments back it with Redis.
//! - [`ProfileStore`] - one document per user, keyed by email, holding the
//!   Spotify profile together with the user's provider credentials.
//!
//! ## Implementations
//!
//! | Interface      | Type              | Backing                      |
//! |----------------|-------------------|------------------------------|
//! | `Cache`        | [`RedisCache`]    | Redis via a `bb8` pool       |
//! | `Cache`        | [`MemoryCache`]   | process memory (single node) |
//! | `ProfileStore` | [`JsonFileStore`] | JSON document on disk        |
//! | `ProfileStore` | [`MemoryStore`]   | process memory               |
//!
//! Every implementation applies the same write rules through
//! [`merge_profile`] and [`apply_credentials`], so the timestamps and the
//! refresh-token carry-over behave identically whichever store is wired in.

mod file;
mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Res,
    types::{Credentials, Profile},
};

pub use file::JsonFileStore;
pub use memory::{MemoryCache, MemoryStore};
pub use redis::RedisCache;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Res<Option<String>>;

    /// `None` keeps the entry until it is cleared.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Res<()>;

    async fn clear(&self, key: &str) -> Res<()>;

    /// Reads and removes an entry. Backends with an atomic primitive override this.
    async fn take(&self, key: &str) -> Res<Option<String>> {
        let value = self.get(key).await?;
        if value.is_some() {
            self.clear(key).await?;
        }
        Ok(value)
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn create_or_update_profile(&self, profile: Profile) -> Res<Profile>;

    async fn get_profile_with_email(&self, email: &str) -> Res<Option<Profile>>;

    /// Fails with `NotFound` when no profile exists for `email`.
    async fn update_credentials(&self, email: &str, credentials: &Credentials) -> Res<Profile>;
}

/// Applies an incoming login to the stored document, if any.
///
/// A first write stamps `created_at` and `updated_at` with the same instant on
/// both the profile and its credentials. Later writes keep both `created_at`
/// values and move `updated_at` forward.
pub fn merge_profile(
    existing: Option<&Profile>,
    mut incoming: Profile,
    now: DateTime<Utc>,
) -> Profile {
    match existing {
        Some(current) => {
            incoming.created_at = current.created_at;
            incoming.credentials.created_at = current.credentials.created_at;
            if incoming.credentials.refresh_token.is_empty() {
                incoming.credentials.refresh_token = current.credentials.refresh_token.clone();
            }
        }
        None => {
            incoming.created_at = now;
            incoming.credentials.created_at = now;
        }
    }
    incoming.updated_at = now;
    incoming.credentials.updated_at = now;
    incoming
}

/// Overwrites the token fields of `profile`; an empty refresh token leaves the stored one.
pub fn apply_credentials(profile: &mut Profile, credentials: &Credentials, now: DateTime<Utc>) {
    let stored = &mut profile.credentials;
    stored.access_token = credentials.access_token.clone();
    stored.token_type = credentials.token_type.clone();
    stored.scope = credentials.scope.clone();
    stored.expires_in = credentials.expires_in;
    if !credentials.refresh_token.is_empty() {
        stored.refresh_token = credentials.refresh_token.clone();
    }
    stored.updated_at = now;
    profile.updated_at = now;
}
