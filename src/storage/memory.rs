use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    Res,
    error::Error,
    types::{Credentials, Profile},
};

use super::{Cache, ProfileStore, apply_credentials, merge_profile};

/// In-process [`Cache`]. Entries are lost on restart and are not shared
/// between instances.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries
            .values()
            .filter(|(_, expires)| expires.is_none_or(|at| at > now))
            .count()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        let mut entries = self.entries.lock().await;
        let expired = matches!(entries.get(key), Some((_, Some(at))) if *at <= Instant::now());
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Res<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        // expired entries are dropped on every write
        entries.retain(|_, (_, expires)| expires.is_none_or(|at| at > now));
        entries.insert(key.to_string(), (value.to_string(), ttl.map(|ttl| now + ttl)));
        Ok(())
    }

    async fn clear(&self, key: &str) -> Res<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Res<Option<String>> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .remove(key)
            .filter(|(_, expires)| expires.is_none_or(|at| at > Instant::now()))
            .map(|(value, _)| value))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, Profile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `profile` as-is, bypassing the timestamp rules.
    pub async fn insert(&self, profile: Profile) {
        self.profiles
            .lock()
            .await
            .insert(profile.email.clone(), profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create_or_update_profile(&self, profile: Profile) -> Res<Profile> {
        let mut profiles = self.profiles.lock().await;
        let merged = merge_profile(profiles.get(&profile.email), profile, Utc::now());
        profiles.insert(merged.email.clone(), merged.clone());
        Ok(merged)
    }

    async fn get_profile_with_email(&self, email: &str) -> Res<Option<Profile>> {
        Ok(self.profiles.lock().await.get(email).cloned())
    }

    async fn update_credentials(&self, email: &str, credentials: &Credentials) -> Res<Profile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .get_mut(email)
            .ok_or_else(|| Error::NotFound(format!("no profile for {}", email)))?;
        apply_credentials(profile, credentials, Utc::now());
        Ok(profile.clone())
    }
}
