use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::{Res, error::Error, storage::Cache, utils};

const STATE_PREFIX: &str = "state:";

/// Single-use CSRF nonces for the login redirect, kept in the shared cache.
#[derive(Clone)]
pub struct StateStore {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl StateStore {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub async fn issue(&self, redirect: Option<&str>) -> Res<String> {
        let nonce = utils::generate_state();
        // an empty value marks "no redirect target" so that every issued nonce has an entry
        self.cache
            .set(&Self::key(&nonce), redirect.unwrap_or_default(), Some(self.ttl))
            .await?;
        debug!(has_redirect = redirect.is_some(), "login state issued");
        Ok(nonce)
    }

    pub async fn consume(&self, nonce: &str) -> Res<Option<String>> {
        match self.cache.take(&Self::key(nonce)).await? {
            None => Err(Error::NotFound("unknown or already used login state".to_string())),
            Some(target) if target.is_empty() => Ok(None),
            Some(target) => Ok(Some(target)),
        }
    }

    fn key(nonce: &str) -> String {
        format!("{}{}", STATE_PREFIX, nonce)
    }
}
