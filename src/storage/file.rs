use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    Res,
    error::Error,
    types::{Credentials, Profile},
};

use super::{ProfileStore, apply_credentials, merge_profile};

type Documents = BTreeMap<String, Profile>;

/// [`ProfileStore`] persisting every profile, keyed by email, in one JSON document.
///
/// The document lives on the local disk, so the store serves a single
/// instance of the service. Writes go to `<file>.tmp` first and then replace
/// the document by rename.
pub struct JsonFileStore {
    path: PathBuf,
    // serialises read-modify-write cycles on the document
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn load(&self) -> Res<Documents> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Documents::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Documents::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("{}: {}", self.path.display(), e)))
    }

    async fn persist(&self, documents: &Documents) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(documents)
            .map_err(|e| Error::Storage(e.to_string()))?;

        // the document is replaced by rename, a failed write leaves the previous one intact
        let staging = self.staging_path();
        if let Err(e) = async_fs::write(&staging, json).await {
            let _ = async_fs::remove_file(&staging).await;
            return Err(e.into());
        }
        async_fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "profiles.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ProfileStore for JsonFileStore {
    async fn create_or_update_profile(&self, profile: Profile) -> Res<Profile> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;

        let merged = merge_profile(documents.get(&profile.email), profile, Utc::now());
        documents.insert(merged.email.clone(), merged.clone());
        self.persist(&documents).await?;

        Ok(merged)
    }

    async fn get_profile_with_email(&self, email: &str) -> Res<Option<Profile>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(email))
    }

    async fn update_credentials(&self, email: &str, credentials: &Credentials) -> Res<Profile> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;

        let profile = documents
            .get_mut(email)
            .ok_or_else(|| Error::NotFound(format!("no profile for {}", email)))?;
        apply_credentials(profile, credentials, Utc::now());
        let updated = profile.clone();

        self.persist(&documents).await?;
        Ok(updated)
    }
}
