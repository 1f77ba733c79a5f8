//! JSON file profile store.
//!
//! The whole document is rewritten on every change: serialized to a sibling
//! temp file, then renamed over the original so a crash mid-write never
//! leaves a truncated file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::instrument;

use studyduel_core::model::RankProfile;
use studyduel_core::traits::{clamp_points, rank_order, PointsUpdate, ProfileStore};

use crate::StoreError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    profiles: BTreeMap<String, RankProfile>,
}

/// Profiles persisted as a single JSON document on local disk.
pub struct JsonFileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<ProfileDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(ProfileDocument::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProfileDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, doc: &ProfileDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply `update` to one profile and persist the document.
    async fn modify<T>(
        &self,
        account_id: &str,
        update: impl FnOnce(&mut RankProfile) -> T,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;
        let profile = doc
            .profiles
            .get_mut(account_id)
            .ok_or_else(|| StoreError::UnknownAccount(account_id.to_string()))?;
        let out = update(profile);
        profile.updated_at = Utc::now();
        self.write(&doc).await?;
        Ok(out)
    }
}

#[async_trait]
impl ProfileStore for JsonFileStore {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn create_profile(&self, account_id: &str) -> Result<RankProfile, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;
        if let Some(existing) = doc.profiles.get(account_id) {
            return Ok(existing.clone());
        }
        let profile = RankProfile::new(account_id);
        doc.profiles.insert(account_id.to_string(), profile.clone());
        self.write(&doc).await?;
        tracing::debug!("created profile");
        Ok(profile)
    }

    async fn get_points(&self, account_id: &str) -> Result<u32, StoreError> {
        let _guard = self.lock.lock().await;
        self.read()
            .await?
            .profiles
            .get(account_id)
            .map(|p| p.points)
            .ok_or_else(|| StoreError::UnknownAccount(account_id.to_string()))
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn set_points(&self, account_id: &str, points: u32) -> Result<(), StoreError> {
        self.modify(account_id, |profile| profile.points = points).await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn add_points(&self, account_id: &str, delta: i64) -> Result<PointsUpdate, StoreError> {
        self.modify(account_id, |profile| {
            let before = profile.points;
            profile.points = clamp_points(before, delta);
            PointsUpdate {
                before,
                after: profile.points,
            }
        })
        .await
    }

    async fn top(&self, limit: usize) -> Result<Vec<RankProfile>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut profiles: Vec<RankProfile> = self.read().await?.profiles.into_values().collect();
        rank_order(&mut profiles);
        profiles.truncate(limit);
        Ok(profiles)
    }
}
