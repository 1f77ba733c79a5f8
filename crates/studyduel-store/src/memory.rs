//! In-memory profile store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use studyduel_core::model::RankProfile;
use studyduel_core::traits::{clamp_points, rank_order, PointsUpdate, ProfileStore};

use crate::StoreError;

/// A profile store held in process memory.
///
/// Writes can be switched off to exercise persistence-failure paths.
#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, RankProfile>>,
    fail_writes: AtomicBool,
    writes: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the given profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = RankProfile>) -> Self {
        let store = Self::default();
        {
            let mut map = store.lock();
            for profile in profiles {
                map.insert(profile.account_id.clone(), profile);
            }
        }
        store
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RankProfile>> {
        // a poisoned map is still consistent: every write is a single insert
        self.profiles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_profile(&self, account_id: &str) -> Result<RankProfile, StoreError> {
        self.check_writable()?;
        let mut profiles = self.lock();
        if let Some(existing) = profiles.get(account_id) {
            return Ok(existing.clone());
        }
        let profile = RankProfile::new(account_id);
        profiles.insert(account_id.to_string(), profile.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(profile)
    }

    async fn get_points(&self, account_id: &str) -> Result<u32, StoreError> {
        self.lock()
            .get(account_id)
            .map(|p| p.points)
            .ok_or_else(|| StoreError::UnknownAccount(account_id.to_string()))
    }

    async fn set_points(&self, account_id: &str, points: u32) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut profiles = self.lock();
        let profile = profiles
            .get_mut(account_id)
            .ok_or_else(|| StoreError::UnknownAccount(account_id.to_string()))?;
        profile.points = points;
        profile.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_points(&self, account_id: &str, delta: i64) -> Result<PointsUpdate, StoreError> {
        self.check_writable()?;
        let mut profiles = self.lock();
        let profile = profiles
            .get_mut(account_id)
            .ok_or_else(|| StoreError::UnknownAccount(account_id.to_string()))?;
        let before = profile.points;
        profile.points = clamp_points(before, delta);
        profile.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(PointsUpdate {
            before,
            after: profile.points,
        })
    }

    async fn top(&self, limit: usize) -> Result<Vec<RankProfile>, StoreError> {
        let mut profiles: Vec<RankProfile> = self.lock().values().cloned().collect();
        rank_order(&mut profiles);
        profiles.truncate(limit);
        Ok(profiles)
    }
}
