//! Score & rank engine.
//!
//! Both write paths (the per-answer minor reward and the end-of-match
//! settlement) go through [`ProfileStore::add_points`], an atomic
//! increment at the store, so two sessions on the same account cannot
//! overwrite each other's updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::arena::{ArenaTable, ArenaTier};
use crate::error::StoreError;
use crate::traits::{clamp_points, PointsUpdate, ProfileStore};

/// A move between arena tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TierTransition {
    Promoted { from: String, to: String },
    Demoted { from: String, to: String },
}

/// Rank-change notification produced by a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankChange {
    pub won: bool,
    /// Signed change actually applied to the stored points.
    pub amount: i64,
    pub points_before: u32,
    pub points_after: u32,
    /// Name of the tier the profile is in after settlement.
    pub tier: String,
    pub transition: Option<TierTransition>,
    pub settled_at: DateTime<Utc>,
}

/// Points gained or lost for a match outcome, from the tier held before it.
pub fn settlement_delta(table: &ArenaTable, points_before: u32, won: bool) -> i64 {
    let tier = table.tier_for(points_before);
    if won {
        i64::from(tier.win_bonus)
    } else {
        -i64::from(tier.lose_penalty)
    }
}

/// Tier transition between two point totals, if they fall in different tiers.
pub fn transition_between(table: &ArenaTable, before: u32, after: u32) -> Option<TierTransition> {
    let (from_rank, to_rank) = (table.rank_of(before), table.rank_of(after));
    let from = table.tiers()[from_rank].name.clone();
    let to = table.tiers()[to_rank].name.clone();
    match to_rank.cmp(&from_rank) {
        std::cmp::Ordering::Greater => Some(TierTransition::Promoted { from, to }),
        std::cmp::Ordering::Less => Some(TierTransition::Demoted { from, to }),
        std::cmp::Ordering::Equal => None,
    }
}

/// The settlement a given snapshot would produce, without touching a store.
pub fn plan_settlement(table: &ArenaTable, points_before: u32, won: bool) -> RankChange {
    let delta = settlement_delta(table, points_before, won);
    let points_after = clamp_points(points_before, delta);
    rank_change(table, won, points_before, points_after)
}

fn rank_change(table: &ArenaTable, won: bool, before: u32, after: u32) -> RankChange {
    RankChange {
        won,
        amount: i64::from(after) - i64::from(before),
        points_before: before,
        points_after: after,
        tier: table.tier_for(after).name.clone(),
        transition: transition_between(table, before, after),
        settled_at: Utc::now(),
    }
}

/// Converts match events into persistent rank changes.
#[derive(Clone)]
pub struct RankEngine {
    store: Arc<dyn ProfileStore>,
    table: Arc<ArenaTable>,
    minor_reward: u32,
}

impl RankEngine {
    pub fn new(store: Arc<dyn ProfileStore>, table: Arc<ArenaTable>, minor_reward: u32) -> Self {
        Self {
            store,
            table,
            minor_reward,
        }
    }

    pub fn table(&self) -> &ArenaTable {
        &self.table
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    pub fn minor_reward(&self) -> u32 {
        self.minor_reward
    }

    /// Credit the per-answer reward. No tier notification is produced.
    pub async fn grant_minor_reward(&self, account_id: &str) -> Result<PointsUpdate, StoreError> {
        let update = self
            .store
            .add_points(account_id, i64::from(self.minor_reward))
            .await
            .inspect_err(|e| tracing::warn!(account_id, "minor reward failed: {e}"))?;
        tracing::debug!(account_id, after = update.after, "minor reward granted");
        Ok(update)
    }

    /// Take back a minor reward credited for an answer that was never committed.
    pub async fn revoke_minor_reward(
        &self,
        account_id: &str,
        amount: u32,
    ) -> Result<PointsUpdate, StoreError> {
        let update = self
            .store
            .add_points(account_id, -i64::from(amount))
            .await
            .inspect_err(|e| tracing::warn!(account_id, "reward revoke failed: {e}"))?;
        tracing::debug!(account_id, after = update.after, "minor reward revoked");
        Ok(update)
    }

    /// Apply the win bonus or loss penalty of the tier held before the match.
    pub async fn settle(&self, account_id: &str, won: bool) -> Result<RankChange, StoreError> {
        let points_before = self
            .store
            .get_points(account_id)
            .await
            .inspect_err(|e| tracing::warn!(account_id, "settlement read failed: {e}"))?;
        let delta = settlement_delta(&self.table, points_before, won);
        let update = self
            .store
            .add_points(account_id, delta)
            .await
            .inspect_err(|e| tracing::warn!(account_id, "settlement write failed: {e}"))?;

        let change = rank_change(&self.table, won, update.before, update.after);
        tracing::info!(
            account_id,
            won,
            amount = change.amount,
            points = change.points_after,
            tier = %change.tier,
            "match settled"
        );
        Ok(change)
    }

    /// Current points and tier for an account.
    pub async fn standing(&self, account_id: &str) -> Result<(u32, &ArenaTier), StoreError> {
        let points = self.store.get_points(account_id).await?;
        Ok((points, self.table.tier_for(points)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::RankProfile;

    /// Minimal in-memory store for engine tests.
    #[derive(Default)]
    struct TestStore {
        points: Mutex<HashMap<String, u32>>,
        fail_writes: bool,
    }

    impl TestStore {
        fn with(account: &str, points: u32) -> Self {
            let store = Self::default();
            store.points.lock().unwrap().insert(account.into(), points);
            store
        }
    }

    #[async_trait]
    impl ProfileStore for TestStore {
        fn name(&self) -> &str {
            "test"
        }

        async fn create_profile(&self, account_id: &str) -> Result<RankProfile, StoreError> {
            let mut points = self.points.lock().unwrap();
            let value = *points.entry(account_id.into()).or_insert(0);
            Ok(RankProfile {
                points: value,
                ..RankProfile::new(account_id)
            })
        }

        async fn get_points(&self, account_id: &str) -> Result<u32, StoreError> {
            self.points
                .lock()
                .unwrap()
                .get(account_id)
                .copied()
                .ok_or_else(|| StoreError::UnknownAccount(account_id.into()))
        }

        async fn set_points(&self, account_id: &str, points: u32) -> Result<(), StoreError> {
            self.points.lock().unwrap().insert(account_id.into(), points);
            Ok(())
        }

        async fn add_points(&self, account_id: &str, delta: i64) -> Result<PointsUpdate, StoreError> {
            if self.fail_writes {
                return Err(StoreError::Unavailable("writes disabled".into()));
            }
            let mut points = self.points.lock().unwrap();
            let entry = points
                .get_mut(account_id)
                .ok_or_else(|| StoreError::UnknownAccount(account_id.into()))?;
            let before = *entry;
            *entry = clamp_points(before, delta);
            Ok(PointsUpdate {
                before,
                after: *entry,
            })
        }

        async fn top(&self, _limit: usize) -> Result<Vec<RankProfile>, StoreError> {
            Ok(vec![])
        }
    }

    fn bronze_silver() -> Arc<ArenaTable> {
        Arc::new(
            ArenaTable::new(vec![
                ArenaTier::new("Bronze", 0, 100, 10),
                ArenaTier::new("Silver", 500, 50, 40),
            ])
            .unwrap(),
        )
    }

    fn engine(store: TestStore) -> (Arc<TestStore>, RankEngine) {
        let store = Arc::new(store);
        let engine = RankEngine::new(store.clone(), bronze_silver(), 2);
        (store, engine)
    }

    #[tokio::test]
    async fn win_across_boundary_promotes() {
        let (store, engine) = engine(TestStore::with("ada", 480));

        let change = engine.settle("ada", true).await.unwrap();
        assert_eq!(change.points_before, 480);
        assert_eq!(change.points_after, 580);
        assert_eq!(change.amount, 100);
        assert_eq!(change.tier, "Silver");
        assert_eq!(
            change.transition,
            Some(TierTransition::Promoted {
                from: "Bronze".into(),
                to: "Silver".into()
            })
        );
        assert_eq!(store.get_points("ada").await.unwrap(), 580);
    }

    #[tokio::test]
    async fn loss_across_boundary_demotes() {
        let (_, engine) = engine(TestStore::with("ada", 520));

        let change = engine.settle("ada", false).await.unwrap();
        assert_eq!(change.points_after, 480);
        assert_eq!(change.amount, -40);
        assert_eq!(
            change.transition,
            Some(TierTransition::Demoted {
                from: "Silver".into(),
                to: "Bronze".into()
            })
        );
    }

    #[tokio::test]
    async fn loss_clamps_at_zero() {
        let (_, engine) = engine(TestStore::with("ada", 4));

        let change = engine.settle("ada", false).await.unwrap();
        assert_eq!(change.points_after, 0);
        assert_eq!(change.amount, -4);
        assert!(change.transition.is_none());
    }

    #[tokio::test]
    async fn minor_reward_adds_without_notification() {
        let (store, engine) = engine(TestStore::with("ada", 499));

        let update = engine.grant_minor_reward("ada").await.unwrap();
        assert_eq!(update, PointsUpdate { before: 499, after: 501 });
        assert_eq!(store.get_points("ada").await.unwrap(), 501);

        let (points, tier) = engine.standing("ada").await.unwrap();
        assert_eq!(points, 501);
        assert_eq!(tier.name, "Silver");
    }

    #[tokio::test]
    async fn failed_write_leaves_points() {
        let (store, engine) = engine(TestStore {
            fail_writes: true,
            ..TestStore::with("ada", 300)
        });

        assert!(engine.settle("ada", true).await.is_err());
        assert!(engine.grant_minor_reward("ada").await.is_err());
        assert_eq!(store.get_points("ada").await.unwrap(), 300);
    }

    #[tokio::test]
    async fn unknown_account_surfaces() {
        let (_, engine) = engine(TestStore::default());
        assert!(matches!(
            engine.settle("ghost", true).await,
            Err(StoreError::UnknownAccount(_))
        ));
    }

    #[test]
    fn plan_is_repeatable() {
        let table = bronze_silver();
        for points in [0, 10, 480, 499, 500, 900] {
            for won in [true, false] {
                let a = plan_settlement(&table, points, won);
                let b = plan_settlement(&table, points, won);
                assert_eq!(a.amount, b.amount);
                assert_eq!(a.points_after, b.points_after);
                assert_eq!(a.transition, b.transition);
            }
        }
    }

    #[test]
    fn delta_uses_tier_before_match() {
        let table = bronze_silver();
        assert_eq!(settlement_delta(&table, 480, true), 100);
        assert_eq!(settlement_delta(&table, 500, true), 50);
        assert_eq!(settlement_delta(&table, 500, false), -40);
    }

    #[test]
    fn transition_serializes_with_kind() {
        let json = serde_json::to_string(&TierTransition::Promoted {
            from: "Bronze".into(),
            to: "Silver".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"promoted","from":"Bronze","to":"Silver"}"#);
    }
}
