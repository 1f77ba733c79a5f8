//! Leaderboard read model.

use serde::{Deserialize, Serialize};

use crate::arena::ArenaTable;
use crate::error::StoreError;
use crate::traits::ProfileStore;

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based position.
    pub position: usize,
    pub account_id: String,
    pub points: u32,
    pub tier: String,
}

/// Top `limit` accounts by points, each with its arena tier.
pub async fn leaderboard(
    store: &dyn ProfileStore,
    table: &ArenaTable,
    limit: usize,
) -> Result<Vec<Standing>, StoreError> {
    let profiles = store.top(limit).await?;
    Ok(profiles
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, profile)| Standing {
            position: i + 1,
            tier: table.tier_for(profile.points).name.clone(),
            account_id: profile.account_id,
            points: profile.points,
        })
        .collect())
}
