//! Arena tiers: named brackets of cumulative rank points.

use serde::{Deserialize, Serialize};

use crate::error::TierTableError;

/// One bracket of the arena ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaTier {
    pub name: String,
    /// Lowest point total that places a profile in this tier.
    pub min_points: u32,
    /// Points gained for a win while in this tier.
    pub win_bonus: u32,
    /// Points lost for a loss while in this tier.
    pub lose_penalty: u32,
}

impl ArenaTier {
    pub fn new(name: impl Into<String>, min_points: u32, win_bonus: u32, lose_penalty: u32) -> Self {
        Self {
            name: name.into(),
            min_points,
            win_bonus,
            lose_penalty,
        }
    }
}

/// Static tier ladder sorted ascending by `min_points`, starting at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArenaTable {
    tiers: Vec<ArenaTier>,
}

impl ArenaTable {
    /// Validate and wrap a tier list.
    pub fn new(tiers: Vec<ArenaTier>) -> Result<Self, TierTableError> {
        let Some(first) = tiers.first() else {
            return Err(TierTableError::Empty);
        };
        if first.min_points != 0 {
            return Err(TierTableError::FirstTierNotZero {
                name: first.name.clone(),
                min_points: first.min_points,
            });
        }
        for pair in tiers.windows(2) {
            if pair[1].min_points <= pair[0].min_points {
                return Err(TierTableError::NotAscending {
                    name: pair[1].name.clone(),
                    min_points: pair[1].min_points,
                    previous: pair[0].min_points,
                });
            }
        }
        for (i, tier) in tiers.iter().enumerate() {
            if tiers[..i].iter().any(|t| t.name == tier.name) {
                return Err(TierTableError::DuplicateName(tier.name.clone()));
            }
        }
        Ok(Self { tiers })
    }

    /// The default six-tier ladder.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                ArenaTier::new("Bronze", 0, 30, 10),
                ArenaTier::new("Silver", 500, 25, 15),
                ArenaTier::new("Gold", 1000, 20, 20),
                ArenaTier::new("Platinum", 2000, 15, 25),
                ArenaTier::new("Diamond", 3500, 10, 30),
                ArenaTier::new("Champion", 5000, 8, 35),
            ],
        }
    }

    pub fn tiers(&self) -> &[ArenaTier] {
        &self.tiers
    }

    /// Position of the tier that `points` falls into, 0 being the lowest.
    pub fn rank_of(&self, points: u32) -> usize {
        // tiers[0].min_points == 0, so at least one tier always qualifies
        self.tiers
            .partition_point(|tier| tier.min_points <= points)
            .saturating_sub(1)
    }

    /// The tier with the greatest `min_points <= points`.
    pub fn tier_for(&self, points: u32) -> &ArenaTier {
        &self.tiers[self.rank_of(points)]
    }

    /// The tier above the one `points` falls into, if any.
    pub fn next_tier(&self, points: u32) -> Option<&ArenaTier> {
        self.tiers.get(self.rank_of(points) + 1)
    }
}

impl Default for ArenaTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for ArenaTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tiers = Vec::<ArenaTier>::deserialize(deserializer)?;
        ArenaTable::new(tiers).map_err(serde::de::Error::custom)
    }
}
