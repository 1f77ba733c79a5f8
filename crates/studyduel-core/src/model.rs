//! Core data model types for studyduel.
//!
//! Quiz items, the numeric rules of a duel, and the persistent rank profile.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question as supplied by a question source, before the pool assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    /// The text shown to the player.
    pub prompt: String,
    /// The accepted answer.
    pub expected_answer: String,
}

impl QuestionDraft {
    pub fn new(prompt: impl Into<String>, expected_answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            expected_answer: expected_answer.into(),
        }
    }
}

/// A quiz item held by a [`QuestionPool`](crate::pool::QuestionPool).
///
/// Immutable once loaded. Identity is the `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    /// Pool-assigned identifier, unique within the pool.
    pub id: u32,
    /// The text shown to the player.
    pub prompt: String,
    /// The accepted answer.
    pub expected_answer: String,
}

impl QuestionItem {
    /// Case-insensitive, whitespace-trimmed exact comparison.
    pub fn accepts(&self, answer: &str) -> bool {
        answer.trim().to_lowercase() == self.expected_answer.trim().to_lowercase()
    }
}

/// A named collection of questions for one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    /// Unique identifier for this set.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Subject the questions belong to (e.g. "biology").
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

/// Numeric rules of a duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelRules {
    /// Starting hit points of each king.
    pub king_hp_start: u32,
    /// Starting hit points of each tower.
    pub tower_hp_start: u32,
    /// Energy at the start of a match.
    pub energy_start: u32,
    /// Maximum energy.
    pub energy_cap: u32,
    /// Energy required to draw a question, spent when it is answered.
    pub draw_cost: u32,
    /// Damage dealt to the opponent by a correct answer.
    pub attack_damage: u32,
    /// Damage taken by the player on an incorrect answer.
    pub defense_damage: u32,
    /// Damage of an opponent hit on the player's tower.
    pub opponent_tower_damage: u32,
    /// Damage of an opponent hit on the player's king.
    pub opponent_king_damage: u32,
    /// Chance that the opponent hits a standing tower.
    pub p_tower_hit: f64,
    /// Chance that the opponent hits the king once the tower is down.
    pub p_king_hit: f64,
    /// Energy regained after each opponent turn.
    pub energy_recharge: u32,
    /// Rank points granted for each correct answer.
    pub minor_reward: u32,
    /// Opponent "thinking" delay in milliseconds.
    pub think_delay_ms: u64,
}

impl Default for DuelRules {
    fn default() -> Self {
        Self {
            king_hp_start: 100,
            tower_hp_start: 50,
            energy_start: 3,
            energy_cap: 5,
            draw_cost: 1,
            attack_damage: 15,
            defense_damage: 10,
            opponent_tower_damage: 10,
            opponent_king_damage: 5,
            p_tower_hit: 0.6,
            p_king_hit: 0.5,
            energy_recharge: 1,
            minor_reward: 2,
            think_delay_ms: 1500,
        }
    }
}

impl DuelRules {
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }

    /// Reject rule sets that would make a match unplayable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.draw_cost >= 1, "draw_cost must be at least 1");
        anyhow::ensure!(
            self.energy_start <= self.energy_cap,
            "energy_start ({}) exceeds energy_cap ({})",
            self.energy_start,
            self.energy_cap
        );
        anyhow::ensure!(self.king_hp_start >= 1, "king_hp_start must be at least 1");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.p_tower_hit),
            "p_tower_hit must be between 0.0 and 1.0"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.p_king_hit),
            "p_king_hit must be between 0.0 and 1.0"
        );
        Ok(())
    }
}

/// Persistent, account-scoped rank points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankProfile {
    pub account_id: String,
    pub points: u32,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl RankProfile {
    /// A fresh profile, as created alongside a new account.
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            points: 0,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(answer: &str) -> QuestionItem {
        QuestionItem {
            id: 1,
            prompt: "Powerhouse of the cell?".into(),
            expected_answer: answer.into(),
        }
    }

    #[test]
    fn answer_comparison_ignores_case_and_padding() {
        let q = item("Mitochondria");
        assert!(q.accepts("mitochondria"));
        assert!(q.accepts("  MITOCHONDRIA \n"));
        assert!(!q.accepts("mitochondrion"));
        assert!(!q.accepts(""));
    }

    #[test]
    fn answer_comparison_is_exact_inside() {
        let q = item("New York");
        assert!(q.accepts("new york"));
        assert!(!q.accepts("newyork"));
        assert!(!q.accepts("new  york"));
    }

    #[test]
    fn default_rules_are_valid() {
        let rules = DuelRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.think_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn invalid_rules_rejected() {
        let rules = DuelRules {
            energy_start: 9,
            energy_cap: 5,
            ..Default::default()
        };
        assert!(rules.validate().is_err());

        let rules = DuelRules {
            p_king_hit: 1.5,
            ..Default::default()
        };
        assert!(rules.validate().is_err());

        let rules = DuelRules {
            draw_cost: 0,
            ..Default::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn rules_fill_defaults_from_partial_toml() {
        let rules: DuelRules = toml::from_str("attack_damage = 40\nthink_delay_ms = 0").unwrap();
        assert_eq!(rules.attack_damage, 40);
        assert_eq!(rules.think_delay_ms, 0);
        assert_eq!(rules.king_hp_start, 100);
    }

    #[test]
    fn new_profile_starts_at_zero() {
        let profile = RankProfile::new("ada");
        assert_eq!(profile.points, 0);
        assert_eq!(profile.account_id, "ada");
    }
}
