//! Opponent resolver: the probabilistic reaction after each player turn.
//!
//! The resolver is the only source of opponent damage and of energy
//! recharge. It never touches the opponent's own tower or king.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::duel::{strike, MatchState, MatchStatus, Strike};
use crate::error::DuelError;

/// What the opponent does on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentAction {
    /// Direct hit on the player's king (tower already down).
    KingHit,
    /// Hit on the player's standing tower.
    TowerHit,
    /// The attack misses.
    Miss,
}

/// Outcome of an applied opponent turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentReport {
    pub action: OpponentAction,
    pub strike: Strike,
    pub energy: u32,
    pub status: MatchStatus,
}

/// Roll the opponent's action for the current board.
pub fn roll<R: Rng + ?Sized>(state: &MatchState, rng: &mut R) -> OpponentAction {
    let rules = state.rules();
    let chance: f64 = rng.gen();
    let action = if state.player_tower_hp == 0 {
        if chance < rules.p_king_hit {
            OpponentAction::KingHit
        } else {
            OpponentAction::Miss
        }
    } else if chance < rules.p_tower_hit {
        OpponentAction::TowerHit
    } else {
        OpponentAction::Miss
    };
    tracing::debug!(match_id = %state.match_id(), ?action, chance, "opponent rolled");
    action
}

/// Apply a rolled action, recharge energy, and check for defeat.
pub fn apply(state: &mut MatchState, action: OpponentAction) -> Result<OpponentReport, DuelError> {
    if state.status != MatchStatus::Playing {
        return Err(DuelError::NotPlaying(state.status));
    }
    let rules = state.rules().clone();

    let strike = match action {
        OpponentAction::KingHit => {
            let damage = rules.opponent_king_damage.min(state.player_king_hp);
            state.player_king_hp -= damage;
            Strike {
                king_damage: damage,
                ..Strike::default()
            }
        }
        OpponentAction::TowerHit => strike(
            &mut state.player_tower_hp,
            &mut state.player_king_hp,
            rules.opponent_tower_damage,
        ),
        OpponentAction::Miss => Strike::default(),
    };

    state.energy = state
        .energy
        .saturating_add(rules.energy_recharge)
        .min(rules.energy_cap);

    if state.player_king_hp == 0 {
        state.status = MatchStatus::Lost;
    }

    Ok(OpponentReport {
        action,
        strike,
        energy: state.energy,
        status: state.status,
    })
}

/// The opponent's "thinking" delay, running as a cancellable task.
///
/// The task only marks time; the owning session applies the turn once it
/// has fired. Dropping the turn aborts the task.
#[derive(Debug)]
pub struct OpponentTurn {
    handle: JoinHandle<()>,
    fired: bool,
}

impl OpponentTurn {
    /// Start the delay on the current tokio runtime.
    pub fn schedule(delay: Duration) -> Self {
        let handle = tokio::spawn(tokio::time::sleep(delay));
        Self {
            handle,
            fired: false,
        }
    }

    /// Whether the delay has elapsed.
    pub fn is_ready(&self) -> bool {
        self.fired || self.handle.is_finished()
    }

    /// Wait for the delay to elapse.
    pub async fn ready(&mut self) {
        if !self.fired {
            // an aborted sleep has nothing to report
            let _ = (&mut self.handle).await;
            self.fired = true;
        }
    }

    /// Abort the pending delay.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for OpponentTurn {
    fn drop(&mut self) {
        if !self.is_ready() {
            tracing::warn!("opponent turn cancelled before it fired");
        }
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::model::{DuelRules, QuestionDraft};
    use crate::pool::QuestionPool;

    fn playing(rules: DuelRules) -> MatchState {
        let pool = QuestionPool::new(vec![QuestionDraft::new("1+1?", "2")]);
        let mut state = MatchState::new(rules, pool);
        state.start().unwrap();
        state
    }

    #[test]
    fn king_hit_can_lose_the_match() {
        let rules = DuelRules {
            king_hp_start: 5,
            tower_hp_start: 0,
            opponent_king_damage: 5,
            ..Default::default()
        };
        let mut state = playing(rules);

        let report = apply(&mut state, OpponentAction::KingHit).unwrap();
        assert_eq!(report.status, MatchStatus::Lost);
        assert_eq!(report.strike.king_damage, 5);
        assert_eq!(state.snapshot().player_king_hp, 0);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            state.request_question(&mut rng),
            Err(DuelError::NotPlaying(MatchStatus::Lost))
        ));
        assert!(matches!(
            apply(&mut state, OpponentAction::Miss),
            Err(DuelError::NotPlaying(MatchStatus::Lost))
        ));
        state.reset().unwrap();
        assert_eq!(state.status(), MatchStatus::Lobby);
    }

    #[test]
    fn tower_hit_overflows_into_king() {
        let rules = DuelRules {
            tower_hp_start: 4,
            opponent_tower_damage: 10,
            ..Default::default()
        };
        let mut state = playing(rules);

        let report = apply(&mut state, OpponentAction::TowerHit).unwrap();
        assert!(report.strike.tower_destroyed);
        let snap = state.snapshot();
        assert_eq!(snap.player_tower_hp, 0);
        assert_eq!(snap.player_king_hp, 94);
        assert_eq!(snap.opponent_king_hp, 100);
        assert_eq!(snap.opponent_tower_hp, 4);
    }

    #[test]
    fn miss_still_recharges_up_to_cap() {
        let rules = DuelRules {
            energy_start: 4,
            energy_cap: 5,
            energy_recharge: 3,
            ..Default::default()
        };
        let mut state = playing(rules);

        let report = apply(&mut state, OpponentAction::Miss).unwrap();
        assert_eq!(report.strike, Strike::default());
        assert_eq!(report.energy, 5);
        assert_eq!(report.status, MatchStatus::Playing);
    }

    #[test]
    fn roll_respects_board() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let always_hit = DuelRules {
            p_tower_hit: 1.0,
            p_king_hit: 1.0,
            ..Default::default()
        };
        let state = playing(always_hit.clone());
        assert_eq!(roll(&state, &mut rng), OpponentAction::TowerHit);

        let state = playing(DuelRules {
            tower_hp_start: 0,
            ..always_hit
        });
        assert_eq!(roll(&state, &mut rng), OpponentAction::KingHit);

        let never_hit = DuelRules {
            p_tower_hit: 0.0,
            p_king_hit: 0.0,
            ..Default::default()
        };
        let state = playing(never_hit);
        for _ in 0..50 {
            assert_eq!(roll(&state, &mut rng), OpponentAction::Miss);
        }
    }

    #[test]
    fn roll_frequency_tracks_probability() {
        let state = playing(DuelRules {
            p_tower_hit: 0.25,
            ..Default::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let hits = (0..4000)
            .filter(|_| roll(&state, &mut rng) == OpponentAction::TowerHit)
            .count();
        assert!((800..1200).contains(&hits), "got {hits} hits");
    }

    #[tokio::test(start_paused = true)]
    async fn turn_fires_after_delay() {
        let mut turn = OpponentTurn::schedule(Duration::from_millis(1500));
        assert!(!turn.is_ready());
        turn.ready().await;
        assert!(turn.is_ready());
        turn.ready().await;
    }
}
