//! Duel session orchestrator.
//!
//! Owns one [`MatchState`] for one account and drives it through player
//! actions, the delayed opponent turn, and rank settlement. Every action
//! is applied to a copy of the match and committed only once all of its
//! store writes have succeeded, so a persistence failure leaves the match
//! exactly as it was.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::duel::{AnswerOutcome, DrawOutcome, MatchSnapshot, MatchState, MatchStatus};
use crate::error::DuelError;
use crate::model::{DuelRules, QuestionItem};
use crate::opponent::{self, OpponentAction, OpponentReport, OpponentTurn};
use crate::pool::QuestionPool;
use crate::rank::{RankChange, RankEngine};
use crate::traits::PointsUpdate;

/// Everything that happened as a result of one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub outcome: AnswerOutcome,
    /// Minor reward credited for a correct answer.
    pub reward: Option<PointsUpdate>,
    /// Settlement, if the answer ended the match.
    pub settlement: Option<RankChange>,
    pub snapshot: MatchSnapshot,
}

/// Result of a draw request at the session level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawReport {
    Question(QuestionItem),
    /// The pool could not supply a question and the match was lost.
    Exhausted(RankChange),
    /// The opponent's pending turn ended the match before a draw.
    Defeated(RankChange),
}

/// Event hooks for UI consumers.
pub trait DuelObserver: Send + Sync {
    fn on_turn(&self, report: &TurnReport);
    fn on_opponent_turn(&self, report: &OpponentReport);
    fn on_settled(&self, change: &RankChange);
}

/// No-op observer.
pub struct NoopObserver;

impl DuelObserver for NoopObserver {
    fn on_turn(&self, _: &TurnReport) {}
    fn on_opponent_turn(&self, _: &OpponentReport) {}
    fn on_settled(&self, _: &RankChange) {}
}

/// One player's duel against the computer opponent.
pub struct DuelSession {
    account_id: String,
    state: MatchState,
    rank: RankEngine,
    rng: ChaCha8Rng,
    opponent: Option<OpponentTurn>,
    /// Roll for a fired opponent turn that has not been committed yet.
    rolled: Option<OpponentAction>,
    /// Question and amount of a minor reward persisted but not committed.
    credited: Option<(u32, u32)>,
    last_settlement: Option<RankChange>,
    observer: Box<dyn DuelObserver>,
}

impl DuelSession {
    pub fn new(
        account_id: impl Into<String>,
        rules: DuelRules,
        pool: QuestionPool,
        rank: RankEngine,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            state: MatchState::new(rules, pool),
            rank,
            rng: ChaCha8Rng::from_entropy(),
            opponent: None,
            rolled: None,
            credited: None,
            last_settlement: None,
            observer: Box::new(NoopObserver),
        }
    }

    /// Use a fixed seed for draws and opponent rolls.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn DuelObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn status(&self) -> MatchStatus {
        self.state.status()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        self.state.snapshot()
    }

    pub fn current_question(&self) -> Option<&QuestionItem> {
        self.state.current_question()
    }

    pub fn rank(&self) -> &RankEngine {
        &self.rank
    }

    /// Settlement of the most recently decided match.
    pub fn last_settlement(&self) -> Option<&RankChange> {
        self.last_settlement.as_ref()
    }

    /// Whether an opponent turn is scheduled or awaiting commit.
    pub fn opponent_pending(&self) -> bool {
        self.opponent.is_some()
    }

    pub fn start(&mut self) -> Result<MatchSnapshot, DuelError> {
        self.state.start()?;
        self.clear_opponent();
        self.last_settlement = None;
        Ok(self.state.snapshot())
    }

    /// Draw the next question once the opponent has finished its turn.
    ///
    /// An elapsed opponent turn is applied first; if it kills the player
    /// the settlement is returned as [`DrawReport::Defeated`].
    pub async fn request_question(&mut self) -> Result<DrawReport, DuelError> {
        if let Some(turn) = &self.opponent {
            if !turn.is_ready() {
                return Err(DuelError::OpponentTurnPending);
            }
            if let (_, Some(change)) = self.resolve_opponent().await? {
                return Ok(DrawReport::Defeated(change));
            }
        }

        let mut next = self.state.clone();
        match next.request_question(&mut self.rng)? {
            DrawOutcome::Question(item) => {
                self.state = next;
                Ok(DrawReport::Question(item))
            }
            DrawOutcome::Exhausted => {
                let change = self.rank.settle(&self.account_id, false).await?;
                self.state = next;
                self.record_settlement(&change);
                Ok(DrawReport::Exhausted(change))
            }
        }
    }

    /// Answer the current question.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<TurnReport, DuelError> {
        let mut next = self.state.clone();
        let outcome = next.submit_answer(answer)?;

        let credited = self
            .credited
            .filter(|(question_id, _)| *question_id == outcome.question_id);
        let mut reward = None;
        if outcome.correct {
            if credited.is_none() && self.rank.minor_reward() > 0 {
                let update = self.rank.grant_minor_reward(&self.account_id).await?;
                let amount = update.after.saturating_sub(update.before);
                self.credited = Some((outcome.question_id, amount));
                reward = Some(update);
            }
        } else if let Some((_, amount)) = credited {
            self.rank.revoke_minor_reward(&self.account_id, amount).await?;
            self.credited = None;
        }

        let settlement = if next.status().is_terminal() {
            let won = next.status() == MatchStatus::Won;
            Some(self.rank.settle(&self.account_id, won).await?)
        } else {
            None
        };

        self.state = next;
        self.credited = None;
        if outcome.opponent_turn_due() {
            self.opponent = Some(OpponentTurn::schedule(self.state.rules().think_delay()));
        }

        let report = TurnReport {
            outcome,
            reward,
            settlement,
            snapshot: self.state.snapshot(),
        };
        self.observer.on_turn(&report);
        if let Some(change) = &report.settlement {
            self.record_settlement(change);
        }
        Ok(report)
    }

    /// Wait for the opponent's turn, if one is scheduled, and apply it.
    pub async fn wait_for_opponent(&mut self) -> Result<Option<OpponentReport>, DuelError> {
        let Some(turn) = self.opponent.as_mut() else {
            return Ok(None);
        };
        turn.ready().await;
        self.resolve_opponent().await.map(|(report, _)| Some(report))
    }

    /// Apply the opponent's turn only if its delay has already elapsed.
    pub async fn poll_opponent(&mut self) -> Result<Option<OpponentReport>, DuelError> {
        let ready = self.opponent.as_ref().is_some_and(OpponentTurn::is_ready);
        if !ready {
            return Ok(None);
        }
        self.resolve_opponent().await.map(|(report, _)| Some(report))
    }

    /// Return a decided match to the lobby.
    pub fn reset(&mut self) -> Result<MatchSnapshot, DuelError> {
        self.state.reset()?;
        self.clear_opponent();
        Ok(self.state.snapshot())
    }

    /// Leave the match, cancelling any pending opponent turn.
    ///
    /// An unfinished match goes back to the lobby unsettled. A reward that a
    /// failed answer already persisted stays with the account.
    pub fn leave(&mut self) {
        if self.state.status() == MatchStatus::Playing {
            tracing::info!(
                account_id = %self.account_id,
                match_id = %self.state.match_id(),
                "player left an unfinished match"
            );
        }
        self.clear_opponent();
        self.credited = None;
        self.state.abandon();
    }

    async fn resolve_opponent(
        &mut self,
    ) -> Result<(OpponentReport, Option<RankChange>), DuelError> {
        let action = match self.rolled {
            Some(action) => action,
            None => {
                let action = opponent::roll(&self.state, &mut self.rng);
                self.rolled = Some(action);
                action
            }
        };

        let mut next = self.state.clone();
        let report = opponent::apply(&mut next, action)?;
        let settlement = if report.status == MatchStatus::Lost {
            Some(self.rank.settle(&self.account_id, false).await?)
        } else {
            None
        };

        self.state = next;
        self.clear_opponent();
        self.observer.on_opponent_turn(&report);
        if let Some(change) = &settlement {
            self.record_settlement(change);
        }
        Ok((report, settlement))
    }

    fn record_settlement(&mut self, change: &RankChange) {
        self.observer.on_settled(change);
        self.last_settlement = Some(change.clone());
    }

    fn clear_opponent(&mut self) {
        if let Some(turn) = self.opponent.take() {
            turn.cancel();
        }
        self.rolled = None;
    }
}
