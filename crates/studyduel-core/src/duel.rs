//! Match state machine for a single duel.
//!
//! `Lobby -> Playing -> {Won, Lost} -> Lobby`. All combat math lives here;
//! the opponent's reaction is applied through [`crate::opponent`].

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DuelError;
use crate::model::{DuelRules, QuestionItem};
use crate::pool::QuestionPool;

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Lobby,
    Playing,
    Won,
    Lost,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Won | MatchStatus::Lost)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Lobby => write!(f, "lobby"),
            MatchStatus::Playing => write!(f, "playing"),
            MatchStatus::Won => write!(f, "won"),
            MatchStatus::Lost => write!(f, "lost"),
        }
    }
}

/// Damage dealt by one hit, split between tower and king.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub tower_damage: u32,
    pub king_damage: u32,
    /// The tower reached zero on this hit.
    pub tower_destroyed: bool,
}

/// Hit a tower first, carrying any overflow into the king once it falls.
///
/// A tower that is already down passes the full damage through.
pub fn strike(tower_hp: &mut u32, king_hp: &mut u32, damage: u32) -> Strike {
    let before = *tower_hp;
    let residual = damage.saturating_sub(before);
    *tower_hp = before.saturating_sub(damage);

    let mut king_damage = 0;
    if damage >= before && *king_hp > 0 {
        king_damage = residual.min(*king_hp);
        *king_hp -= king_damage;
    }

    Strike {
        tower_damage: before - *tower_hp,
        king_damage,
        tower_destroyed: before > 0 && *tower_hp == 0,
    }
}

/// Result of a draw request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A question is now awaiting an answer.
    Question(QuestionItem),
    /// Nothing could be drawn; the match is lost.
    Exhausted,
}

/// Result of answering the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub question_id: u32,
    pub correct: bool,
    /// Damage dealt to the opponent (correct) or taken (incorrect).
    pub strike: Strike,
    pub status: MatchStatus,
}

impl AnswerOutcome {
    /// Whether the opponent gets a turn after this answer.
    pub fn opponent_turn_due(&self) -> bool {
        self.status == MatchStatus::Playing
    }
}

/// One active duel, owned by a single session.
#[derive(Debug, Clone)]
pub struct MatchState {
    match_id: Uuid,
    rules: DuelRules,
    pool: QuestionPool,
    pub(crate) status: MatchStatus,
    pub(crate) player_king_hp: u32,
    pub(crate) opponent_king_hp: u32,
    pub(crate) player_tower_hp: u32,
    pub(crate) opponent_tower_hp: u32,
    pub(crate) energy: u32,
    current_question: Option<QuestionItem>,
}

impl MatchState {
    /// A match waiting in the lobby.
    pub fn new(rules: DuelRules, pool: QuestionPool) -> Self {
        Self {
            match_id: Uuid::nil(),
            player_king_hp: rules.king_hp_start,
            opponent_king_hp: rules.king_hp_start,
            player_tower_hp: rules.tower_hp_start,
            opponent_tower_hp: rules.tower_hp_start,
            energy: rules.energy_start,
            rules,
            pool,
            status: MatchStatus::Lobby,
            current_question: None,
        }
    }

    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    pub fn rules(&self) -> &DuelRules {
        &self.rules
    }

    pub fn pool(&self) -> &QuestionPool {
        &self.pool
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn energy(&self) -> u32 {
        self.energy
    }

    pub fn current_question(&self) -> Option<&QuestionItem> {
        self.current_question.as_ref()
    }

    /// Begin a fresh match from the lobby.
    pub fn start(&mut self) -> Result<(), DuelError> {
        if self.status != MatchStatus::Lobby {
            return Err(DuelError::NotInLobby(self.status));
        }
        if self.pool.is_empty() {
            return Err(DuelError::NoQuestions);
        }
        self.match_id = Uuid::new_v4();
        self.player_king_hp = self.rules.king_hp_start;
        self.opponent_king_hp = self.rules.king_hp_start;
        self.player_tower_hp = self.rules.tower_hp_start;
        self.opponent_tower_hp = self.rules.tower_hp_start;
        self.energy = self.rules.energy_start;
        self.current_question = None;
        self.pool.clear_seen();
        self.status = MatchStatus::Playing;
        tracing::info!(match_id = %self.match_id, pool = self.pool.len(), "match started");
        Ok(())
    }

    /// Draw the next question. Energy is checked here and spent on answering.
    pub fn request_question<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<DrawOutcome, DuelError> {
        self.require_playing()?;
        if self.current_question.is_some() {
            return Err(DuelError::QuestionPending);
        }
        if self.energy < self.rules.draw_cost {
            return Err(DuelError::InsufficientEnergy {
                energy: self.energy,
                cost: self.rules.draw_cost,
            });
        }

        match self.pool.draw(rng) {
            Ok(item) => {
                tracing::debug!(match_id = %self.match_id, question = item.id, "question drawn");
                self.current_question = Some(item.clone());
                Ok(DrawOutcome::Question(item))
            }
            Err(DuelError::EmptyPool) => {
                tracing::warn!(match_id = %self.match_id, "question pool exhausted, match lost");
                self.status = MatchStatus::Lost;
                Ok(DrawOutcome::Exhausted)
            }
            Err(e) => Err(e),
        }
    }

    /// Would `answer` be accepted for the current question?
    pub fn check_answer(&self, answer: &str) -> Result<bool, DuelError> {
        self.require_playing()?;
        self.current_question
            .as_ref()
            .map(|q| q.accepts(answer))
            .ok_or(DuelError::NoActiveQuestion)
    }

    /// Resolve the current question and the resulting combat.
    pub fn submit_answer(&mut self, answer: &str) -> Result<AnswerOutcome, DuelError> {
        let correct = self.check_answer(answer)?;
        let Some(question) = self.current_question.take() else {
            return Err(DuelError::NoActiveQuestion);
        };

        let strike = if correct {
            let hit = strike(
                &mut self.opponent_tower_hp,
                &mut self.opponent_king_hp,
                self.rules.attack_damage,
            );
            if self.opponent_king_hp == 0 {
                self.status = MatchStatus::Won;
            }
            hit
        } else {
            let hit = strike(
                &mut self.player_tower_hp,
                &mut self.player_king_hp,
                self.rules.defense_damage,
            );
            if self.player_king_hp == 0 {
                self.status = MatchStatus::Lost;
            }
            hit
        };
        self.energy = self.energy.saturating_sub(self.rules.draw_cost);

        tracing::debug!(
            match_id = %self.match_id,
            question = question.id,
            correct,
            status = %self.status,
            "answer resolved"
        );

        Ok(AnswerOutcome {
            question_id: question.id,
            correct,
            strike,
            status: self.status,
        })
    }

    /// Return a decided match to the lobby.
    pub fn reset(&mut self) -> Result<(), DuelError> {
        if !self.status.is_terminal() {
            return Err(DuelError::NotFinished(self.status));
        }
        self.status = MatchStatus::Lobby;
        self.current_question = None;
        Ok(())
    }

    /// Drop an unfinished match back to the lobby without a result.
    pub(crate) fn abandon(&mut self) {
        if self.status == MatchStatus::Playing {
            tracing::info!(match_id = %self.match_id, "match abandoned");
        }
        self.status = MatchStatus::Lobby;
        self.current_question = None;
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.match_id,
            status: self.status,
            player_king_hp: self.player_king_hp,
            player_tower_hp: self.player_tower_hp,
            opponent_king_hp: self.opponent_king_hp,
            opponent_tower_hp: self.opponent_tower_hp,
            energy: self.energy,
            energy_cap: self.rules.energy_cap,
            current_prompt: self.current_question.as_ref().map(|q| q.prompt.clone()),
        }
    }

    fn require_playing(&self) -> Result<(), DuelError> {
        if self.status == MatchStatus::Playing {
            Ok(())
        } else {
            Err(DuelError::NotPlaying(self.status))
        }
    }
}

/// Read-only view of a match for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: Uuid,
    pub status: MatchStatus,
    pub player_king_hp: u32,
    pub player_tower_hp: u32,
    pub opponent_king_hp: u32,
    pub opponent_tower_hp: u32,
    pub energy: u32,
    pub energy_cap: u32,
    /// Prompt of the question awaiting an answer, never the answer itself.
    pub current_prompt: Option<String>,
}
