//! Error types for the duel engine and its collaborators.
//!
//! `StoreError` lives here rather than in `studyduel-store` so the session
//! can wrap persistence failures without depending on a concrete adapter.

use thiserror::Error;

use crate::duel::MatchStatus;

/// Errors surfaced by match actions.
///
/// Every variant except [`DuelError::Persistence`] is raised before any
/// state is touched, so the match is unchanged when one is returned.
#[derive(Debug, Error)]
pub enum DuelError {
    /// The question pool has no items to draw from.
    #[error("question pool is empty")]
    EmptyPool,

    /// A match can only be started from the lobby.
    #[error("match cannot start from status: {0}")]
    NotInLobby(MatchStatus),

    /// A match cannot start without questions.
    #[error("no questions available to start a match")]
    NoQuestions,

    /// A draw was requested with less energy than it costs.
    #[error("insufficient energy: have {energy}, need {cost}")]
    InsufficientEnergy { energy: u32, cost: u32 },

    /// The action is only valid while a match is being played.
    #[error("match is not in progress (status: {0})")]
    NotPlaying(MatchStatus),

    /// A question is already awaiting an answer.
    #[error("a question is already awaiting an answer")]
    QuestionPending,

    /// An answer was submitted with no question drawn.
    #[error("no question has been drawn")]
    NoActiveQuestion,

    /// The opponent has not finished its turn yet.
    #[error("opponent is still taking its turn")]
    OpponentTurnPending,

    /// Reset is only valid once the match has been decided.
    #[error("match has not finished (status: {0})")]
    NotFinished(MatchStatus),

    /// The profile store failed; nothing was applied.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl DuelError {
    /// Returns `true` for user-facing rejections that leave the match untouched.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DuelError::Persistence(_))
    }
}

/// Errors that can occur when talking to a profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No profile exists for the account.
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The remote store returned an error response.
    #[error("store error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// Injected or otherwise unclassified backend failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Reasons a tier table is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierTableError {
    #[error("tier table is empty")]
    Empty,

    #[error("first tier '{name}' starts at {min_points}, expected 0")]
    FirstTierNotZero { name: String, min_points: u32 },

    #[error("tier '{name}' ({min_points}) is not above the previous tier ({previous})")]
    NotAscending {
        name: String,
        min_points: u32,
        previous: u32,
    },

    #[error("duplicate tier name: {0}")]
    DuplicateName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_is_not_recoverable() {
        let err = DuelError::from(StoreError::Unavailable("down".into()));
        assert!(!err.is_recoverable());
        assert!(DuelError::InsufficientEnergy { energy: 0, cost: 1 }.is_recoverable());
        assert!(DuelError::EmptyPool.is_recoverable());
    }

    #[test]
    fn messages_include_details() {
        let err = DuelError::InsufficientEnergy { energy: 0, cost: 2 };
        assert_eq!(err.to_string(), "insufficient energy: have 0, need 2");

        let err = DuelError::from(StoreError::UnknownAccount("ada".into()));
        assert_eq!(err.to_string(), "persistence failure: unknown account: ada");
    }
}
