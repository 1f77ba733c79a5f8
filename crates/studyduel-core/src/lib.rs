//! studyduel-core — Duel engine, arena tiers, and rank settlement.
//!
//! This crate defines the match state machine, the question pool, the
//! opponent resolver, and the score/rank engine that the rest of studyduel
//! builds on. Persistence and question loading are reached through the
//! async traits in [`traits`].

pub mod arena;
pub mod duel;
pub mod error;
pub mod leaderboard;
pub mod model;
pub mod opponent;
pub mod parser;
pub mod pool;
pub mod rank;
pub mod session;
pub mod traits;

pub use arena::{ArenaTable, ArenaTier};
pub use duel::{MatchSnapshot, MatchState, MatchStatus};
pub use error::{DuelError, StoreError, TierTableError};
pub use model::{DuelRules, QuestionDraft, QuestionItem, QuestionSet, RankProfile};
pub use rank::{RankChange, RankEngine, TierTransition};
pub use session::{DuelObserver, DuelSession, NoopObserver};
