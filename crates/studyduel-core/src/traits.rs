//! Core trait definitions for the duel engine's collaborators.
//!
//! Question sources and profile stores are implemented by the
//! `studyduel-store` crate; the in-memory [`StaticQuestionSource`] lives here
//! because tests and embedders need one without pulling in any I/O.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{QuestionDraft, RankProfile};

// ---------------------------------------------------------------------------
// Question source
// ---------------------------------------------------------------------------

/// Supplies the questions for a subject when a pool is built.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Human-readable source name (e.g. "question-sets").
    fn name(&self) -> &str;

    /// Load every question for `subject`, in source order. May be empty.
    async fn load(&self, subject: &str) -> anyhow::Result<Vec<QuestionDraft>>;
}

/// A fixed list of questions, returned for any subject.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionSource {
    questions: Vec<QuestionDraft>,
}

impl StaticQuestionSource {
    pub fn new(questions: Vec<QuestionDraft>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn load(&self, _subject: &str) -> anyhow::Result<Vec<QuestionDraft>> {
        Ok(self.questions.clone())
    }
}

// ---------------------------------------------------------------------------
// Profile store
// ---------------------------------------------------------------------------

/// Result of an atomic point adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsUpdate {
    /// Points stored immediately before the adjustment.
    pub before: u32,
    /// Points stored after the adjustment.
    pub after: u32,
}

impl PointsUpdate {
    /// The change actually applied, after clamping at zero.
    pub fn applied(&self) -> i64 {
        i64::from(self.after) - i64::from(self.before)
    }
}

/// Persistent storage for account rank points.
///
/// Implementations must give read-your-writes consistency within a session.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Human-readable store name (e.g. "file").
    fn name(&self) -> &str;

    /// Create a profile with zero points, or return the existing one.
    async fn create_profile(&self, account_id: &str) -> Result<RankProfile, StoreError>;

    /// Current points for an account.
    async fn get_points(&self, account_id: &str) -> Result<u32, StoreError>;

    /// Overwrite the points for an account.
    async fn set_points(&self, account_id: &str, points: u32) -> Result<(), StoreError>;

    /// Atomically add `delta`, clamping the stored total at zero.
    async fn add_points(&self, account_id: &str, delta: i64) -> Result<PointsUpdate, StoreError>;

    /// Top `limit` profiles by points descending, ties by account id ascending.
    async fn top(&self, limit: usize) -> Result<Vec<RankProfile>, StoreError>;
}

/// Apply `delta` to `points`, clamped to the `u32` range.
pub fn clamp_points(points: u32, delta: i64) -> u32 {
    (i64::from(points) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

/// Order profiles the way [`ProfileStore::top`] promises.
pub fn rank_order(profiles: &mut [RankProfile]) {
    profiles.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });
}
