//! Question pool with anti-repeat draws.
//!
//! Items are drawn uniformly from those not yet seen in the current cycle.
//! Once every item has been seen the cycle restarts.

use std::collections::HashSet;

use anyhow::{Context, Result};
use rand::Rng;

use crate::error::DuelError;
use crate::model::{QuestionDraft, QuestionItem};
use crate::traits::QuestionSource;

/// The questions available to one session plus the ids drawn this cycle.
#[derive(Debug, Clone, Default)]
pub struct QuestionPool {
    items: Vec<QuestionItem>,
    seen: HashSet<u32>,
}

impl QuestionPool {
    /// Build a pool from drafts, assigning ids 1, 2, ... in order.
    pub fn new(drafts: Vec<QuestionDraft>) -> Self {
        let items = drafts
            .into_iter()
            .zip(1u32..)
            .map(|(draft, id)| QuestionItem {
                id,
                prompt: draft.prompt,
                expected_answer: draft.expected_answer,
            })
            .collect();
        Self {
            items,
            seen: HashSet::new(),
        }
    }

    /// Load the pool for `subject` from a question source.
    pub async fn from_source(source: &dyn QuestionSource, subject: &str) -> Result<Self> {
        let drafts = source
            .load(subject)
            .await
            .with_context(|| format!("failed to load questions for '{subject}' from {}", source.name()))?;
        tracing::debug!(
            source = source.name(),
            subject,
            count = drafts.len(),
            "loaded question pool"
        );
        Ok(Self::new(drafts))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }

    /// Ids drawn in the current cycle.
    pub fn seen_ids(&self) -> &HashSet<u32> {
        &self.seen
    }

    /// Forget every draw, starting a fresh cycle.
    pub fn clear_seen(&mut self) {
        self.seen.clear();
    }

    /// Draw an unseen item uniformly at random and mark it seen.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<QuestionItem, DuelError> {
        if self.items.is_empty() {
            return Err(DuelError::EmptyPool);
        }
        if self.seen.len() >= self.items.len() {
            tracing::debug!(size = self.items.len(), "question cycle complete, restarting");
            self.seen.clear();
        }

        let unseen: Vec<&QuestionItem> = self
            .items
            .iter()
            .filter(|item| !self.seen.contains(&item.id))
            .collect();
        let item = unseen[rng.gen_range(0..unseen.len())].clone();
        self.seen.insert(item.id);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::traits::StaticQuestionSource;

    fn pool_of(n: usize) -> QuestionPool {
        QuestionPool::new(
            (0..n)
                .map(|i| QuestionDraft::new(format!("q{i}"), format!("a{i}")))
                .collect(),
        )
    }

    #[test]
    fn ids_assigned_in_order() {
        let pool = pool_of(3);
        let ids: Vec<u32> = pool.items().iter().map(|q| q.id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(pool.items()[2].prompt, "q2");
    }

    #[test]
    fn empty_pool_cannot_draw() {
        let mut pool = QuestionPool::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(pool.draw(&mut rng), Err(DuelError::EmptyPool)));
    }

    #[test]
    fn no_repeats_within_a_cycle() {
        let mut pool = pool_of(7);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..5 {
            let mut drawn = HashSet::new();
            for _ in 0..7 {
                let item = pool.draw(&mut rng).unwrap();
                assert!(drawn.insert(item.id), "item {} repeated in cycle", item.id);
                assert!(pool.seen_ids().len() <= pool.len());
            }
            assert_eq!(drawn.len(), 7);
        }
    }

    #[test]
    fn seen_ids_stay_within_pool() {
        let mut pool = pool_of(4);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let all: HashSet<u32> = pool.items().iter().map(|q| q.id).collect();
        for _ in 0..20 {
            pool.draw(&mut rng).unwrap();
            assert!(pool.seen_ids().is_subset(&all));
        }
    }

    #[test]
    fn single_item_pool_redraws_after_cycle() {
        let mut pool = pool_of(1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let first = pool.draw(&mut rng).unwrap();
        let second = pool.draw(&mut rng).unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.seen_ids().len(), 1);
    }

    #[test]
    fn clear_seen_restarts_cycle() {
        let mut pool = pool_of(2);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        pool.draw(&mut rng).unwrap();
        pool.clear_seen();
        assert!(pool.seen_ids().is_empty());
    }

    #[tokio::test]
    async fn from_source_loads_drafts() {
        let source = StaticQuestionSource::new(vec![
            QuestionDraft::new("Capital of France?", "Paris"),
            QuestionDraft::new("Capital of Peru?", "Lima"),
        ]);
        let pool = QuestionPool::from_source(&source, "geography").await.unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.seen_ids().is_empty());
    }
}
