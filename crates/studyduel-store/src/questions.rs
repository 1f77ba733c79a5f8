//! File-backed question source.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use studyduel_core::model::{QuestionDraft, QuestionSet};
use studyduel_core::parser::load_question_path;
use studyduel_core::traits::QuestionSource;

/// Serves questions from parsed TOML question sets.
///
/// A subject selects every set whose `subject` matches, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct QuestionSetSource {
    sets: Vec<QuestionSet>,
}

impl QuestionSetSource {
    pub fn new(sets: Vec<QuestionSet>) -> Self {
        Self { sets }
    }

    /// Load a single question-set file or every set under a directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let sets = load_question_path(path)?;
        tracing::debug!(path = %path.display(), sets = sets.len(), "loaded question sets");
        Ok(Self::new(sets))
    }

    pub fn sets(&self) -> &[QuestionSet] {
        &self.sets
    }

    /// Distinct subjects, in first-seen order.
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = Vec::new();
        for set in &self.sets {
            if !subjects.iter().any(|s| s.eq_ignore_ascii_case(&set.subject)) {
                subjects.push(&set.subject);
            }
        }
        subjects
    }
}

#[async_trait]
impl QuestionSource for QuestionSetSource {
    fn name(&self) -> &str {
        "question-sets"
    }

    async fn load(&self, subject: &str) -> Result<Vec<QuestionDraft>> {
        let subject = subject.trim().to_lowercase();
        let drafts: Vec<QuestionDraft> = self
            .sets
            .iter()
            .filter(|set| set.subject.trim().to_lowercase() == subject)
            .flat_map(|set| set.questions.iter().cloned())
            .collect();
        if drafts.is_empty() {
            tracing::warn!(subject = %subject, "no questions found for subject");
        }
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(id: &str, subject: &str, prompts: &[&str]) -> QuestionSet {
        QuestionSet {
            id: id.into(),
            name: id.into(),
            subject: subject.into(),
            description: String::new(),
            questions: prompts
                .iter()
                .map(|p| QuestionDraft::new(*p, "x"))
                .collect(),
        }
    }

    #[tokio::test]
    async fn load_matches_subject_ignoring_case() {
        let source = QuestionSetSource::new(vec![
            set("cells", "Biology", &["a", "b"]),
            set("algebra", "math", &["c"]),
            set("genes", "biology", &["d"]),
        ]);

        let drafts = source.load("BIOLOGY").await.unwrap();
        let prompts: Vec<_> = drafts.iter().map(|d| d.prompt.as_str()).collect();
        assert_eq!(prompts, ["a", "b", "d"]);
        assert_eq!(source.subjects(), ["Biology", "math"]);
    }

    #[tokio::test]
    async fn unknown_subject_yields_nothing() {
        let source = QuestionSetSource::new(vec![set("cells", "biology", &["a"])]);
        assert!(source.load("history").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn from_path_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("capitals.toml"),
            r#"
[question_set]
id = "capitals"
name = "Capitals"
subject = "geography"

[[questions]]
prompt = "Capital of France?"
answer = "Paris"
"#,
        )
        .unwrap();

        let source = QuestionSetSource::from_path(dir.path()).unwrap();
        assert_eq!(source.sets().len(), 1);
        let drafts = source.load("geography").await.unwrap();
        assert_eq!(drafts[0].expected_answer, "Paris");
    }
}
