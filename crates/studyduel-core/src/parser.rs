//! TOML question-set parser.
//!
//! Loads question sets from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{QuestionDraft, QuestionSet};

/// Intermediate TOML structure for parsing question set files.
#[derive(Debug, Deserialize)]
struct TomlQuestionFile {
    question_set: TomlQuestionSetHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestionSetHeader {
    id: String,
    name: String,
    subject: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    prompt: String,
    answer: String,
}

/// Parse a single TOML file into a `QuestionSet`.
pub fn parse_question_set(path: &Path) -> Result<QuestionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set file: {}", path.display()))?;

    parse_question_set_str(&content, path)
}

/// Parse a TOML string into a `QuestionSet` (useful for testing).
pub fn parse_question_set_str(content: &str, source_path: &Path) -> Result<QuestionSet> {
    let parsed: TomlQuestionFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    anyhow::ensure!(
        !parsed.question_set.subject.trim().is_empty(),
        "question set '{}' has an empty subject",
        parsed.question_set.id
    );

    Ok(QuestionSet {
        id: parsed.question_set.id,
        name: parsed.question_set.name,
        subject: parsed.question_set.subject,
        description: parsed.question_set.description,
        questions: parsed
            .questions
            .into_iter()
            .map(|q| QuestionDraft::new(q.prompt.trim(), q.answer.trim()))
            .collect(),
    })
}

/// Load every `.toml` question set in a directory tree, in path order.
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionSet>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut sets = Vec::new();
    for path in paths {
        if path.is_dir() {
            sets.extend(load_question_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_question_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(sets)
}

/// Load a single file or a whole directory.
pub fn load_question_path(path: &Path) -> Result<Vec<QuestionSet>> {
    if path.is_dir() {
        load_question_directory(path)
    } else {
        Ok(vec![parse_question_set(path)?])
    }
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 1-based question number (if applicable).
    pub question: Option<usize>,
    pub message: String,
}

/// Validate a question set for common issues.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.questions.is_empty() {
        warnings.push(ValidationWarning {
            question: None,
            message: "set has no questions; a duel cannot start with it".into(),
        });
    }

    let mut seen_prompts = HashSet::new();
    for (i, q) in set.questions.iter().enumerate() {
        let number = Some(i + 1);
        if q.prompt.is_empty() {
            warnings.push(ValidationWarning {
                question: number,
                message: "prompt is empty".into(),
            });
        }
        if q.expected_answer.is_empty() {
            warnings.push(ValidationWarning {
                question: number,
                message: "answer is empty".into(),
            });
        }
        if !q.prompt.is_empty() && !seen_prompts.insert(q.prompt.to_lowercase()) {
            warnings.push(ValidationWarning {
                question: number,
                message: format!("duplicate prompt: {}", q.prompt),
            });
        }
    }

    warnings
}
