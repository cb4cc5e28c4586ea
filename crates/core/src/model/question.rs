use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::error::UsageError;
use crate::model::ids::QuestionId;
use crate::model::selection::Selection;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question explanation cannot be empty")]
    EmptyExplanation,

    #[error("question must have at least one option")]
    NoOptions,

    #[error("question must have at least one correct answer")]
    NoCorrectAnswer,

    #[error("correct answer {index} is out of range for {options} options")]
    CorrectOutOfRange { index: usize, options: usize },

    #[error("single-select question has {count} correct answers")]
    SingleWithManyCorrect { count: usize },
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// Whether a question takes one option or a set of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
        }
    }
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

/// `correct` accepts either a bare index or a list of indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum CorrectField {
    One(usize),
    Many(Vec<usize>),
}

/// Raw dataset record, every field optional so validation can name what is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct QuestionRecord {
    pub id: Option<QuestionId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionKind>,
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct: Option<CorrectField>,
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated, immutable quiz question.
///
/// Every correct index is within `options`, and single-select questions have
/// exactly one correct index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    text: String,
    options: Vec<String>,
    correct: BTreeSet<usize>,
    explanation: String,
    keywords: Vec<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if text/explanation are blank, there are no options,
    /// the correct set is empty or out of range, or a single-select question has
    /// more than one correct index.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        text: impl Into<String>,
        options: Vec<String>,
        correct: impl IntoIterator<Item = usize>,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        let explanation = explanation.into();
        let correct: BTreeSet<usize> = correct.into_iter().collect();

        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if explanation.trim().is_empty() {
            return Err(QuestionError::EmptyExplanation);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if correct.is_empty() {
            return Err(QuestionError::NoCorrectAnswer);
        }
        if let Some(&index) = correct.iter().find(|&&i| i >= options.len()) {
            return Err(QuestionError::CorrectOutOfRange {
                index,
                options: options.len(),
            });
        }
        if kind == QuestionKind::Single && correct.len() != 1 {
            return Err(QuestionError::SingleWithManyCorrect {
                count: correct.len(),
            });
        }

        Ok(Self {
            id,
            kind,
            text,
            options,
            correct,
            explanation,
            keywords: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = String>) -> Self {
        self.keywords = keywords
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct(&self) -> &BTreeSet<usize> {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Checks that a selection fits this question's type and option range.
    ///
    /// # Errors
    ///
    /// Returns `UsageError::SelectionKindMismatch` or `UsageError::SelectionOutOfRange`.
    pub fn accepts(&self, selection: &Selection) -> Result<(), UsageError> {
        let kind_matches = matches!(
            (self.kind, selection),
            (QuestionKind::Single, Selection::Single(_))
                | (QuestionKind::Multiple, Selection::Multiple(_))
        );
        if !kind_matches {
            return Err(UsageError::SelectionKindMismatch);
        }
        if let Some(index) = selection.indices().find(|&i| i >= self.options.len()) {
            return Err(UsageError::SelectionOutOfRange {
                index,
                options: self.options.len(),
            });
        }
        Ok(())
    }

    /// Order-independent comparison of a selection against the correct set.
    ///
    /// Single-select answers are compared as one-element sets.
    #[must_use]
    pub fn is_correct(&self, selection: &Selection) -> bool {
        selection.as_set() == self.correct
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let id = record.id.ok_or(QuestionError::MissingField("id"))?;
        let text = record
            .question
            .ok_or(QuestionError::MissingField("question"))?;
        let options = record
            .options
            .ok_or(QuestionError::MissingField("options"))?;
        let correct = match record
            .correct
            .ok_or(QuestionError::MissingField("correct"))?
        {
            CorrectField::One(index) => vec![index],
            CorrectField::Many(indices) => indices,
        };
        let explanation = record
            .explanation
            .ok_or(QuestionError::MissingField("explanation"))?;

        // Untyped records with several correct indices are multi-select.
        let kind = record.kind.unwrap_or(if correct.len() > 1 {
            QuestionKind::Multiple
        } else {
            QuestionKind::Single
        });

        Ok(Question::new(id, kind, text, options, correct, explanation)?
            .with_keywords(record.keywords.unwrap_or_default()))
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        Self {
            id: Some(q.id),
            kind: Some(q.kind),
            question: Some(q.text),
            options: Some(q.options),
            correct: Some(CorrectField::Many(q.correct.into_iter().collect())),
            explanation: Some(q.explanation),
            keywords: Some(q.keywords),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
