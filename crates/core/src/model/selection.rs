use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::question::QuestionKind;

/// The option(s) a user picked for one question.
///
/// Serialized as a bare index for single-select and as a list for multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Single(usize),
    Multiple(BTreeSet<usize>),
}

impl Selection {
    #[must_use]
    pub fn single(index: usize) -> Self {
        Self::Single(index)
    }

    #[must_use]
    pub fn multiple(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::Multiple(indices.into_iter().collect())
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            Selection::Single(_) => QuestionKind::Single,
            Selection::Multiple(_) => QuestionKind::Multiple,
        }
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        let (single, many) = match self {
            Selection::Single(i) => (Some(*i), None),
            Selection::Multiple(set) => (None, Some(set.iter().copied())),
        };
        single.into_iter().chain(many.into_iter().flatten())
    }

    #[must_use]
    pub fn as_set(&self) -> BTreeSet<usize> {
        self.indices().collect()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        match self {
            Selection::Single(i) => *i == index,
            Selection::Multiple(set) => set.contains(&index),
        }
    }
}

/// Position in the question set → the recorded selection. Absent means unanswered.
pub type AnswerRecord = BTreeMap<usize, Selection>;
