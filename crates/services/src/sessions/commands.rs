use std::collections::BTreeSet;

use quiz_core::UsageError;
use quiz_core::model::{ResultsSnapshot, Selection};

/// One user action against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Answer { position: usize, selection: Selection },
    ClearAnswer { position: usize },
    GoTo(usize),
    Next,
    Previous,
    /// Clear the current question's answer and mark it unanswered.
    Reset,
    /// Show the correct answer for the current question.
    Reveal,
    Complete,
}

/// Correct answer shown for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedAnswer {
    pub position: usize,
    pub correct: BTreeSet<usize>,
    pub explanation: String,
}

/// What a command changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    AnswerRecorded { position: usize },
    AnswerCleared { position: usize },
    Moved { from: usize, to: usize },
    Reset { position: usize },
    Revealed(RevealedAnswer),
    Completed(ResultsSnapshot),
    /// The request was invalid and the session is unchanged.
    Ignored(UsageError),
}

impl CommandOutcome {
    /// True when the outcome changed state that is saved as progress.
    #[must_use]
    pub fn changes_progress(&self) -> bool {
        !matches!(
            self,
            CommandOutcome::Ignored(_) | CommandOutcome::Completed(_)
        )
    }
}
