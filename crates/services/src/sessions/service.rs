use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

use quiz_core::UsageError;
use quiz_core::model::{AnswerRecord, Question, QuestionSet, ResultsSnapshot, Selection};
use quiz_core::timing::TimingEngine;

use super::commands::{CommandOutcome, RevealedAnswer, SessionCommand};
use super::progress::SessionProgress;
use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Completed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a sampled question set.
///
/// Navigation always goes through `TimingEngine::switch_to`, so the outgoing
/// question's timer is stopped before the incoming one starts. Once completed
/// the session only answers `Complete` (with the same snapshot) and rejects
/// every other command.
///
/// Time comes in as `now` on each call; the services layer owns the clock.
#[derive(Clone)]
pub struct QuizSession {
    questions: QuestionSet,
    current: usize,
    answers: AnswerRecord,
    answered: BTreeMap<usize, bool>,
    timing: TimingEngine,
    revealed: bool,
    results: Option<ResultsSnapshot>,
}

impl QuizSession {
    /// Start an attempt at position 0 with the total and first question timers running.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the question set is empty.
    pub fn initialize(questions: QuestionSet, now: DateTime<Utc>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let mut timing = TimingEngine::new(questions.len());
        timing.start_total(now);
        timing.switch_to(0, now);

        Ok(Self {
            questions,
            current: 0,
            answers: AnswerRecord::new(),
            answered: BTreeMap::new(),
            timing,
            revealed: false,
            results: None,
        })
    }

    /// Rebuild an active session from already validated parts. A revealed
    /// question stays revealed with its timer stopped.
    pub(crate) fn from_parts(
        questions: QuestionSet,
        current: usize,
        answers: AnswerRecord,
        answered: BTreeMap<usize, bool>,
        mut timing: TimingEngine,
        revealed: bool,
        now: DateTime<Utc>,
    ) -> Self {
        if !revealed {
            timing.switch_to(current, now);
        }
        Self {
            questions,
            current,
            answers,
            answered,
            timing,
            revealed,
            results: None,
        }
    }

    //
    // ─── READ ──────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.results.is_some() {
            SessionPhase::Completed
        } else {
            SessionPhase::Active
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.results.is_some()
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_position(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn answer(&self, position: usize) -> Option<&Selection> {
        self.answers.get(&position)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    /// Whether the position has been answered at some point (see `reset_current`).
    #[must_use]
    pub fn is_answered(&self, position: usize) -> bool {
        self.answered.get(&position).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn answered_flags(&self) -> &BTreeMap<usize, bool> {
        &self.answered
    }

    /// True after `reveal` until the user moves or resets.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn timing(&self) -> &TimingEngine {
        &self.timing
    }

    #[must_use]
    pub fn results(&self) -> Option<&ResultsSnapshot> {
        self.results.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.answers.len();
        SessionProgress {
            position: self.current,
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_first: self.current == 0,
            is_last: self.current + 1 == total,
            is_complete: self.is_complete(),
        }
    }

    //
    // ─── COMMANDS ──────────────────────────────────────────────────────────────
    //

    /// Apply one command.
    ///
    /// Invalid requests come back as `CommandOutcome::Ignored` and leave the
    /// session unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` for any command other than `Complete`
    /// once the session has completed.
    pub fn apply(
        &mut self,
        command: SessionCommand,
        now: DateTime<Utc>,
    ) -> Result<CommandOutcome, SessionError> {
        match command {
            SessionCommand::Answer {
                position,
                selection,
            } => self.record_answer(position, Some(selection)),
            SessionCommand::ClearAnswer { position } => self.record_answer(position, None),
            SessionCommand::GoTo(position) => self.go_to(position, now),
            SessionCommand::Next => self.next(now),
            SessionCommand::Previous => self.previous(now),
            SessionCommand::Reset => self.reset_current(now),
            SessionCommand::Reveal => self.reveal(now),
            SessionCommand::Complete => Ok(CommandOutcome::Completed(self.complete(now).clone())),
        }
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_complete() {
            Err(SessionError::Completed)
        } else {
            Ok(())
        }
    }

    fn check_position(&self, position: usize) -> Result<(), UsageError> {
        if position < self.questions.len() {
            Ok(())
        } else {
            Err(UsageError::PositionOutOfRange {
                position,
                len: self.questions.len(),
            })
        }
    }

    /// Store (or with `None`, clear) the selection for `position`.
    ///
    /// Storing marks the position answered. Clearing removes the selection but
    /// leaves the answered flag as it was; `reset_current` clears both.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session has completed.
    pub fn record_answer(
        &mut self,
        position: usize,
        selection: Option<Selection>,
    ) -> Result<CommandOutcome, SessionError> {
        self.ensure_active()?;
        if let Err(e) = self.check_position(position) {
            return Ok(CommandOutcome::Ignored(e));
        }

        match selection {
            Some(selection) => {
                if let Err(e) = self.questions[position].accepts(&selection) {
                    return Ok(CommandOutcome::Ignored(e));
                }
                self.answers.insert(position, selection);
                self.answered.insert(position, true);
                Ok(CommandOutcome::AnswerRecorded { position })
            }
            None => {
                self.answers.remove(&position);
                Ok(CommandOutcome::AnswerCleared { position })
            }
        }
    }

    /// Move to `position`, stopping the outgoing timer and starting the incoming one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session has completed.
    pub fn go_to(
        &mut self,
        position: usize,
        now: DateTime<Utc>,
    ) -> Result<CommandOutcome, SessionError> {
        self.ensure_active()?;
        if let Err(e) = self.check_position(position) {
            return Ok(CommandOutcome::Ignored(e));
        }

        let from = self.current;
        self.timing.switch_to(position, now);
        self.current = position;
        self.revealed = false;
        Ok(CommandOutcome::Moved { from, to: position })
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session has completed.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<CommandOutcome, SessionError> {
        self.go_to(self.current + 1, now)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session has completed.
    pub fn previous(&mut self, now: DateTime<Utc>) -> Result<CommandOutcome, SessionError> {
        match self.current.checked_sub(1) {
            Some(position) => self.go_to(position, now),
            None => {
                self.ensure_active()?;
                Ok(CommandOutcome::Ignored(UsageError::PositionOutOfRange {
                    position: 0,
                    len: self.questions.len(),
                }))
            }
        }
    }

    /// Clear the current answer and its answered flag and restart the question timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session has completed.
    pub fn reset_current(&mut self, now: DateTime<Utc>) -> Result<CommandOutcome, SessionError> {
        self.ensure_active()?;
        let position = self.current;
        self.answers.remove(&position);
        self.answered.remove(&position);
        self.revealed = false;
        self.timing.switch_to(position, now);
        Ok(CommandOutcome::Reset { position })
    }

    /// Stop timing the current question and return its correct answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session has completed.
    pub fn reveal(&mut self, now: DateTime<Utc>) -> Result<CommandOutcome, SessionError> {
        self.ensure_active()?;
        self.timing.stop_question(now);
        self.revealed = true;

        let question = self.current_question();
        Ok(CommandOutcome::Revealed(RevealedAnswer {
            position: self.current,
            correct: question.correct().clone(),
            explanation: question.explanation().to_owned(),
        }))
    }

    /// Stop all timers and capture the results. Completing again returns the
    /// snapshot taken the first time.
    pub fn complete(&mut self, now: DateTime<Utc>) -> &ResultsSnapshot {
        let timing = &mut self.timing;
        let questions = &self.questions;
        let answers = &self.answers;
        self.results.get_or_insert_with(|| {
            timing.stop_question(now);
            let total_time = timing.stop_total(now).unwrap_or(0);
            ResultsSnapshot {
                questions: questions.questions().to_vec(),
                answers: answers.clone(),
                question_times: timing.question_times().to_vec(),
                total_time,
                completed_at: now,
            }
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("active_timer", &self.timing.active_question())
            .field("revealed", &self.revealed)
            .field("completed", &self.is_complete())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
