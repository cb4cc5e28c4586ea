use chrono::{DateTime, Utc};

use quiz_core::model::QuestionSet;
use quiz_core::timing::{TimerSnapshot, TimingEngine};
use storage::ProgressRecord;

use super::service::QuizSession;
use crate::error::PersistenceError;

impl QuizSession {
    /// Rebuild an active session from saved progress and timer state.
    ///
    /// `questions` must be the set the progress was saved for, in the same
    /// order. The total timer keeps its saved start; earlier question times are
    /// kept and the current question's timer starts again at `now`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the record does not fit the question set.
    pub fn restore(
        questions: QuestionSet,
        progress: &ProgressRecord,
        timer: Option<&TimerSnapshot>,
        now: DateTime<Utc>,
    ) -> Result<Self, PersistenceError> {
        let len = questions.len();
        if progress.total_questions != len || len == 0 {
            return Err(PersistenceError::LengthMismatch {
                saved: progress.total_questions,
                actual: len,
            });
        }
        if progress.current_question >= len {
            return Err(PersistenceError::PositionOutOfRange {
                position: progress.current_question,
                len,
            });
        }
        for (&position, selection) in &progress.answers {
            let Some(question) = questions.get(position) else {
                return Err(PersistenceError::PositionOutOfRange { position, len });
            };
            question
                .accepts(selection)
                .map_err(|source| PersistenceError::InvalidAnswer { position, source })?;
        }

        let timing = match timer {
            Some(snapshot) => TimingEngine::restore(snapshot, len, now),
            None => {
                let mut timing = TimingEngine::new(len);
                timing.start_total(now);
                timing
            }
        };

        let answered = progress
            .question_states
            .iter()
            .filter(|&(&position, _)| position < len)
            .map(|(&position, &flag)| (position, flag))
            .collect();

        Ok(Self::from_parts(
            questions,
            progress.current_question,
            progress.answers.clone(),
            answered,
            timing,
            progress.revealed,
            now,
        ))
    }

    /// Progress record for the `quizProgress` key.
    #[must_use]
    pub fn progress_record(&self, now: DateTime<Utc>) -> ProgressRecord {
        ProgressRecord {
            current_question: self.current_position(),
            total_questions: self.total_questions(),
            answers: self.answers().clone(),
            question_states: self.answered_flags().clone(),
            timestamp: now,
            question_ids: self.questions().ids(),
            revealed: self.is_revealed(),
        }
    }
}
