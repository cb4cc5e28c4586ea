use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use quiz_core::model::{AnswerRecord, QuestionId};

/// Fixed keys of the durable quiz storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    QuizConfig,
    QuizProgress,
    QuizResults,
    TimerState,
}

impl StorageKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::QuizConfig => "quizConfig",
            StorageKey::QuizProgress => "quizProgress",
            StorageKey::QuizResults => "quizResults",
            StorageKey::TimerState => "timerState",
        }
    }
}

/// Persisted shape of an in-progress attempt (`quizProgress`), timers excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub current_question: usize,
    pub total_questions: usize,
    #[serde(default)]
    pub answers: AnswerRecord,
    #[serde(default)]
    pub question_states: BTreeMap<usize, bool>,
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Dataset ids of the sampled questions, in order, so the same set can be
    /// rebuilt on resume. Older records without it cannot be resumed.
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,
    /// The current question's answer was shown and its timer stopped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub revealed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Selection;
    use quiz_core::time::fixed_now;

    #[test]
    fn progress_record_uses_storage_field_names() {
        let record = ProgressRecord {
            current_question: 2,
            total_questions: 3,
            answers: AnswerRecord::from([(0, Selection::single(1))]),
            question_states: BTreeMap::from([(0, true)]),
            timestamp: fixed_now(),
            question_ids: vec![QuestionId::new(9), QuestionId::new(4), QuestionId::new(1)],
            revealed: true,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["currentQuestion"], 2);
        assert_eq!(value["questionStates"]["0"], true);
        assert_eq!(value["timestamp"], fixed_now().timestamp_millis());
        assert_eq!(value["questionIds"], serde_json::json!([9, 4, 1]));
        assert_eq!(value["revealed"], true);

        let back: ProgressRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn legacy_progress_without_ids_still_parses() {
        let back: ProgressRecord = serde_json::from_str(
            r#"{"currentQuestion":1,"totalQuestions":2,"answers":{"0":[0,1]},
                "questionStates":{"0":true},"timestamp":1700000000000}"#,
        )
        .unwrap();
        assert!(back.question_ids.is_empty());
        assert!(!back.revealed);
        assert_eq!(back.answers.get(&0), Some(&Selection::multiple([0, 1])));
    }
}
