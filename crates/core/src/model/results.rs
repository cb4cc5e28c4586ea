use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::question::Question;
use crate::model::selection::{AnswerRecord, Selection};

/// Immutable capture of a finished attempt, the input to scoring.
///
/// Field names follow the `quizResults` storage record. `answers`,
/// `questionTimes` and `totalTime` are read entry by entry: a malformed answer
/// is dropped (unanswered) and a malformed time becomes `None` or zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSnapshot {
    pub questions: Vec<Question>,
    #[serde(default, deserialize_with = "lenient_answers")]
    pub answers: AnswerRecord,
    /// Milliseconds per position; `None` for positions never timed.
    #[serde(default, deserialize_with = "lenient_times")]
    pub question_times: Vec<Option<u64>>,
    /// Milliseconds for the whole attempt.
    #[serde(default, deserialize_with = "lenient_total")]
    pub total_time: u64,
    pub completed_at: DateTime<Utc>,
}

impl ResultsSnapshot {
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Recorded time for a position, zero when missing.
    #[must_use]
    pub fn question_time(&self, position: usize) -> u64 {
        self.question_times
            .get(position)
            .copied()
            .flatten()
            .unwrap_or(0)
    }
}

fn millis(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64)
        }),
        _ => None,
    }
}

fn lenient_answers<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<AnswerRecord, D::Error> {
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(AnswerRecord::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| {
            let position = key.parse::<usize>().ok()?;
            let selection = Selection::deserialize(value).ok()?;
            Some((position, selection))
        })
        .collect())
}

fn lenient_times<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Option<u64>>, D::Error> {
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(entries.iter().map(millis).collect())
}

fn lenient_total<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(millis(&Value::deserialize(deserializer)?).unwrap_or(0))
}
