//! Scoring for a finished attempt. Pure and infallible: anything malformed in a
//! snapshot counts as unanswered or zero.

use serde::Serialize;

use crate::model::{QuestionId, ResultsSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Correct,
    Incorrect,
    Unanswered,
}

/// Result for a single position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub position: usize,
    pub question_id: QuestionId,
    pub status: OutcomeStatus,
    pub elapsed_ms: u64,
}

/// Timing spread over the positions that have a non-zero recorded time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeStats {
    pub fastest_ms: u64,
    pub slowest_ms: u64,
    pub mean_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    pub outcomes: Vec<QuestionOutcome>,
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub answered: usize,
    /// `correct / total` as a percentage, rounded half up.
    pub percentage: u32,
    pub completion_percentage: u32,
    pub total_time_ms: u64,
    pub average_per_question_ms: u64,
    pub time_stats: Option<TimeStats>,
}

/// Score a finished attempt.
#[must_use]
pub fn score(snapshot: &ResultsSnapshot) -> ScoreReport {
    let outcomes: Vec<QuestionOutcome> = snapshot
        .questions
        .iter()
        .enumerate()
        .map(|(position, question)| {
            let status = match snapshot.answers.get(&position) {
                None => OutcomeStatus::Unanswered,
                Some(selection) if question.is_correct(selection) => OutcomeStatus::Correct,
                Some(_) => OutcomeStatus::Incorrect,
            };
            QuestionOutcome {
                position,
                question_id: question.id(),
                status,
                elapsed_ms: snapshot.question_time(position),
            }
        })
        .collect();

    let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
    let total = outcomes.len();
    let correct = count(OutcomeStatus::Correct);
    let incorrect = count(OutcomeStatus::Incorrect);
    let unanswered = count(OutcomeStatus::Unanswered);
    let answered = correct + incorrect;

    let timed: Vec<u64> = outcomes
        .iter()
        .map(|o| o.elapsed_ms)
        .filter(|&ms| ms > 0)
        .collect();

    ScoreReport {
        percentage: percent_round_half_up(correct, total),
        completion_percentage: percent_round_half_up(answered, total),
        total_time_ms: snapshot.total_time,
        average_per_question_ms: div_round_half_up(
            u128::from(snapshot.total_time),
            total as u128,
        ),
        time_stats: time_stats(&timed),
        outcomes,
        total,
        correct,
        incorrect,
        unanswered,
        answered,
    }
}

fn time_stats(timed: &[u64]) -> Option<TimeStats> {
    let fastest_ms = *timed.iter().min()?;
    let slowest_ms = *timed.iter().max()?;
    let sum: u128 = timed.iter().map(|&ms| u128::from(ms)).sum();
    Some(TimeStats {
        fastest_ms,
        slowest_ms,
        mean_ms: div_round_half_up(sum, timed.len() as u128),
    })
}

/// `part / whole * 100`, rounded half up; zero when `whole` is zero.
#[must_use]
pub fn percent_round_half_up(part: usize, whole: usize) -> u32 {
    let pct = div_round_half_up(part as u128 * 100, whole as u128);
    u32::try_from(pct).unwrap_or(u32::MAX)
}

/// Computed in `u128`; the quotient saturates at `u64::MAX`.
fn div_round_half_up(numerator: u128, denominator: u128) -> u64 {
    if denominator == 0 {
        return 0;
    }
    let quotient = (2 * numerator + denominator) / (2 * denominator);
    u64::try_from(quotient).unwrap_or(u64::MAX)
}
