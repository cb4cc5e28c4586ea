use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use quiz_core::model::QuestionKind;
use quiz_core::scoring::OutcomeStatus;
use quiz_core::time::format_elapsed;
use services::{QuizSession, RevealedAnswer, ScoredResults};

// ─── QUESTION ──────────────────────────────────────────────────────────────────

/// Current question with its options, progress line and timers.
pub fn question(session: &QuizSession, now: DateTime<Utc>) -> String {
    let progress = session.progress();
    let question = session.current_question();
    let selection = session.answer(progress.position);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", navigation(session));
    let _ = writeln!(
        out,
        "Question {} of {}  |  answered {}/{} ({}%)  |  total {}  |  this question {}",
        progress.position + 1,
        progress.total,
        progress.answered,
        progress.total,
        progress.completion_percentage(),
        format_elapsed(session.timing().total_elapsed(now)),
        format_elapsed(session.timing().current_question_elapsed(now).unwrap_or(0)),
    );
    let hint = match question.kind() {
        QuestionKind::Single => "choose one",
        QuestionKind::Multiple => "choose all that apply",
    };
    let _ = writeln!(out, "{}  ({hint})", question.text());
    for (index, option) in question.options().iter().enumerate() {
        let marker = if selection.is_some_and(|s| s.contains(index)) {
            "[x]"
        } else {
            "[ ]"
        };
        let _ = writeln!(out, "  {marker} {}) {option}", index + 1);
    }
    if session.is_answered(progress.position) && selection.is_none() {
        let _ = writeln!(out, "  (answer cleared)");
    }
    out
}

/// One cell per position: `*` marks the current question, `✓` one that was answered.
fn navigation(session: &QuizSession) -> String {
    let current = session.current_position();
    (0..session.total_questions())
        .map(|position| {
            let mark = if position == current {
                '*'
            } else if session.is_answered(position) {
                '✓'
            } else {
                ' '
            };
            format!("[{}{mark}]", position + 1)
        })
        .collect()
}

/// Current question text with its keywords wrapped in `*`.
pub fn keywords(session: &QuizSession) -> String {
    let question = session.current_question();
    if question.keywords().is_empty() {
        return "No keywords for this question.\n".to_string();
    }
    format!("{}\n", highlight_keywords(question.text(), question.keywords()))
}

/// Wrap whole-word, case-insensitive keyword matches in `*`.
fn highlight_keywords(text: &str, keywords: &[String]) -> String {
    // ASCII lowercasing keeps byte offsets, so matches index `text` directly.
    let haystack = text.to_ascii_lowercase();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for keyword in keywords {
        let needle = keyword.trim().to_ascii_lowercase();
        if needle.is_empty() {
            continue;
        }
        for (start, _) in haystack.match_indices(&needle) {
            let end = start + needle.len();
            if is_whole_word(text, start, end) {
                spans.push((start, end));
            }
        }
    }
    spans.sort_unstable();

    let mut out = String::with_capacity(text.len() + spans.len() * 2);
    let mut cursor = 0;
    for (start, end) in spans {
        if start < cursor {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push('*');
        out.push_str(&text[start..end]);
        out.push('*');
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let word = |c: char| c.is_alphanumeric() || c == '_';
    !text[..start].chars().next_back().is_some_and(word)
        && !text[end..].chars().next().is_some_and(word)
}

pub fn revealed(session: &QuizSession, answer: &RevealedAnswer) -> String {
    let options = session.questions()[answer.position].options();
    let mut out = String::from("Correct answer:\n");
    for &index in &answer.correct {
        if let Some(option) = options.get(index) {
            let _ = writeln!(out, "  {}) {option}", index + 1);
        }
    }
    let _ = writeln!(out, "{}", answer.explanation);
    out
}

// ─── RESULTS ───────────────────────────────────────────────────────────────────

pub fn results(scored: &ScoredResults) -> String {
    let report = &scored.report;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\nScore: {}/{} ({}%)",
        report.correct, report.total, report.percentage
    );
    let _ = writeln!(
        out,
        "Answered {} of {} ({}%), {} incorrect, {} unanswered",
        report.answered,
        report.total,
        report.completion_percentage,
        report.incorrect,
        report.unanswered
    );
    let _ = writeln!(
        out,
        "Total time {}  |  average {} per question",
        format_elapsed(report.total_time_ms),
        format_elapsed(report.average_per_question_ms)
    );
    if let Some(stats) = report.time_stats {
        let _ = writeln!(
            out,
            "Fastest {}  |  slowest {}  |  mean {}",
            format_elapsed(stats.fastest_ms),
            format_elapsed(stats.slowest_ms),
            format_elapsed(stats.mean_ms)
        );
    }

    for (outcome, question) in report.outcomes.iter().zip(&scored.snapshot.questions) {
        let mark = match outcome.status {
            OutcomeStatus::Correct => "correct",
            OutcomeStatus::Incorrect => "wrong",
            OutcomeStatus::Unanswered => "skipped",
        };
        let _ = writeln!(
            out,
            "{:>3}. [{mark:^7}] {}  ({})",
            outcome.position + 1,
            question.text(),
            format_elapsed(outcome.elapsed_ms)
        );
        if outcome.status != OutcomeStatus::Correct {
            let correct: Vec<String> = question
                .correct()
                .iter()
                .filter_map(|&i| question.options().get(i).cloned())
                .collect();
            let _ = writeln!(out, "       answer: {}", correct.join("; "));
            let _ = writeln!(out, "       {}", question.explanation());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{
        AnswerRecord, Question, QuestionId, QuestionSet, ResultsSnapshot, Selection,
    };
    use quiz_core::scoring::score;
    use quiz_core::time::fixed_now;

    fn questions() -> Vec<Question> {
        vec![
            Question::new(
                QuestionId::new(1),
                QuestionKind::Single,
                "Capital of France?",
                vec!["Paris".into(), "Rome".into()],
                [0],
                "Paris it is.",
            )
            .unwrap(),
            Question::new(
                QuestionId::new(2),
                QuestionKind::Multiple,
                "Even numbers?",
                vec!["1".into(), "2".into(), "4".into()],
                [1, 2],
                "2 and 4.",
            )
            .unwrap(),
        ]
    }

    #[test]
    fn question_marks_selected_options_and_timers() {
        let mut session =
            QuizSession::initialize(QuestionSet::from_questions(questions()), fixed_now()).unwrap();
        session.record_answer(0, Some(Selection::single(0))).unwrap();

        let text = question(&session, fixed_now() + Duration::seconds(65));
        assert!(text.contains("Question 1 of 2"));
        assert!(text.contains("answered 1/2 (50%)"));
        assert!(text.contains("total 01:05"));
        assert!(text.contains("[x] 1) Paris"));
        assert!(text.contains("[ ] 2) Rome"));
        assert!(text.contains("[1*][2 ]"));
    }

    #[test]
    fn navigation_marks_current_and_answered_positions() {
        let mut session = QuizSession::initialize(
            QuestionSet::from_questions(vec![
                questions()[0].clone(),
                questions()[1].clone(),
                questions()[0].clone(),
            ]),
            fixed_now(),
        )
        .unwrap();
        session.record_answer(0, Some(Selection::single(1))).unwrap();
        session.go_to(2, fixed_now()).unwrap();

        assert_eq!(navigation(&session), "[1✓][2 ][3*]");
    }

    #[test]
    fn keywords_are_highlighted_as_whole_words() {
        let keywords = ["rust".to_string(), "own".to_string()];
        assert_eq!(
            highlight_keywords("Rust owns memory; rust's owner is Rust.", &keywords),
            "*Rust* owns memory; *rust*'s owner is *Rust*."
        );
        assert_eq!(highlight_keywords("Nothing here", &keywords), "Nothing here");
    }

    #[test]
    fn keywords_view_uses_current_question() {
        let question = questions()[0]
            .clone()
            .with_keywords(["capital".to_string(), "france".to_string()]);
        let plain = questions()[1].clone();
        let mut session = QuizSession::initialize(
            QuestionSet::from_questions(vec![question, plain]),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(keywords(&session), "*Capital* of *France*?\n");
        session.next(fixed_now()).unwrap();
        assert_eq!(keywords(&session), "No keywords for this question.\n");
    }

    #[test]
    fn results_list_misses_with_explanations() {
        let snapshot = ResultsSnapshot {
            questions: questions(),
            answers: AnswerRecord::from([(0, Selection::single(0)), (1, Selection::multiple([1]))]),
            question_times: vec![Some(4_000), Some(6_000)],
            total_time: 12_000,
            completed_at: fixed_now(),
        };
        let report = score(&snapshot);
        let text = results(&ScoredResults { snapshot, report });

        assert!(text.contains("Score: 1/2 (50%)"));
        assert!(text.contains("Total time 00:12"));
        assert!(text.contains("Fastest 00:04"));
        assert!(text.contains("answer: 2; 4"));
        assert!(text.contains("2 and 4."));
        assert!(!text.contains("Paris it is."));
    }
}
