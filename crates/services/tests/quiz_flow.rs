use std::sync::Arc;

use chrono::Duration;
use quiz_core::config::{QuizConfig, QuizPreset};
use quiz_core::model::{Question, QuestionKind, Selection};
use quiz_core::time::fixed_now;
use services::{AppServices, Clock, CommandOutcome, SessionCommand, StaticDatasetSource};
use storage::repository::Storage;

const DATASET: &str = r#"{"questions": [
    {"id": 1, "type": "single", "question": "Q1",
      "options": ["a", "b", "c"], "correct": [0], "explanation": "E1"},
    {"id": 2, "type": "single", "question": "Q2",
      "options": ["a", "b", "c"], "correct": [1], "explanation": "E2"},
    {"id": 3, "type": "multiple", "question": "Q3",
      "options": ["a", "b", "c"], "correct": [0, 2], "explanation": "E3"},
    {"id": 4, "question": "missing fields"}
]}"#;

fn services_at(storage: &Storage, secs: i64) -> AppServices {
    let source = StaticDatasetSource::new().with_file("questions.json", DATASET);
    AppServices::new(
        storage,
        Arc::new(source),
        Clock::fixed(fixed_now() + Duration::seconds(secs)),
    )
}

fn correct_answer(question: &Question) -> Selection {
    match question.kind() {
        QuestionKind::Single => {
            Selection::single(question.correct().iter().copied().next().unwrap())
        }
        QuestionKind::Multiple => Selection::multiple(question.correct().iter().copied()),
    }
}

#[tokio::test]
async fn quiz_flow_resumes_and_scores() {
    let storage = Storage::in_memory();
    let start = services_at(&storage, 0);
    start
        .quiz_loop()
        .configure(&QuizConfig::new(10, "questions.json", fixed_now()))
        .await
        .unwrap();

    // Only three valid questions exist, so the request is truncated.
    let mut session = start.quiz_loop().initialize().await.unwrap().session;
    assert_eq!(session.total_questions(), 3);
    assert!(session.questions().is_truncated());

    // Answer the first question correctly and move on.
    let first = session.current_question().clone();
    let answer = correct_answer(&first);
    let outcome = services_at(&storage, 4)
        .quiz_loop()
        .apply(
            &mut session,
            SessionCommand::Answer {
                position: 0,
                selection: answer,
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::AnswerRecorded { position: 0 });
    services_at(&storage, 6)
        .quiz_loop()
        .apply(&mut session, SessionCommand::Next)
        .await
        .unwrap();
    drop(session);

    // A restart picks up where the attempt left off.
    let restarted = services_at(&storage, 30);
    let resumed = restarted.quiz_loop().initialize().await.unwrap();
    assert!(resumed.resumed);
    let mut session = resumed.session;
    assert_eq!(session.current_position(), 1);
    assert_eq!(session.questions()[0].id(), first.id());
    assert!(session.is_answered(0));
    assert_eq!(session.timing().question_elapsed(0), Some(6_000));

    let finish = services_at(&storage, 40).quiz_loop();
    let CommandOutcome::Completed(snapshot) = finish
        .apply(&mut session, SessionCommand::Complete)
        .await
        .unwrap()
    else {
        panic!("expected completion");
    };
    assert_eq!(snapshot.total_time, 40_000);
    assert_eq!(snapshot.question_times[1], Some(10_000));

    let again = finish
        .apply(&mut session, SessionCommand::Complete)
        .await
        .unwrap();
    assert_eq!(again, CommandOutcome::Completed(snapshot.clone()));

    let scored = restarted.results().latest().await.unwrap().unwrap();
    assert_eq!(scored.snapshot, snapshot);
    assert_eq!(scored.report.total, 3);
    assert_eq!(scored.report.correct, 1);
    assert_eq!(scored.report.unanswered, 2);
    assert_eq!(scored.report.percentage, 33);
    assert!(restarted.quiz_loop().saved_progress().await.unwrap().is_none());
}

#[tokio::test]
async fn reconfiguring_discards_progress() {
    let storage = Storage::in_memory();
    let services = services_at(&storage, 0);
    let quiz_loop = services.quiz_loop();
    quiz_loop
        .configure(&QuizConfig::new(2, "questions.json", fixed_now()))
        .await
        .unwrap();
    let mut session = quiz_loop.initialize().await.unwrap().session;
    quiz_loop
        .apply(&mut session, SessionCommand::Next)
        .await
        .unwrap();
    assert!(quiz_loop.saved_progress().await.unwrap().is_some());

    let mut config = QuizConfig::from_preset(QuizPreset::Quiz1, fixed_now());
    config.data_file = "questions.json".to_string();
    quiz_loop.configure(&config).await.unwrap();
    assert!(quiz_loop.saved_progress().await.unwrap().is_none());

    let start = quiz_loop.initialize().await.unwrap();
    assert!(!start.resumed);
    assert_eq!(start.session.current_position(), 0);
}

#[tokio::test]
async fn missing_dataset_is_reported() {
    let storage = Storage::in_memory();
    let quiz_loop = services_at(&storage, 0).quiz_loop();
    quiz_loop
        .configure(&QuizConfig::new(5, "other.json", fixed_now()))
        .await
        .unwrap();
    let err = quiz_loop.initialize().await.unwrap_err();
    assert!(matches!(
        err,
        services::QuizServiceError::Load(quiz_core::LoadError::Unreachable(_))
    ));
}
