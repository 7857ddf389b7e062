use std::sync::Arc;

use nits_core::catalog::standard_content;
use nits_core::SubQuestionKind;
use nits_storage::{AnswerRecord, HistoryStore, JsonFileStore, MemoryStore, StorageError};
use nits_tutor::{BktParams, InProcessBkt, Tutor, TutorError};

fn tutor() -> Tutor {
    let estimator = InProcessBkt::new(BktParams::default());
    Tutor::new(Arc::new(standard_content().unwrap()), Box::new(estimator)).with_seed(3)
}

#[tokio::test]
async fn history_round_trips_through_the_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("history.json"));

    let mut first = tutor();
    first.register_answer("foreseeability_basic", None, false).unwrap();
    first
        .register_answer("case_ashton_car_crash", Some(SubQuestionKind::PrimaFacie), true)
        .unwrap();
    first.register_answer("negligence_doctrines", None, true).unwrap();
    first.save(&store).await.unwrap();

    let mut second = tutor();
    let restored = second.load(&store).await.unwrap();
    assert_eq!(restored.answers, 3);
    assert_eq!(restored.dropped, 0);
    assert_eq!(second.state().answers(), first.state().answers());
    assert!(second.state().is_burnt("case_ashton_car_crash"));
}

#[tokio::test]
async fn stale_records_are_dropped_on_load() {
    let store = MemoryStore::with_records(vec![
        AnswerRecord::new("pure_comparative_negligence", None, true),
        AnswerRecord::new("retired_question", None, true),
        AnswerRecord::new("case_ashton_car_crash", Some("retiredSubQuestion"), false),
        AnswerRecord::new("case_ashton_car_crash", Some("defendants"), false),
    ]);

    let mut t = tutor();
    let restored = t.load(&store).await.unwrap();
    assert_eq!(restored.answers, 2);
    assert_eq!(restored.dropped, 2);

    t.save(&store).await.unwrap();
    assert_eq!(store.load().await.unwrap().len(), 2);
}

#[tokio::test]
async fn missing_file_is_an_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("absent.json"));
    let mut t = tutor();
    let restored = t.load(&store).await.unwrap();
    assert_eq!(restored.answers, 0);
}

#[tokio::test]
async fn malformed_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut t = tutor();
    t.register_answer("foreseeability_basic", None, true).unwrap();
    let err = t.load(&JsonFileStore::new(path)).await.unwrap_err();
    assert!(matches!(
        err,
        TutorError::Storage(StorageError::Malformed { .. })
    ));
    // The session keeps its state.
    assert_eq!(t.state().answers().len(), 1);
}

#[tokio::test]
async fn restored_history_trains_the_in_process_model() {
    let store = MemoryStore::with_records(vec![
        AnswerRecord::new("foreseeability_basic", None, true),
        AnswerRecord::new("negligence_doctrines", None, true),
    ]);
    let mut t = tutor();
    t.load(&store).await.unwrap();
    t.refresh_scores().await.unwrap();

    let score = t.state().score(&"foreseeability1".into());
    assert!(score > 0.0 && score < 1.0, "{score}");
}
