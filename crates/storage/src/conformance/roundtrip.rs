use std::future::Future;

use super::{sample_history, TestResult};
use crate::{AnswerRecord, HistoryStore};

pub(super) async fn run_roundtrip_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "roundtrip",
            "save_then_load_preserves_order",
            save_then_load_preserves_order(factory).await,
        ),
        TestResult::from_result(
            "roundtrip",
            "sub_question_tags_survive",
            sub_question_tags_survive(factory).await,
        ),
        TestResult::from_result(
            "roundtrip",
            "second_save_replaces_first",
            second_save_replaces_first(factory).await,
        ),
    ]
}

async fn save_then_load_preserves_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let history = sample_history();
    store.save(&history).await.map_err(|e| e.to_string())?;
    let loaded = store.load().await.map_err(|e| e.to_string())?;
    if loaded != history {
        return Err(format!("expected {:?}, got {:?}", history, loaded));
    }
    Ok(())
}

async fn sub_question_tags_survive<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store
        .save(&sample_history())
        .await
        .map_err(|e| e.to_string())?;
    let loaded = store.load().await.map_err(|e| e.to_string())?;
    let tags: Vec<Option<&str>> = loaded.iter().map(AnswerRecord::sub_question).collect();
    let expected = vec![None, Some("causeInFact"), Some("defendants"), None];
    if tags != expected {
        return Err(format!("expected tags {:?}, got {:?}", expected, tags));
    }
    Ok(())
}

async fn second_save_replaces_first<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store
        .save(&sample_history())
        .await
        .map_err(|e| e.to_string())?;
    let replacement = vec![AnswerRecord::new("negligence_doctrines", None, true)];
    store.save(&replacement).await.map_err(|e| e.to_string())?;
    let loaded = store.load().await.map_err(|e| e.to_string())?;
    if loaded != replacement {
        return Err(format!("expected {:?}, got {:?}", replacement, loaded));
    }
    Ok(())
}
