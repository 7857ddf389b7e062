use std::future::Future;

use super::TestResult;
use crate::{HistoryStore, StorageError};

pub(super) async fn run_load_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "load",
            "empty_store_is_not_found",
            empty_store_is_not_found(factory).await,
        ),
        TestResult::from_result(
            "load",
            "load_or_empty_on_empty_store",
            load_or_empty_on_empty_store(factory).await,
        ),
        TestResult::from_result(
            "load",
            "saved_empty_history_loads_empty",
            saved_empty_history_loads_empty(factory).await,
        ),
    ]
}

async fn empty_store_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    match store.load().await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        Err(e) => Err(format!("expected NotFound, got error: {}", e)),
        Ok(records) => Err(format!("expected NotFound, got {} records", records.len())),
    }
}

async fn load_or_empty_on_empty_store<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let records = store.load_or_empty().await.map_err(|e| e.to_string())?;
    if !records.is_empty() {
        return Err(format!("expected no records, got {}", records.len()));
    }
    Ok(())
}

async fn saved_empty_history_loads_empty<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store.save(&[]).await.map_err(|e| e.to_string())?;
    let records = store.load().await.map_err(|e| e.to_string())?;
    if !records.is_empty() {
        return Err(format!("expected no records, got {}", records.len()));
    }
    Ok(())
}
