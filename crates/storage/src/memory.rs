use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::record::AnswerRecord;
use crate::traits::HistoryStore;

/// In-memory store. Clones share the same history.
///
/// Used by tests and by sessions run with saving disabled.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Option<Vec<AnswerRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `records`.
    pub fn with_records(records: Vec<AnswerRecord>) -> Self {
        MemoryStore {
            inner: Arc::new(Mutex::new(Some(records))),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn load(&self) -> Result<Vec<AnswerRecord>, StorageError> {
        self.inner
            .lock()
            .await
            .clone()
            .ok_or_else(|| StorageError::NotFound {
                path: "<memory>".into(),
            })
    }

    async fn save(&self, records: &[AnswerRecord]) -> Result<(), StorageError> {
        *self.inner.lock().await = Some(records.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
