use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::AnswerRecord;

/// Durable storage for a student's answer history.
///
/// The history is an ordered list; `save` replaces whatever was stored
/// before with the full list, and `load` returns it in the same order.
///
/// Implementations must be `Send + Sync` so a store can be shared with
/// the tutor across async task boundaries.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the stored history.
    ///
    /// Returns `Err(StorageError::NotFound)` if nothing was ever saved and
    /// `Err(StorageError::Malformed)` if the stored data cannot be parsed.
    async fn load(&self) -> Result<Vec<AnswerRecord>, StorageError>;

    /// Replace the stored history with `records`.
    async fn save(&self, records: &[AnswerRecord]) -> Result<(), StorageError>;

    /// Human-readable location, for messages.
    fn location(&self) -> String;

    /// Like [`load`](HistoryStore::load), but an empty store is an empty history.
    async fn load_or_empty(&self) -> Result<Vec<AnswerRecord>, StorageError> {
        match self.load().await {
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }
}
