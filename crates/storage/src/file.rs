//! JSON file backend.
//!
//! The history is a pretty-printed JSON array (tab indentation) of
//! [`AnswerRecord`]s. Writes go to a sibling temp file that is then
//! renamed over the target, so a crash never leaves a half-written file.

use async_trait::async_trait;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::record::AnswerRecord;
use crate::traits::HistoryStore;

/// File name of the history in the user's home directory.
pub const DEFAULT_FILE_NAME: &str = ".nits_data";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    /// `~/.nits_data`, if a home directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        if source.kind() == ErrorKind::NotFound && path == self.path {
            StorageError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    fn encode(&self, records: &[AnswerRecord]) -> Result<Vec<u8>, StorageError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        records
            .serialize(&mut ser)
            .map_err(|e| StorageError::Backend(format!("cannot encode history: {}", e)))?;
        Ok(out)
    }
}

#[async_trait]
impl HistoryStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<AnswerRecord>, StorageError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.io_error(&self.path, e))?;
        let records: Vec<AnswerRecord> =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::Malformed {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "loaded history");
        Ok(records)
    }

    async fn save(&self, records: &[AnswerRecord]) -> Result<(), StorageError> {
        let bytes = self.encode(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(parent, e))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "saved history");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent"));
        assert!(store.load().await.unwrap_err().is_not_found());
        assert!(store.load_or_empty().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }), "{err}");
    }

    #[tokio::test]
    async fn written_file_uses_tabs_and_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history");
        let store = JsonFileStore::new(&path);
        store
            .save(&[AnswerRecord::new("q1", None, true)])
            .await
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\t{"));
        assert!(text.contains("\"shortName\": \"q1\""));
        assert!(text.contains("\"subQuestion\": \"\""));
        assert!(!dir.path().join("nested").join("history.tmp").exists());
    }
}
