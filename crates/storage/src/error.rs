use std::path::PathBuf;

/// All errors that can be returned by a `HistoryStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Nothing has been saved at this location yet.
    #[error("no stored history at {}", .path.display())]
    NotFound { path: PathBuf },

    /// The stored history exists but cannot be parsed.
    #[error("malformed stored history at {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backend-specific storage error.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
