use std::path::PathBuf;
use std::time::Duration;

use nits_storage::StorageError;

/// Errors from a skill estimator.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// No usable `trainhmm` binary at any candidate location.
    #[error("cannot find a working trainhmm binary (tried: {})", display_paths(.tried))]
    NotFound { tried: Vec<PathBuf> },

    #[error("{}: not a regular file with read and execute permissions", .path.display())]
    NotExecutable { path: PathBuf },

    #[error("failed to start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("estimator exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The estimator did not finish in time. Scores are stale; retry later.
    #[error("estimator timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable predictions: {message}")]
    Prediction { message: String },

    #[error("invalid model parameters: {message}")]
    InvalidParams { message: String },
}

impl EstimatorError {
    /// True when retrying later may succeed without any change on the
    /// user's side.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EstimatorError::Timeout { .. })
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        EstimatorError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn prediction(message: impl Into<String>) -> Self {
        EstimatorError::Prediction {
            message: message.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from the tutoring engine.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    #[error("question {0} is not a case")]
    NotACase(String),

    #[error("answers to case {0} must name a sub-question")]
    MissingSubQuestion(String),

    #[error(transparent)]
    Estimator(#[from] EstimatorError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
