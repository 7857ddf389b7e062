//! The external `trainhmm` binary from the standard BKT toolkit.
//!
//! Each fit writes the rows to a fresh temporary directory, runs the
//! binary with a two-state model and reads `predict.txt` back. The
//! directory is removed when the fit returns.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::{BktParams, RowPredictions, SkillEstimator};
use crate::error::EstimatorError;
use crate::trace::{TraceRow, CONCEPT_SEPARATOR};

/// Default wall-clock limit for one run of the binary.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const INPUT_FILE: &str = "input";
const MODEL_FILE: &str = "model.txt";
const PREDICT_FILE: &str = "predict.txt";

#[derive(Debug, Clone)]
pub struct TrainHmm {
    binary: PathBuf,
    params: BktParams,
    timeout: Duration,
}

impl TrainHmm {
    pub fn new(binary: PathBuf, params: BktParams) -> Self {
        TrainHmm {
            binary,
            params,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Finds a usable binary.
    ///
    /// An explicit path is the only candidate when given. Otherwise
    /// `trainhmm-<os>` next to the running executable is tried, then
    /// `~/standard-bkt/trainhmm`.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, EstimatorError> {
        if let Some(path) = explicit {
            check_candidate(path)?;
            tracing::info!(path = %path.display(), "using configured trainhmm");
            return Ok(path.to_path_buf());
        }

        let tried = candidates();
        for candidate in &tried {
            match check_candidate(candidate) {
                Ok(()) => {
                    tracing::info!(path = %candidate.display(), "found trainhmm");
                    return Ok(candidate.clone());
                }
                Err(e) => tracing::debug!(error = %e, "rejecting trainhmm candidate"),
            }
        }
        Err(EstimatorError::NotFound { tried })
    }

    async fn run(&self, dir: &Path) -> Result<(), EstimatorError> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg("-p")
            .arg("2")
            .arg("-0")
            .arg(initial_vector(&self.params))
            .arg("-d")
            .arg(CONCEPT_SEPARATOR)
            .arg(dir.join(INPUT_FILE))
            .arg(dir.join(MODEL_FILE))
            .arg(dir.join(PREDICT_FILE))
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| EstimatorError::Timeout {
                after: self.timeout,
            })?
            .map_err(|source| EstimatorError::Spawn {
                path: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EstimatorError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SkillEstimator for TrainHmm {
    async fn fit(&self, rows: &[TraceRow]) -> Result<RowPredictions, EstimatorError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let dir = tempfile::Builder::new()
            .prefix("nits")
            .tempdir()
            .map_err(|e| EstimatorError::io("creating work directory", e))?;

        let mut input = String::new();
        for row in rows {
            input.push_str(&row.to_line());
            input.push('\n');
        }
        tokio::fs::write(dir.path().join(INPUT_FILE), input)
            .await
            .map_err(|e| EstimatorError::io("writing trainhmm input", e))?;

        self.run(dir.path()).await?;

        let text = tokio::fs::read_to_string(dir.path().join(PREDICT_FILE))
            .await
            .map_err(|e| EstimatorError::io("reading predictions", e))?;
        let values = parse_predictions(&text, rows.len())?;

        Ok(rows
            .iter()
            .zip(values)
            .map(|(row, value)| vec![value; row.concepts.len()])
            .collect())
    }

    fn name(&self) -> &str {
        "trainhmm"
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        out.push(dir.join(format!("trainhmm-{}", std::env::consts::OS)));
    }
    if let Some(home) = dirs::home_dir() {
        out.push(home.join("standard-bkt").join("trainhmm"));
    }
    out
}

fn check_candidate(path: &Path) -> Result<(), EstimatorError> {
    let not_executable = || EstimatorError::NotExecutable {
        path: path.to_path_buf(),
    };
    let meta = std::fs::metadata(path).map_err(|_| not_executable())?;
    if !meta.is_file() {
        return Err(not_executable());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o555 != 0o555 {
            return Err(not_executable());
        }
    }
    Ok(())
}

/// `p_init,1.0,p_learn,1-p_slip,p_guess` with six decimals, the
/// layout `trainhmm -0` expects.
fn initial_vector(p: &BktParams) -> String {
    format!(
        "{:.6},1.0,{:.6},{:.6},{:.6}",
        p.p_init,
        p.p_learn,
        1.0 - p.p_slip,
        p.p_guess
    )
}

/// One mastery value per row.
///
/// Lines are tab-separated. When the first column is exactly `1.0` the
/// value is in the second column, otherwise in the third.
fn parse_predictions(text: &str, rows: usize) -> Result<Vec<f64>, EstimatorError> {
    let mut lines = text.lines();
    let mut values = Vec::with_capacity(rows);
    for row in 0..rows {
        let line = lines
            .next()
            .ok_or_else(|| EstimatorError::prediction(format!("unexpected end at row {}", row)))?;
        let words: Vec<&str> = line.split('\t').collect();
        let first = parse_column(&words, 0, row)?;
        let column = if first == 1.0 { 1 } else { 2 };
        values.push(parse_column(&words, column, row)?);
    }
    Ok(values)
}

fn parse_column(words: &[&str], column: usize, row: usize) -> Result<f64, EstimatorError> {
    let word = words.get(column).ok_or_else(|| {
        EstimatorError::prediction(format!("row {} has no column {}", row, column))
    })?;
    word.trim().parse::<f64>().map_err(|e| {
        EstimatorError::prediction(format!("row {} column {}: {:?}: {}", row, column, word, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_vector_uses_reference_layout() {
        assert_eq!(
            initial_vector(&BktParams::default()),
            "0.100000,1.0,0.200000,0.700000,0.500000"
        );
    }

    #[test]
    fn predictions_pick_the_right_column() {
        let text = "0.6\t0.4\t0.35\n1.0\t0.97\n";
        assert_eq!(parse_predictions(text, 2).unwrap(), vec![0.35, 0.97]);
    }

    #[test]
    fn short_prediction_file_is_an_error() {
        let err = parse_predictions("0.6\t0.4\t0.35\n", 2).unwrap_err();
        assert!(matches!(err, EstimatorError::Prediction { .. }));
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = parse_predictions("0.6\t0.4\n", 1).unwrap_err();
        assert!(err.to_string().contains("no column 2"));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_predictions("abc\n", 1).is_err());
    }

    #[test]
    fn explicit_missing_binary_is_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrainHmm::locate(Some(&dir.path().join("trainhmm"))).unwrap_err();
        assert!(matches!(err, EstimatorError::NotExecutable { .. }));
    }

    #[test]
    fn directory_is_not_a_candidate() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_candidate(dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn permission_bits_are_checked() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainhmm");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(check_candidate(&path).is_err());

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(check_candidate(&path).is_ok());
        assert_eq!(TrainHmm::locate(Some(&path)).unwrap(), path);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fit_runs_the_binary_and_replicates_values() {
        use nits_core::ConceptId;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainhmm");
        // Last argument is the predictions path.
        let script = "#!/bin/sh\n\
            for last; do :; done\n\
            printf '0.5\\t0.5\\t0.25\\n1.0\\t0.9\\n' > \"$last\"\n";
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let rows = vec![
            TraceRow {
                correct: false,
                tag: "a".to_string(),
                concepts: vec![ConceptId::from("x"), ConceptId::from("y")],
            },
            TraceRow {
                correct: true,
                tag: "b".to_string(),
                concepts: vec![ConceptId::from("x")],
            },
        ];
        let estimator = TrainHmm::new(path, BktParams::default());
        let predictions = estimator.fit(&rows).await.unwrap();
        assert_eq!(predictions, vec![vec![0.25, 0.25], vec![0.9]]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_binary_reports_stderr() {
        use nits_core::ConceptId;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainhmm");
        std::fs::write(&path, "#!/bin/sh\necho boom >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let rows = vec![TraceRow {
            correct: true,
            tag: "a".to_string(),
            concepts: vec![ConceptId::from("x")],
        }];
        let err = TrainHmm::new(path, BktParams::default())
            .fit(&rows)
            .await
            .unwrap_err();
        match err {
            EstimatorError::Failed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
