//! Builds the configured skill estimator.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use nits_tutor::{
    EstimatorError, InProcessBkt, RowPredictions, SkillEstimator, TraceRow, TrainHmm,
};

use crate::config::{EstimatorConfig, EstimatorKind};

/// Stands in for a `trainhmm` that could not be found, so the session
/// still runs and selection falls back to content order.
struct Unavailable {
    tried: Vec<PathBuf>,
}

#[async_trait]
impl SkillEstimator for Unavailable {
    async fn fit(&self, _rows: &[TraceRow]) -> Result<RowPredictions, EstimatorError> {
        Err(EstimatorError::NotFound {
            tried: self.tried.clone(),
        })
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

pub fn build(config: &EstimatorConfig) -> Box<dyn SkillEstimator> {
    match config.kind {
        EstimatorKind::InProcess => {
            Box::new(InProcessBkt::new(config.params).with_iterations(config.iterations))
        }
        EstimatorKind::Trainhmm => match TrainHmm::locate(config.trainhmm.as_deref()) {
            Ok(binary) => Box::new(
                TrainHmm::new(binary, config.params)
                    .with_timeout(Duration::from_secs(config.timeout_secs)),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "trainhmm unavailable");
                let tried = match e {
                    EstimatorError::NotFound { tried } => tried,
                    EstimatorError::NotExecutable { path } => vec![path],
                    _ => Vec::new(),
                };
                Box::new(Unavailable { tried })
            }
        },
    }
}
