//! Skill estimation: the seam between the tracing engine and whatever
//! fits the knowledge-tracing model.
//!
//! An estimator receives the full answer history as [`TraceRow`]s and
//! returns, for every row, the predicted mastery probability of each of
//! that row's concepts after the answer.

mod hmm;
mod trainhmm;

use async_trait::async_trait;
use serde::Deserialize;

pub use hmm::{InProcessBkt, DEFAULT_ITERATIONS};
pub use trainhmm::{TrainHmm, DEFAULT_TIMEOUT};

use crate::error::EstimatorError;
use crate::trace::TraceRow;

/// Per-row predictions, aligned with the input rows. Inner vectors are
/// aligned with each row's concept list.
pub type RowPredictions = Vec<Vec<f64>>;

#[async_trait]
pub trait SkillEstimator: Send + Sync {
    /// Fit the model to `rows` and predict mastery after each row.
    async fn fit(&self, rows: &[TraceRow]) -> Result<RowPredictions, EstimatorError>;

    /// Short name for logs and messages.
    fn name(&self) -> &str;
}

/// Initial probabilities of the two-state BKT model.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BktParams {
    /// Prior probability that the concept is already mastered.
    pub p_init: f64,
    /// Probability of moving to mastery after one practice opportunity.
    pub p_learn: f64,
    /// Probability that a mastered concept is applied incorrectly.
    pub p_slip: f64,
    /// Probability of a correct answer while not mastered.
    pub p_guess: f64,
}

impl Default for BktParams {
    fn default() -> Self {
        BktParams {
            p_init: 0.1,
            p_learn: 0.2,
            p_slip: 0.3,
            p_guess: 0.5,
        }
    }
}

impl BktParams {
    pub fn validate(&self) -> Result<(), EstimatorError> {
        let fields = [
            ("p_init", self.p_init),
            ("p_learn", self.p_learn),
            ("p_slip", self.p_slip),
            ("p_guess", self.p_guess),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(EstimatorError::InvalidParams {
                    message: format!("{} = {} is not a probability", name, value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_model() {
        let p = BktParams::default();
        assert_eq!((p.p_init, p.p_learn, p.p_slip, p.p_guess), (0.1, 0.2, 0.3, 0.5));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let p = BktParams {
            p_slip: 1.5,
            ..BktParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(EstimatorError::InvalidParams { .. })
        ));
    }
}
