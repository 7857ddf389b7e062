//! In-process two-state BKT model.
//!
//! Each concept gets its own hidden Markov model over the rows that
//! train it: state 0 is "not mastered", state 1 is "mastered", and
//! mastery is never forgotten. Parameters start from [`BktParams`] and
//! are refined with scaled Baum-Welch; predictions are the filtered
//! probability of mastery after each answer, one learning step ahead.

use std::collections::BTreeMap;

use async_trait::async_trait;
use nits_core::ConceptId;

use super::{BktParams, RowPredictions, SkillEstimator};
use crate::error::EstimatorError;
use crate::trace::TraceRow;

pub const DEFAULT_ITERATIONS: usize = 25;
const DEFAULT_TOLERANCE: f64 = 1e-6;

const MIN_PROB: f64 = 0.001;
const MAX_PROB: f64 = 0.999;
/// Slip and guess are capped so a model cannot flip its states.
const MAX_NOISE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct InProcessBkt {
    params: BktParams,
    iterations: usize,
    tolerance: f64,
}

impl InProcessBkt {
    pub fn new(params: BktParams) -> Self {
        InProcessBkt {
            params,
            iterations: DEFAULT_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Maximum EM iterations per concept; zero uses the initial
    /// parameters unchanged.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    fn fit_concept(&self, observations: &[bool]) -> Model {
        let mut model = Model::from(self.params);
        let mut previous = f64::NEG_INFINITY;
        for _ in 0..self.iterations {
            let (next, log_likelihood) = model.reestimate(observations);
            model = next;
            if (log_likelihood - previous).abs() < self.tolerance {
                break;
            }
            previous = log_likelihood;
        }
        model
    }
}

#[async_trait]
impl SkillEstimator for InProcessBkt {
    async fn fit(&self, rows: &[TraceRow]) -> Result<RowPredictions, EstimatorError> {
        self.params.validate()?;

        // Row indices per concept, in answer order.
        let mut by_concept: BTreeMap<&ConceptId, Vec<usize>> = BTreeMap::new();
        for (index, row) in rows.iter().enumerate() {
            for concept in &row.concepts {
                by_concept.entry(concept).or_default().push(index);
            }
        }

        let mut mastery: BTreeMap<(&ConceptId, usize), f64> = BTreeMap::new();
        for (concept, indices) in &by_concept {
            let observations: Vec<bool> = indices.iter().map(|&i| rows[i].correct).collect();
            let model = self.fit_concept(&observations);
            tracing::debug!(
                concept = %concept,
                p_init = model.p_init,
                p_learn = model.p_learn,
                p_slip = model.p_slip,
                p_guess = model.p_guess,
                "fitted concept"
            );
            for (&index, value) in indices.iter().zip(model.filter(&observations)) {
                mastery.insert((*concept, index), value);
            }
        }

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                row.concepts
                    .iter()
                    .map(|concept| {
                        mastery.get(&(concept, index)).copied().ok_or_else(|| {
                            EstimatorError::prediction(format!(
                                "no estimate for {} at row {}",
                                concept, index
                            ))
                        })
                    })
                    .collect()
            })
            .collect()
    }

    fn name(&self) -> &str {
        "in-process"
    }
}

// ── Model ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct Model {
    p_init: f64,
    p_learn: f64,
    p_slip: f64,
    p_guess: f64,
}

impl From<BktParams> for Model {
    fn from(p: BktParams) -> Self {
        Model {
            p_init: p.p_init,
            p_learn: p.p_learn,
            p_slip: p.p_slip,
            p_guess: p.p_guess,
        }
    }
}

impl Model {
    fn initial(&self) -> [f64; 2] {
        [1.0 - self.p_init, self.p_init]
    }

    fn transition(&self, from: usize, to: usize) -> f64 {
        match (from, to) {
            (0, 0) => 1.0 - self.p_learn,
            (0, _) => self.p_learn,
            (_, 0) => 0.0,
            _ => 1.0,
        }
    }

    fn emission(&self, state: usize, correct: bool) -> f64 {
        match (state, correct) {
            (0, true) => self.p_guess,
            (0, false) => 1.0 - self.p_guess,
            (_, true) => 1.0 - self.p_slip,
            (_, false) => self.p_slip,
        }
    }

    /// Probability of mastery after each observation, including the
    /// learning opportunity that observation provides.
    fn filter(&self, observations: &[bool]) -> Vec<f64> {
        let mut known = self.p_init;
        observations
            .iter()
            .map(|&correct| {
                let mastered = known * self.emission(1, correct);
                let unmastered = (1.0 - known) * self.emission(0, correct);
                let evidence = mastered + unmastered;
                // An impossible observation leaves the belief unchanged.
                let posterior = if evidence > 0.0 { mastered / evidence } else { known };
                known = posterior + (1.0 - posterior) * self.p_learn;
                known
            })
            .collect()
    }

    /// One Baum-Welch step. Returns the updated model and the log
    /// likelihood of `observations` under `self`.
    fn reestimate(&self, observations: &[bool]) -> (Model, f64) {
        let n = observations.len();
        if n == 0 {
            return (*self, 0.0);
        }

        // Scaled forward pass.
        let mut alpha = vec![[0.0; 2]; n];
        let mut scale = vec![0.0; n];
        for t in 0..n {
            for j in 0..2 {
                let prior: f64 = if t == 0 {
                    self.initial()[j]
                } else {
                    (0..2)
                        .map(|i| alpha[t - 1][i] * self.transition(i, j))
                        .sum()
                };
                alpha[t][j] = prior * self.emission(j, observations[t]);
            }
            scale[t] = alpha[t][0] + alpha[t][1];
            if scale[t] > 0.0 {
                alpha[t][0] /= scale[t];
                alpha[t][1] /= scale[t];
            }
        }

        // Scaled backward pass.
        let mut beta = vec![[1.0; 2]; n];
        for t in (0..n - 1).rev() {
            for i in 0..2 {
                let sum: f64 = (0..2)
                    .map(|j| {
                        self.transition(i, j)
                            * self.emission(j, observations[t + 1])
                            * beta[t + 1][j]
                    })
                    .sum();
                beta[t][i] = if scale[t + 1] > 0.0 { sum / scale[t + 1] } else { 0.0 };
            }
        }

        let gamma: Vec<[f64; 2]> = (0..n)
            .map(|t| {
                let g = [alpha[t][0] * beta[t][0], alpha[t][1] * beta[t][1]];
                let total = g[0] + g[1];
                if total > 0.0 {
                    [g[0] / total, g[1] / total]
                } else {
                    [0.5, 0.5]
                }
            })
            .collect();

        let mut learned = 0.0;
        let mut unmastered_before = 0.0;
        for t in 0..n - 1 {
            if scale[t + 1] > 0.0 {
                learned += alpha[t][0]
                    * self.transition(0, 1)
                    * self.emission(1, observations[t + 1])
                    * beta[t + 1][1]
                    / scale[t + 1];
            }
            unmastered_before += gamma[t][0];
        }

        let mut guessed = 0.0;
        let mut unmastered = 0.0;
        let mut slipped = 0.0;
        let mut mastered = 0.0;
        for (g, &correct) in gamma.iter().zip(observations) {
            unmastered += g[0];
            mastered += g[1];
            if correct {
                guessed += g[0];
            } else {
                slipped += g[1];
            }
        }

        let ratio = |num: f64, den: f64, fallback: f64| if den > 0.0 { num / den } else { fallback };
        let next = Model {
            p_init: gamma[0][1].clamp(MIN_PROB, MAX_PROB),
            p_learn: ratio(learned, unmastered_before, self.p_learn).clamp(MIN_PROB, MAX_PROB),
            p_slip: ratio(slipped, mastered, self.p_slip).clamp(MIN_PROB, MAX_NOISE),
            p_guess: ratio(guessed, unmastered, self.p_guess).clamp(MIN_PROB, MAX_NOISE),
        };
        let log_likelihood: f64 = scale.iter().map(|c| c.max(f64::MIN_POSITIVE).ln()).sum();
        (next, log_likelihood)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(correct: bool, concepts: &[&str]) -> TraceRow {
        TraceRow {
            correct,
            tag: "q".to_string(),
            concepts: concepts.iter().map(|c| ConceptId::from(*c)).collect(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn filter_matches_hand_computed_values() {
        let model = Model::from(BktParams::default());
        let values = model.filter(&[true, true, true]);
        assert!(close(values[0], 0.307692), "{values:?}");
        assert!(close(values[1], 0.506849), "{values:?}");
        assert!(close(values[2], 0.671982), "{values:?}");

        let wrong = model.filter(&[false]);
        assert!(close(wrong[0], 0.25), "{wrong:?}");
    }

    #[tokio::test]
    async fn impossible_observation_yields_finite_scores() {
        let params = BktParams {
            p_init: 0.0,
            p_guess: 1.0,
            ..BktParams::default()
        };
        let bkt = InProcessBkt::new(params).with_iterations(0);
        let predictions = bkt.fit(&[row(false, &["a"])]).await.unwrap();
        assert!(predictions[0][0].is_finite(), "{predictions:?}");
        assert!(close(predictions[0][0], params.p_learn));
    }

    #[tokio::test]
    async fn zero_iterations_uses_initial_parameters() {
        let bkt = InProcessBkt::new(BktParams::default()).with_iterations(0);
        let rows = vec![row(true, &["a"]), row(true, &["a", "b"])];
        let predictions = bkt.fit(&rows).await.unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(close(predictions[0][0], 0.307692));
        assert!(close(predictions[1][0], 0.506849));
        // "b" has seen one answer only.
        assert!(close(predictions[1][1], 0.307692));
    }

    #[tokio::test]
    async fn fitted_predictions_stay_probabilities() {
        let bkt = InProcessBkt::new(BktParams::default());
        let pattern = [false, true, false, true, true, true, true, true];
        let rows: Vec<TraceRow> = pattern.iter().map(|&c| row(c, &["a"])).collect();
        let predictions = bkt.fit(&rows).await.unwrap();
        for p in predictions.iter().flatten() {
            assert!((0.0..=1.0).contains(p), "{p}");
        }
        let last = predictions[pattern.len() - 1][0];
        assert!(last > predictions[0][0]);
    }

    #[test]
    fn reestimation_keeps_parameters_in_bounds() {
        let mut model = Model::from(BktParams::default());
        let obs = [true; 12];
        for _ in 0..50 {
            model = model.reestimate(&obs).0;
        }
        assert!((MIN_PROB..=MAX_PROB).contains(&model.p_init));
        assert!((MIN_PROB..=MAX_PROB).contains(&model.p_learn));
        assert!((MIN_PROB..=MAX_NOISE).contains(&model.p_slip));
        assert!((MIN_PROB..=MAX_NOISE).contains(&model.p_guess));
    }

    #[tokio::test]
    async fn invalid_params_are_rejected() {
        let bkt = InProcessBkt::new(BktParams {
            p_guess: -0.1,
            ..BktParams::default()
        });
        let err = bkt.fit(&[row(true, &["a"])]).await.unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidParams { .. }));
    }
}
