//! Race-to-mastery question selection.

use nits_core::Content;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::EstimatorError;
use crate::estimator::SkillEstimator;
use crate::state::StudentState;
use crate::trace::train;

/// Outcome of one selection round.
#[derive(Debug)]
pub enum Selection {
    /// A staged question, returned once.
    Override(String),
    /// The eligible question with the highest average training score.
    Adaptive(String),
    /// Training failed; the first unburnt question in content order.
    Fallback {
        question: String,
        reason: EstimatorError,
    },
    /// Nothing left to ask.
    Exhausted,
}

impl Selection {
    pub fn question(&self) -> Option<&str> {
        match self {
            Selection::Override(q) | Selection::Adaptive(q) => Some(q),
            Selection::Fallback { question, .. } => Some(question),
            Selection::Exhausted => None,
        }
    }
}

/// An eligible question and its average training-concept score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub short_name: String,
    pub average: f64,
}

/// Unburnt questions with no training concepts or at least one
/// unmastered training concept, in content order.
pub fn candidates(content: &Content, state: &StudentState) -> Vec<Candidate> {
    content
        .questions()
        .iter()
        .filter(|q| !state.is_burnt(q.short_name()))
        .filter_map(|q| {
            let concepts = content.training_concepts(q, None).unwrap_or_default();
            if !concepts.is_empty() && concepts.iter().all(|c| state.is_mastered(c)) {
                return None;
            }
            Some(Candidate {
                short_name: q.short_name().to_string(),
                average: state.average_score(&concepts),
            })
        })
        .collect()
}

/// Candidates best first. Ties are broken by `rng`.
pub fn rank<R: Rng + ?Sized>(mut candidates: Vec<Candidate>, rng: &mut R) -> Vec<Candidate> {
    candidates.shuffle(rng);
    candidates.sort_by(|a, b| b.average.total_cmp(&a.average));
    candidates
}

/// Picks the next question to ask.
///
/// A staged override wins without training. Otherwise the scores are
/// refreshed from the full history; if that fails the first unburnt
/// question is returned together with the failure.
pub async fn select_question<R: Rng + ?Sized>(
    content: &Content,
    state: &mut StudentState,
    estimator: &dyn SkillEstimator,
    rng: &mut R,
) -> Selection {
    if let Some(question) = state.take_next() {
        tracing::debug!(question = %question, "using staged question");
        return Selection::Override(question);
    }

    match train(content, state.answers(), estimator).await {
        Ok(scores) => state.set_scores(scores),
        Err(reason) => {
            tracing::warn!(error = %reason, "training failed, selecting without scores");
            return content
                .questions()
                .iter()
                .find(|q| !state.is_burnt(q.short_name()))
                .map_or(Selection::Exhausted, |q| Selection::Fallback {
                    question: q.short_name().to_string(),
                    reason,
                });
        }
    }

    let ranked = rank(candidates(content, state), rng);
    for candidate in &ranked {
        tracing::debug!(question = %candidate.short_name, average = candidate.average, "candidate");
    }
    ranked
        .into_iter()
        .next()
        .map_or(Selection::Exhausted, |c| Selection::Adaptive(c.short_name))
}
