//! The tutoring engine for one student session.

use std::sync::Arc;

use nits_core::{Case, Content, Question, SubQuestionKind};
use nits_storage::HistoryStore;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::TutorError;
use crate::estimator::SkillEstimator;
use crate::selection::{candidates, rank, select_question, Candidate, Selection};
use crate::state::StudentState;
use crate::subquestion::{CaseSession, SubQuestionPrompt};
use crate::trace::train;

/// Result of loading a stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restored {
    pub answers: usize,
    /// Records that no longer match the content.
    pub dropped: usize,
}

/// Content, student state, skill estimator and random source for one
/// session. The content is shared and never mutated.
pub struct Tutor {
    content: Arc<Content>,
    state: StudentState,
    estimator: Box<dyn SkillEstimator>,
    rng: StdRng,
}

impl Tutor {
    pub fn new(content: Arc<Content>, estimator: Box<dyn SkillEstimator>) -> Self {
        Tutor {
            content,
            state: StudentState::new(),
            estimator,
            rng: StdRng::from_entropy(),
        }
    }

    /// Makes tie-breaks, sub-question picks and option shuffles reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// A handle on the content that does not borrow the tutor.
    pub fn shared_content(&self) -> Arc<Content> {
        Arc::clone(&self.content)
    }

    pub fn state(&self) -> &StudentState {
        &self.state
    }

    pub fn estimator_name(&self) -> &str {
        self.estimator.name()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn question(&self, short_name: &str) -> Result<&Question, TutorError> {
        self.content
            .find_question(short_name)
            .ok_or_else(|| TutorError::UnknownQuestion(short_name.to_string()))
    }

    pub fn case(&self, short_name: &str) -> Result<&Case, TutorError> {
        self.question(short_name)?
            .as_case()
            .ok_or_else(|| TutorError::NotACase(short_name.to_string()))
    }

    // ── Selection ────────────────────────────────────────────────────

    pub async fn select(&mut self) -> Selection {
        select_question(
            &self.content,
            &mut self.state,
            self.estimator.as_ref(),
            &mut self.rng,
        )
        .await
    }

    /// Every current candidate, best first, scored by a fresh fit. An
    /// estimator failure is logged and the last scores are used.
    pub async fn ranked_candidates(&mut self) -> Vec<Candidate> {
        if let Err(e) = self.refresh_scores().await {
            tracing::debug!(error = %e, "ranking with previous scores");
        }
        rank(candidates(&self.content, &self.state), &mut self.rng)
    }

    /// Re-fits the skill model and stores the new scores.
    pub async fn refresh_scores(&mut self) -> Result<(), TutorError> {
        let scores = train(&self.content, self.state.answers(), self.estimator.as_ref()).await?;
        self.state.set_scores(scores);
        Ok(())
    }

    /// Stages `short_name` as the next selection.
    pub fn stage_next(&mut self, short_name: &str) -> Result<(), TutorError> {
        self.question(short_name)?;
        self.state.stage_next(short_name);
        Ok(())
    }

    // ── Answers ──────────────────────────────────────────────────────

    /// Records an answer. `sub_question` must be given for a case and
    /// only for a case.
    pub fn register_answer(
        &mut self,
        short_name: &str,
        sub_question: Option<SubQuestionKind>,
        correct: bool,
    ) -> Result<(), TutorError> {
        let question = self.question(short_name)?;
        match (question, sub_question) {
            (Question::Case(_), None) => {
                return Err(TutorError::MissingSubQuestion(short_name.to_string()))
            }
            (Question::MultipleChoice(_) | Question::Props(_), Some(_)) => {
                return Err(TutorError::NotACase(short_name.to_string()))
            }
            _ => {}
        }
        self.state.register_answer(short_name, sub_question, correct);
        Ok(())
    }

    /// Records a case sub-question answer and refits the skill model, so
    /// that sub-questions whose concepts are now mastered drop out of the
    /// case. If refitting fails the previous scores are kept.
    pub async fn register_sub_answer(
        &mut self,
        case_name: &str,
        kind: SubQuestionKind,
        correct: bool,
    ) -> Result<(), TutorError> {
        self.register_answer(case_name, Some(kind), correct)?;
        if let Err(e) = self.refresh_scores().await {
            tracing::warn!(case = case_name, error = %e, "keeping previous scores");
        }
        Ok(())
    }

    pub fn burn(&mut self, short_name: &str) -> Result<(), TutorError> {
        self.question(short_name)?;
        self.state.burn(short_name);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    // ── Cases ────────────────────────────────────────────────────────

    /// Next sub-question for `case_name`, or `None` when the session has
    /// nothing left to ask. Types the case has no material for are
    /// dropped from the session.
    pub fn next_sub_question(
        &mut self,
        case_name: &str,
        session: &mut CaseSession,
    ) -> Result<Option<SubQuestionPrompt>, TutorError> {
        let content = Arc::clone(&self.content);
        let case = content
            .find_question(case_name)
            .ok_or_else(|| TutorError::UnknownQuestion(case_name.to_string()))?
            .as_case()
            .ok_or_else(|| TutorError::NotACase(case_name.to_string()))?;

        while let Some(kind) = session.next(&content, &self.state, &mut self.rng) {
            match SubQuestionPrompt::instantiate(kind, case, &mut self.rng) {
                Some(prompt) => {
                    session.record_asked(kind);
                    return Ok(Some(prompt));
                }
                None => {
                    tracing::debug!(case = case_name, sub_question = %kind, "no material");
                    session.mark_unavailable(kind);
                }
            }
        }
        Ok(None)
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Replaces the session history with the stored one. An empty store
    /// is an empty history.
    pub async fn load(&mut self, store: &dyn HistoryStore) -> Result<Restored, TutorError> {
        let records = store.load_or_empty().await?;
        let dropped = self.state.restore(&records, &self.content);
        if dropped > 0 {
            tracing::info!(dropped, location = %store.location(), "ignored stale answers");
        }
        Ok(Restored {
            answers: self.state.answers().len(),
            dropped,
        })
    }

    pub async fn save(&self, store: &dyn HistoryStore) -> Result<(), TutorError> {
        store.save(&self.state.to_records()).await?;
        Ok(())
    }
}
