//! Per-session student state.

use std::collections::{BTreeMap, BTreeSet};

use nits_core::{ConceptId, Content, SubQuestionKind};
use nits_storage::AnswerRecord;

/// A concept counts as mastered once its score reaches this value.
pub const MASTERY_THRESHOLD: f64 = 0.95;

/// One registered answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub question: String,
    pub sub_question: Option<SubQuestionKind>,
    /// Correct on the first attempt.
    pub correct: bool,
}

impl Answer {
    pub fn new(question: &str, sub_question: Option<SubQuestionKind>, correct: bool) -> Self {
        Answer {
            question: question.to_string(),
            sub_question,
            correct,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StudentState {
    answers: Vec<Answer>,
    burnt: BTreeSet<String>,
    scores: BTreeMap<ConceptId, f64>,
    next_question: Option<String>,
}

impl StudentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers in the order they were given.
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn scores(&self) -> &BTreeMap<ConceptId, f64> {
        &self.scores
    }

    pub(crate) fn set_scores(&mut self, scores: BTreeMap<ConceptId, f64>) {
        self.scores = scores;
    }

    /// Appends an answer and retires its question for this session,
    /// whatever the outcome.
    pub fn register_answer(
        &mut self,
        question: &str,
        sub_question: Option<SubQuestionKind>,
        correct: bool,
    ) {
        self.answers.push(Answer::new(question, sub_question, correct));
        self.burn(question);
    }

    pub fn burn(&mut self, question: &str) {
        self.burnt.insert(question.to_string());
    }

    pub fn is_burnt(&self, question: &str) -> bool {
        self.burnt.contains(question)
    }

    /// Forgets everything: answers, burnt questions, scores and any
    /// staged next question.
    pub fn reset(&mut self) {
        *self = StudentState::default();
    }

    /// Score of a concept; unknown concepts score zero.
    pub fn score(&self, concept: &ConceptId) -> f64 {
        self.scores.get(concept).copied().unwrap_or(0.0)
    }

    pub fn is_mastered(&self, concept: &ConceptId) -> bool {
        self.score(concept) >= MASTERY_THRESHOLD
    }

    /// Mean score over `concepts`; zero for an empty list.
    pub fn average_score(&self, concepts: &[ConceptId]) -> f64 {
        if concepts.is_empty() {
            return 0.0;
        }
        concepts.iter().map(|c| self.score(c)).sum::<f64>() / concepts.len() as f64
    }

    /// Stages `question` to be returned by the next selection, once.
    pub fn stage_next(&mut self, question: &str) {
        self.next_question = Some(question.to_string());
    }

    pub(crate) fn take_next(&mut self) -> Option<String> {
        self.next_question.take()
    }

    pub fn to_records(&self) -> Vec<AnswerRecord> {
        self.answers
            .iter()
            .map(|a| AnswerRecord::new(&a.question, a.sub_question.map(|s| s.tag()), a.correct))
            .collect()
    }

    /// Replaces the history with `records`, dropping any that no longer
    /// resolve against `content`. Returns the number dropped.
    pub fn restore(&mut self, records: &[AnswerRecord], content: &Content) -> usize {
        self.reset();
        let mut dropped = 0;
        for record in records {
            match content.resolve_answer(&record.short_name, &record.sub_question) {
                Some((question, sub)) => {
                    let name = question.short_name().to_string();
                    self.register_answer(&name, sub, record.correct);
                }
                None => {
                    tracing::debug!(
                        question = %record.short_name,
                        sub_question = %record.sub_question,
                        "discarding stored answer"
                    );
                    dropped += 1;
                }
            }
        }
        dropped
    }
}
