//! The content registry: concepts, questions and sub-question types.
//!
//! Content is assembled with a [`ContentBuilder`] in one explicit
//! registration pass and validated by [`ContentBuilder::build`]. The
//! resulting [`Content`] is immutable and can be shared between sessions.

use std::collections::{BTreeMap, BTreeSet};

use crate::concept::{Concept, ConceptId};
use crate::error::ContentError;
use crate::question::{Question, SubQuestionKind};

#[derive(Debug, Default)]
pub struct ContentBuilder {
    concepts: Vec<Concept>,
    questions: Vec<Question>,
    sub_questions: Vec<(SubQuestionKind, Vec<ConceptId>)>,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concept(&mut self, concept: Concept) -> &mut Self {
        self.concepts.push(concept);
        self
    }

    pub fn question(&mut self, question: Question) -> &mut Self {
        self.questions.push(question);
        self
    }

    /// Registers a sub-question type that cases can ask, with the
    /// concepts it trains.
    pub fn sub_question(&mut self, kind: SubQuestionKind, concepts: &[&str]) -> &mut Self {
        self.sub_questions
            .push((kind, concepts.iter().map(|c| ConceptId::new(*c)).collect()));
        self
    }

    /// Validates everything registered so far. The first violation wins.
    pub fn build(self) -> Result<Content, ContentError> {
        // ── Concepts ──
        let mut concept_index = BTreeMap::new();
        for (i, concept) in self.concepts.iter().enumerate() {
            if concept.id.as_str().is_empty() {
                return Err(ContentError::EmptyConceptId {
                    name: concept.name.clone(),
                });
            }
            if concept_index.insert(concept.id.clone(), i).is_some() {
                return Err(ContentError::DuplicateConcept {
                    id: concept.id.to_string(),
                });
            }
        }
        for concept in &self.concepts {
            if let Some(missing) = concept
                .related
                .iter()
                .find(|r| !concept_index.contains_key(*r))
            {
                return Err(ContentError::UnknownRelatedConcept {
                    concept: concept.id.to_string(),
                    related: missing.to_string(),
                });
            }
        }

        // ── Questions ──
        let mut question_index = BTreeMap::new();
        for (i, question) in self.questions.iter().enumerate() {
            question.check()?;
            let name = question.short_name().to_string();
            if question_index.insert(name.clone(), i).is_some() {
                return Err(ContentError::DuplicateQuestion { short_name: name });
            }
            let referenced = match question {
                Question::MultipleChoice(q) => q.all_concepts(),
                Question::Props(q) => q.all_concepts(),
                Question::Case(_) => BTreeSet::new(),
            };
            if let Some(missing) = referenced.iter().find(|c| !concept_index.contains_key(*c)) {
                return Err(ContentError::UnknownConcept {
                    short_name: name,
                    concept: missing.to_string(),
                });
            }
        }

        // ── Sub-questions ──
        let mut sub_questions = BTreeMap::new();
        for (kind, concepts) in self.sub_questions {
            if concepts.is_empty() {
                return Err(ContentError::SubQuestionWithoutConcepts {
                    tag: kind.tag().to_string(),
                });
            }
            if let Some(missing) = concepts.iter().find(|c| !concept_index.contains_key(*c)) {
                return Err(ContentError::UnknownConcept {
                    short_name: kind.tag().to_string(),
                    concept: missing.to_string(),
                });
            }
            if sub_questions.insert(kind, concepts).is_some() {
                return Err(ContentError::DuplicateSubQuestion {
                    tag: kind.tag().to_string(),
                });
            }
        }

        let mut content = Content {
            concepts: self.concepts,
            concept_index,
            questions: self.questions,
            question_index,
            sub_questions,
        };

        let mut sorted_related = Vec::with_capacity(content.concepts.len());
        for concept in &content.concepts {
            sorted_related.push(content.sort_by_name(concept.related.iter().cloned()));
        }
        for (concept, related) in content.concepts.iter_mut().zip(sorted_related) {
            concept.related = related;
        }

        for case in content.questions.iter().filter_map(Question::as_case) {
            case.preprocess();
        }

        tracing::debug!(
            concepts = content.concepts.len(),
            questions = content.questions.len(),
            sub_questions = content.sub_questions.len(),
            "content registered"
        );
        Ok(content)
    }
}

/// Immutable, validated content.
#[derive(Debug, Clone)]
pub struct Content {
    concepts: Vec<Concept>,
    concept_index: BTreeMap<ConceptId, usize>,
    questions: Vec<Question>,
    question_index: BTreeMap<String, usize>,
    sub_questions: BTreeMap<SubQuestionKind, Vec<ConceptId>>,
}

impl Content {
    /// Questions in registration order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn find_question(&self, short_name: &str) -> Option<&Question> {
        self.question_index
            .get(short_name)
            .map(|i| &self.questions[*i])
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn concept(&self, id: &ConceptId) -> Option<&Concept> {
        self.concept_index.get(id).map(|i| &self.concepts[*i])
    }

    /// Looks a concept up by short id, then by name (case-insensitive).
    pub fn find_concept(&self, name_or_id: &str) -> Option<&Concept> {
        self.concept(&ConceptId::new(name_or_id)).or_else(|| {
            self.concepts
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name_or_id))
        })
    }

    /// Registered sub-question types, in tag order.
    pub fn sub_question_kinds(&self) -> impl Iterator<Item = SubQuestionKind> + '_ {
        self.sub_questions.keys().copied()
    }

    pub fn sub_question_concepts(&self, kind: SubQuestionKind) -> Option<&[ConceptId]> {
        self.sub_questions.get(&kind).map(Vec::as_slice)
    }

    /// Every concept a question touches, sorted by name.
    pub fn all_concepts(&self, question: &Question) -> Vec<&Concept> {
        let ids = match question {
            Question::MultipleChoice(q) => q.all_concepts(),
            Question::Props(q) => q.all_concepts(),
            Question::Case(_) => self.case_concepts(),
        };
        self.sort_by_name(ids)
            .iter()
            .filter_map(|id| self.concept(id))
            .collect()
    }

    /// Concepts the skill model is updated with for an answer to
    /// `question` (optionally a sub-question of it), sorted by name.
    ///
    /// `None` when the combination makes no sense: a sub-question on a
    /// question that is not a case, or an unregistered sub-question.
    /// A case without a sub-question trains every registered
    /// sub-question's concepts.
    pub fn training_concepts(
        &self,
        question: &Question,
        sub: Option<SubQuestionKind>,
    ) -> Option<Vec<ConceptId>> {
        let ids = match (question, sub) {
            (Question::MultipleChoice(q), None) => q.training_concepts(),
            (Question::Props(q), None) => q.training_concepts(),
            (Question::Case(_), None) => self.case_concepts(),
            (Question::Case(_), Some(kind)) => self
                .sub_question_concepts(kind)?
                .iter()
                .cloned()
                .collect(),
            (_, Some(_)) => return None,
        };
        Some(self.sort_by_name(ids))
    }

    /// Resolves a stored answer reference. `sub_tag` is empty when the
    /// answer was not to a sub-question.
    ///
    /// Answers to a case must name a registered sub-question; answers to
    /// any other question must not name one.
    pub fn resolve_answer(
        &self,
        short_name: &str,
        sub_tag: &str,
    ) -> Option<(&Question, Option<SubQuestionKind>)> {
        let question = self.find_question(short_name)?;
        match (question, sub_tag.is_empty()) {
            (Question::Case(_), true) => None,
            (Question::Case(_), false) => {
                let kind = SubQuestionKind::from_tag(sub_tag)?;
                self.sub_questions.contains_key(&kind).then_some((question, Some(kind)))
            }
            (_, true) => Some((question, None)),
            (_, false) => None,
        }
    }

    fn case_concepts(&self) -> BTreeSet<ConceptId> {
        self.sub_questions.values().flatten().cloned().collect()
    }

    fn sort_by_name<I>(&self, ids: I) -> Vec<ConceptId>
    where
        I: IntoIterator<Item = ConceptId>,
    {
        let mut ids: Vec<ConceptId> = ids.into_iter().collect();
        ids.sort_by(|a, b| {
            let name = |id: &ConceptId| self.concept(id).map(|c| c.name.clone());
            name(a).cmp(&name(b)).then_with(|| a.cmp(b))
        });
        ids.dedup();
        ids
    }
}
