//! Sub-questions asked about a case.
//!
//! A [`CaseSession`] decides which sub-question type to pose next while
//! a student works through one case; a [`SubQuestionPrompt`] is one
//! concrete instance of a type, drawn from the case graph.

use std::collections::{BTreeMap, BTreeSet};

use nits_core::analysis::prima_facie;
use nits_core::graph::{defendants, find_damages, is_cause_in_fact};
use nits_core::{Case, Content, DamageId, EventId, PersonId, SubQuestionKind};
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use crate::state::StudentState;

/// Each sub-question type is posed at most this many times per case.
pub const MAX_TIMES_ASKED: u32 = 2;

/// The answer expected by [`SubQuestionKind::NegligencePerSe`].
pub const NEGLIGENCE_PER_SE: &str = "negligence per se";

// ── Session ──────────────────────────────────────────────────────────

/// Sub-question bookkeeping for one pass through a case.
#[derive(Debug, Clone, Default)]
pub struct CaseSession {
    asked: BTreeMap<SubQuestionKind, u32>,
    unavailable: BTreeSet<SubQuestionKind>,
}

impl CaseSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn times_asked(&self, kind: SubQuestionKind) -> u32 {
        self.asked.get(&kind).copied().unwrap_or(0)
    }

    pub fn record_asked(&mut self, kind: SubQuestionKind) {
        *self.asked.entry(kind).or_insert(0) += 1;
    }

    /// Excludes `kind` for the rest of this session, e.g. because the
    /// case has no material for it.
    pub fn mark_unavailable(&mut self, kind: SubQuestionKind) {
        self.unavailable.insert(kind);
    }

    /// Registered types that still train an unmastered concept and have
    /// not hit the ask cap.
    pub fn eligible(&self, content: &Content, state: &StudentState) -> Vec<SubQuestionKind> {
        content
            .sub_question_kinds()
            .filter(|kind| !self.unavailable.contains(kind))
            .filter(|kind| self.times_asked(*kind) < MAX_TIMES_ASKED)
            .filter(|kind| {
                content
                    .sub_question_concepts(*kind)
                    .is_some_and(|concepts| concepts.iter().any(|c| !state.is_mastered(c)))
            })
            .collect()
    }

    /// Uniform pick among the eligible types.
    pub fn next<R: Rng + ?Sized>(
        &self,
        content: &Content,
        state: &StudentState,
        rng: &mut R,
    ) -> Option<SubQuestionKind> {
        self.eligible(content, state).choose(rng).copied()
    }
}

// ── Prompts ──────────────────────────────────────────────────────────

/// A student's reply to a sub-question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubQuestionAnswer {
    YesNo(bool),
    /// Person names, in any order and case.
    Names(Vec<String>),
    Phrase(String),
}

/// One instantiated sub-question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubQuestionPrompt {
    /// Is `act` a cause-in-fact of `damage`?
    CauseInFact {
        act: EventId,
        damage: DamageId,
        expected: bool,
    },
    /// Who could be held responsible for `damage`?
    Defendants {
        damage: DamageId,
        /// Lowercased names.
        expected: BTreeSet<String>,
    },
    /// Which principle can `defendant` call in for `damage`?
    NegligencePerSe {
        damage: DamageId,
        defendant: PersonId,
    },
    /// Is there a prima facie case for `damage`?
    PrimaFacie { damage: DamageId, expected: bool },
}

impl SubQuestionPrompt {
    /// Draws a prompt of type `kind` from `case`. `None` when the case
    /// has nothing to ask for that type.
    pub fn instantiate<R: Rng + ?Sized>(
        kind: SubQuestionKind,
        case: &Case,
        rng: &mut R,
    ) -> Option<Self> {
        let pp = case.preprocess();
        match kind {
            SubQuestionKind::CauseInFact => {
                let damage = pp.damages().iter().copied().choose(rng)?;
                let act = pp.acts().iter().copied().choose(rng)?;
                Some(SubQuestionPrompt::CauseInFact {
                    act,
                    damage,
                    expected: is_cause_in_fact(case, damage, act),
                })
            }
            SubQuestionKind::Defendants => {
                let (damage, persons) = pp
                    .damages()
                    .iter()
                    .map(|d| (*d, defendants(case, *d)))
                    .filter(|(_, persons)| !persons.is_empty())
                    .choose(rng)?;
                Some(SubQuestionPrompt::Defendants {
                    damage,
                    expected: persons
                        .into_iter()
                        .map(|p| case.person(p).name.to_lowercase())
                        .collect(),
                })
            }
            SubQuestionKind::NegligencePerSe => negligence_per_se(case, rng),
            SubQuestionKind::PrimaFacie => {
                let damage = pp.damages().iter().copied().choose(rng)?;
                Some(SubQuestionPrompt::PrimaFacie {
                    damage,
                    expected: prima_facie(case, damage).is_established(),
                })
            }
        }
    }

    pub fn kind(&self) -> SubQuestionKind {
        match self {
            SubQuestionPrompt::CauseInFact { .. } => SubQuestionKind::CauseInFact,
            SubQuestionPrompt::Defendants { .. } => SubQuestionKind::Defendants,
            SubQuestionPrompt::NegligencePerSe { .. } => SubQuestionKind::NegligencePerSe,
            SubQuestionPrompt::PrimaFacie { .. } => SubQuestionKind::PrimaFacie,
        }
    }

    /// Lines to show the student.
    pub fn text(&self, case: &Case) -> Vec<String> {
        match self {
            SubQuestionPrompt::CauseInFact { act, damage, .. } => vec![
                "In this case, is the act:".to_string(),
                case.event(*act).description.clone(),
                "a cause-in-fact of this injury or property damage:".to_string(),
                case.damage(*damage).description.clone(),
            ],
            SubQuestionPrompt::Defendants { damage, .. } => vec![
                "Consider the following damage:".to_string(),
                case.damage(*damage).description.clone(),
                "Please enter the names of all people who could be held responsible for this."
                    .to_string(),
            ],
            SubQuestionPrompt::NegligencePerSe { damage, defendant } => vec![
                "Looking at the following damage:".to_string(),
                case.damage(*damage).description.clone(),
                format!(
                    "Which legal principle can defendant {} call in?",
                    case.person(*defendant).name
                ),
            ],
            SubQuestionPrompt::PrimaFacie { damage, .. } => vec![
                "Consider the following damage:".to_string(),
                case.damage(*damage).description.clone(),
                "Is there a prima facie case for this damage?".to_string(),
            ],
        }
    }

    pub fn is_correct(&self, answer: &SubQuestionAnswer) -> bool {
        match (self, answer) {
            (SubQuestionPrompt::CauseInFact { expected, .. }, SubQuestionAnswer::YesNo(yes))
            | (SubQuestionPrompt::PrimaFacie { expected, .. }, SubQuestionAnswer::YesNo(yes)) => {
                expected == yes
            }
            (SubQuestionPrompt::Defendants { expected, .. }, SubQuestionAnswer::Names(names)) => {
                let given: BTreeSet<String> = names
                    .iter()
                    .map(|n| n.trim().to_lowercase())
                    .filter(|n| !n.is_empty())
                    .collect();
                &given == expected
            }
            (SubQuestionPrompt::NegligencePerSe { .. }, SubQuestionAnswer::Phrase(phrase)) => {
                let words: Vec<String> =
                    phrase.split_whitespace().map(str::to_lowercase).collect();
                words.join(" ") == NEGLIGENCE_PER_SE
            }
            _ => false,
        }
    }
}

/// A damage downstream of a broken legal requirement, and a defendant
/// for it whose own act leads to that damage.
fn negligence_per_se<R: Rng + ?Sized>(case: &Case, rng: &mut R) -> Option<SubQuestionPrompt> {
    let pp = case.preprocess();
    let mut requirements: Vec<_> = pp.requirements().iter().copied().collect();
    requirements.shuffle(rng);

    for requirement in requirements {
        let consequences = case.requirement(requirement).consequences.iter().copied();
        let mut damages: Vec<DamageId> = find_damages(case, consequences).into_iter().collect();
        damages.shuffle(rng);

        for damage in damages {
            let mut persons: Vec<PersonId> = defendants(case, damage).into_iter().collect();
            persons.shuffle(rng);
            let defendant = persons.into_iter().find(|person| {
                pp.acts().iter().any(|act| {
                    let event = case.event(*act);
                    event.actor() == Some(*person)
                        && find_damages(case, event.consequences.iter().copied()).contains(&damage)
                })
            });
            if let Some(defendant) = defendant {
                return Some(SubQuestionPrompt::NegligencePerSe { damage, defendant });
            }
        }
    }
    None
}
