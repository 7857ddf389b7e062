//! nits-core: case graphs, causal queries and tutoring content.
//!
//! # Public API
//!
//! - [`Case`] / [`CaseBuilder`] -- the case graph model, arena-backed
//! - [`Case::preprocess`] -- memoized reverse-link index ([`PreprocessedCase`])
//! - [`graph`] -- cause-in-fact, breached duties, damages, defendants
//! - [`analysis`] -- prima facie elements and the per-damage case report
//! - [`Content`] / [`ContentBuilder`] -- validated registry of concepts,
//!   questions and sub-question types
//! - [`catalog::standard_content`] -- the built-in catalog

pub mod analysis;
pub mod case;
pub mod catalog;
pub mod concept;
pub mod content;
pub mod default_case;
pub mod error;
pub mod graph;
pub mod preprocess;
pub mod question;

// ── Convenience re-exports ───────────────────────────────────────────

pub use analysis::{prima_facie, CaseReport, PrimaFacie};
pub use case::{
    BrokenLegalRequirement, Case, CaseBuilder, Claim, ClaimId, DamageId, DamageKind, Duty, DutyId,
    Event, EventId, EventKind, InjuryOrDamage, Person, PersonId, RequirementId,
};
pub use concept::{Concept, ConceptId, Explanation, Reference};
pub use content::{Content, ContentBuilder};
pub use error::ContentError;
pub use preprocess::PreprocessedCase;
pub use question::{
    AnswerOption, MultipleChoiceQuestion, PropsQuestion, Proposition, Question, SubQuestionKind,
    MAX_ANSWERS, MAX_PROPOSITIONS,
};
