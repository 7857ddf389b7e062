use std::fmt;

/// A fatal content-authoring error detected while registering content.
///
/// Content is validated once at load time. Any of these means the content
/// tables are inconsistent and the tutor must not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Two concepts share a short identifier.
    DuplicateConcept { id: String },
    /// A concept was registered with an empty short identifier.
    EmptyConceptId { name: String },
    /// A concept lists a related concept that was never registered.
    UnknownRelatedConcept { concept: String, related: String },
    /// Two questions share a short name.
    DuplicateQuestion { short_name: String },
    /// A question was registered without a short name.
    EmptyShortName { context: String },
    /// A multiple choice question has fewer than two answer options.
    TooFewAnswers { short_name: String, count: usize },
    /// A multiple choice question has more options than there are letters.
    TooManyAnswers { short_name: String, count: usize },
    /// A multiple choice question has no option marked correct.
    NoCorrectAnswer { short_name: String },
    /// A question carries no concepts at all.
    NoConcepts { short_name: String },
    /// A proposition question has fewer than two propositions.
    TooFewPropositions { short_name: String, count: usize },
    /// A proposition question has more propositions than can be lettered.
    TooManyPropositions { short_name: String, count: usize },
    /// A question references a concept id that was never registered.
    UnknownConcept { short_name: String, concept: String },
    /// The same sub-question type was registered twice.
    DuplicateSubQuestion { tag: String },
    /// A sub-question type was registered without concepts.
    SubQuestionWithoutConcepts { tag: String },
    /// A case has no root events.
    NoRootEvents { case: String },
    /// A case graph references an entity id that does not belong to it.
    DanglingReference { case: String, message: String },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::DuplicateConcept { id } => {
                write!(f, "duplicate concept short name: {}", id)
            }
            ContentError::EmptyConceptId { name } => {
                write!(f, "concept '{}' does not have a short name", name)
            }
            ContentError::UnknownRelatedConcept { concept, related } => {
                write!(
                    f,
                    "concept {} lists unknown related concept {}",
                    concept, related
                )
            }
            ContentError::DuplicateQuestion { short_name } => {
                write!(f, "duplicate question short name: {}", short_name)
            }
            ContentError::EmptyShortName { context } => {
                write!(f, "question does not have a short name ({})", context)
            }
            ContentError::TooFewAnswers { short_name, count } => {
                write!(
                    f,
                    "question {} does not have at least two answers (has {})",
                    short_name, count
                )
            }
            ContentError::TooManyAnswers { short_name, count } => {
                write!(
                    f,
                    "question {} has {} answers, at most {} are allowed",
                    short_name,
                    count,
                    crate::question::MAX_ANSWERS
                )
            }
            ContentError::NoCorrectAnswer { short_name } => {
                write!(f, "question {} does not have any correct answers", short_name)
            }
            ContentError::NoConcepts { short_name } => {
                write!(f, "question {} does not have any concepts", short_name)
            }
            ContentError::TooFewPropositions { short_name, count } => {
                write!(
                    f,
                    "question {} does not have at least 2 propositions (has {})",
                    short_name, count
                )
            }
            ContentError::TooManyPropositions { short_name, count } => {
                write!(
                    f,
                    "question {} has {} propositions, at most {} are allowed",
                    short_name,
                    count,
                    crate::question::MAX_PROPOSITIONS
                )
            }
            ContentError::UnknownConcept {
                short_name,
                concept,
            } => {
                write!(
                    f,
                    "question {} references unknown concept {}",
                    short_name, concept
                )
            }
            ContentError::DuplicateSubQuestion { tag } => {
                write!(f, "sub-question type {} registered twice", tag)
            }
            ContentError::SubQuestionWithoutConcepts { tag } => {
                write!(f, "sub-question type {} does not have any concepts", tag)
            }
            ContentError::NoRootEvents { case } => {
                write!(f, "case {} does not have any root events", case)
            }
            ContentError::DanglingReference { case, message } => {
                write!(f, "case {}: {}", case, message)
            }
        }
    }
}

impl std::error::Error for ContentError {}
