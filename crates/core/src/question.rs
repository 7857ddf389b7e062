//! Question types: multiple choice, proposition sets, and cases.
//!
//! Every question exposes two concept sets. *All concepts* drive the
//! "explore" help; *training concepts* are the ones the skill model is
//! updated with. For multiple choice the latter deliberately leaves out
//! concepts attached to wrong options.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;

use crate::case::Case;
use crate::concept::{ConceptId, Explanation};
use crate::error::ContentError;

/// Options are labelled `a` to `z`.
pub const MAX_ANSWERS: usize = 26;

/// Four propositions give 16 lettered choices.
pub const MAX_PROPOSITIONS: usize = 4;

/// A question registered in the content.
#[derive(Debug, Clone)]
pub enum Question {
    MultipleChoice(MultipleChoiceQuestion),
    Props(PropsQuestion),
    Case(Case),
}

impl Question {
    pub fn short_name(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => &q.short_name,
            Question::Props(q) => &q.short_name,
            Question::Case(c) => c.short_name(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Question::MultipleChoice(_) => "multiple choice",
            Question::Props(_) => "propositions",
            Question::Case(_) => "case",
        }
    }

    pub fn as_case(&self) -> Option<&Case> {
        match self {
            Question::Case(c) => Some(c),
            _ => None,
        }
    }

    /// Structural checks that need no registry.
    pub fn check(&self) -> Result<(), ContentError> {
        match self {
            Question::MultipleChoice(q) => q.check(),
            Question::Props(q) => q.check(),
            Question::Case(c) => {
                if c.short_name().is_empty() {
                    return Err(ContentError::EmptyShortName {
                        context: "case".to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}

// ──────────────────────────────────────────────
// Multiple choice
// ──────────────────────────────────────────────

/// One option of a multiple choice question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOption {
    pub text: String,
    pub concepts: Vec<ConceptId>,
    pub explanation: Option<Explanation>,
    pub correct: bool,
    /// Always presented last, regardless of shuffling.
    pub none_of_the_above: bool,
}

impl AnswerOption {
    fn new(text: &str, correct: bool) -> Self {
        AnswerOption {
            text: text.to_string(),
            concepts: Vec::new(),
            explanation: None,
            correct,
            none_of_the_above: false,
        }
    }

    pub fn right(text: &str) -> Self {
        AnswerOption::new(text, true)
    }

    pub fn wrong(text: &str) -> Self {
        AnswerOption::new(text, false)
    }

    pub fn none_of_the_above(correct: bool) -> Self {
        AnswerOption {
            none_of_the_above: true,
            ..AnswerOption::new("None of the above.", correct)
        }
    }

    pub fn with_concepts(mut self, concepts: &[&str]) -> Self {
        self.concepts.extend(concepts.iter().map(|c| ConceptId::new(*c)));
        self
    }

    pub fn explained(mut self, explanation: Explanation) -> Self {
        self.explanation = Some(explanation);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultipleChoiceQuestion {
    pub short_name: String,
    /// Paragraphs of the question stem.
    pub stem: Vec<String>,
    pub concepts: Vec<ConceptId>,
    pub answers: Vec<AnswerOption>,
}

impl MultipleChoiceQuestion {
    pub fn all_concepts(&self) -> BTreeSet<ConceptId> {
        self.concepts
            .iter()
            .chain(self.answers.iter().flat_map(|a| a.concepts.iter()))
            .cloned()
            .collect()
    }

    /// Stem concepts plus those of the first correct option.
    pub fn training_concepts(&self) -> BTreeSet<ConceptId> {
        let correct = self
            .answers
            .iter()
            .find(|a| a.correct)
            .map(|a| a.concepts.as_slice())
            .unwrap_or(&[]);
        self.concepts.iter().chain(correct).cloned().collect()
    }

    /// The options in presentation order: shuffled, with "none of the
    /// above" moved to the end.
    pub fn presentation<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&AnswerOption> {
        let (mut options, last): (Vec<&AnswerOption>, Vec<&AnswerOption>) =
            self.answers.iter().partition(|a| !a.none_of_the_above);
        options.shuffle(rng);
        options.extend(last);
        options
    }

    fn check(&self) -> Result<(), ContentError> {
        if self.short_name.is_empty() {
            return Err(ContentError::EmptyShortName {
                context: self.stem.first().cloned().unwrap_or_default(),
            });
        }
        if self.answers.len() < 2 {
            return Err(ContentError::TooFewAnswers {
                short_name: self.short_name.clone(),
                count: self.answers.len(),
            });
        }
        if self.answers.len() > MAX_ANSWERS {
            return Err(ContentError::TooManyAnswers {
                short_name: self.short_name.clone(),
                count: self.answers.len(),
            });
        }
        if self.all_concepts().is_empty() {
            return Err(ContentError::NoConcepts {
                short_name: self.short_name.clone(),
            });
        }
        if !self.answers.iter().any(|a| a.correct) {
            return Err(ContentError::NoCorrectAnswer {
                short_name: self.short_name.clone(),
            });
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Propositions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Proposition {
    pub text: String,
    pub concepts: Vec<ConceptId>,
    pub truth: bool,
}

impl Proposition {
    pub fn new(text: &str, truth: bool, concepts: &[&str]) -> Self {
        Proposition {
            text: text.to_string(),
            concepts: concepts.iter().map(|c| ConceptId::new(*c)).collect(),
            truth,
        }
    }
}

/// A set of propositions; the student picks the right truth assignment.
///
/// Choice `i` assigns "true" to proposition `j` iff bit `j` of `i` is set,
/// so there are `2^n` choices for `n` propositions.
#[derive(Debug, Clone, PartialEq)]
pub struct PropsQuestion {
    pub short_name: String,
    pub propositions: Vec<Proposition>,
}

impl PropsQuestion {
    pub fn all_concepts(&self) -> BTreeSet<ConceptId> {
        self.propositions
            .iter()
            .flat_map(|p| p.concepts.iter().cloned())
            .collect()
    }

    pub fn training_concepts(&self) -> BTreeSet<ConceptId> {
        self.all_concepts()
    }

    pub fn choice_count(&self) -> usize {
        1usize << self.propositions.len()
    }

    /// Text of choice `index`, e.g. "I is true, II is false".
    pub fn choice_text(&self, index: usize) -> String {
        self.propositions
            .iter()
            .enumerate()
            .map(|(j, _)| {
                let value = if (index >> j) & 1 == 1 { "true" } else { "false" };
                format!("{} is {}", roman_numeral(j + 1), value)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn correct_choice(&self) -> usize {
        self.propositions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.truth)
            .fold(0, |acc, (j, _)| acc | (1 << j))
    }

    pub fn is_correct_choice(&self, index: usize) -> bool {
        index == self.correct_choice()
    }

    fn check(&self) -> Result<(), ContentError> {
        if self.short_name.is_empty() {
            return Err(ContentError::EmptyShortName {
                context: self
                    .propositions
                    .first()
                    .map(|p| p.text.clone())
                    .unwrap_or_default(),
            });
        }
        if self.all_concepts().is_empty() {
            return Err(ContentError::NoConcepts {
                short_name: self.short_name.clone(),
            });
        }
        if self.propositions.len() < 2 {
            return Err(ContentError::TooFewPropositions {
                short_name: self.short_name.clone(),
                count: self.propositions.len(),
            });
        }
        if self.propositions.len() > MAX_PROPOSITIONS {
            return Err(ContentError::TooManyPropositions {
                short_name: self.short_name.clone(),
                count: self.propositions.len(),
            });
        }
        Ok(())
    }
}

/// Roman numeral for a positive number. Zero yields an empty string.
pub fn roman_numeral(mut number: usize) -> String {
    const DIGITS: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, digit) in DIGITS {
        while number >= value {
            out.push_str(digit);
            number -= value;
        }
    }
    out
}

/// Letter label for the option at `index` (`0 -> 'a'`). Validated
/// content never needs more than [`MAX_ANSWERS`] labels.
pub fn choice_letter(index: usize) -> char {
    (b'a' + (index % 26) as u8) as char
}

/// Parses a letter label back into an index below `count`.
pub fn parse_choice(input: &str, count: usize) -> Option<usize> {
    let mut chars = input.trim().chars();
    let c = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() || !c.is_ascii_lowercase() {
        return None;
    }
    let index = (c as u8 - b'a') as usize;
    (index < count).then_some(index)
}

// ──────────────────────────────────────────────
// Sub-question types
// ──────────────────────────────────────────────

/// The kinds of question that can be asked about a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubQuestionKind {
    CauseInFact,
    Defendants,
    NegligencePerSe,
    PrimaFacie,
}

impl SubQuestionKind {
    pub const ALL: [SubQuestionKind; 4] = [
        SubQuestionKind::CauseInFact,
        SubQuestionKind::Defendants,
        SubQuestionKind::NegligencePerSe,
        SubQuestionKind::PrimaFacie,
    ];

    /// Stable tag used in trace rows and persisted history.
    pub fn tag(self) -> &'static str {
        match self {
            SubQuestionKind::CauseInFact => "causeInFact",
            SubQuestionKind::Defendants => "defendants",
            SubQuestionKind::NegligencePerSe => "negligencePerSe",
            SubQuestionKind::PrimaFacie => "primaFacie",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        SubQuestionKind::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for SubQuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question() -> MultipleChoiceQuestion {
        MultipleChoiceQuestion {
            short_name: "q1".to_string(),
            stem: vec!["Which one?".to_string()],
            concepts: vec![ConceptId::from("stem")],
            answers: vec![
                AnswerOption::right("right").with_concepts(&["good"]),
                AnswerOption::wrong("wrong").with_concepts(&["bad"]),
                AnswerOption::none_of_the_above(false),
            ],
        }
    }

    #[test]
    fn wrong_option_concepts_are_not_trained() {
        let q = question();
        let training = q.training_concepts();
        assert!(training.contains(&ConceptId::from("good")));
        assert!(!training.contains(&ConceptId::from("bad")));
        assert!(q.all_concepts().contains(&ConceptId::from("bad")));
    }

    #[test]
    fn none_of_the_above_stays_last() {
        let q = question();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let shown = q.presentation(&mut rng);
            assert_eq!(shown.len(), 3);
            assert!(shown[2].none_of_the_above);
        }
    }

    #[test]
    fn check_rejects_single_answer() {
        let mut q = question();
        q.answers.truncate(1);
        assert_eq!(
            Question::MultipleChoice(q).check(),
            Err(ContentError::TooFewAnswers {
                short_name: "q1".to_string(),
                count: 1
            })
        );
    }

    #[test]
    fn check_rejects_no_correct_answer() {
        let mut q = question();
        q.answers.remove(0);
        assert!(matches!(
            Question::MultipleChoice(q).check(),
            Err(ContentError::NoCorrectAnswer { .. })
        ));
    }

    #[test]
    fn props_choices_follow_bitmap() {
        let q = PropsQuestion {
            short_name: "props".to_string(),
            propositions: vec![
                Proposition::new("first", true, &["a"]),
                Proposition::new("second", false, &["b"]),
                Proposition::new("third", true, &["a"]),
            ],
        };
        assert_eq!(q.choice_count(), 8);
        assert_eq!(q.correct_choice(), 0b101);
        assert!(q.is_correct_choice(5));
        assert!(!q.is_correct_choice(4));
        assert_eq!(q.choice_text(5), "I is true, II is false, III is true");
        assert_eq!(q.training_concepts().len(), 2);
    }

    #[test]
    fn props_check_requires_two_propositions() {
        let q = PropsQuestion {
            short_name: "lonely".to_string(),
            propositions: vec![Proposition::new("only", true, &["a"])],
        };
        assert!(matches!(
            Question::Props(q).check(),
            Err(ContentError::TooFewPropositions { count: 1, .. })
        ));
    }

    #[test]
    fn props_check_caps_propositions_at_lettered_choices() {
        let mut q = PropsQuestion {
            short_name: "crowded".to_string(),
            propositions: (0..MAX_PROPOSITIONS)
                .map(|i| Proposition::new(&format!("p{i}"), true, &["a"]))
                .collect(),
        };
        assert!(Question::Props(q.clone()).check().is_ok());
        let last = q.choice_count() - 1;
        assert!(q.is_correct_choice(last));
        assert_eq!(parse_choice(&choice_letter(last).to_string(), q.choice_count()), Some(last));

        q.propositions.push(Proposition::new("one too many", true, &["a"]));
        assert_eq!(
            Question::Props(q).check(),
            Err(ContentError::TooManyPropositions {
                short_name: "crowded".to_string(),
                count: MAX_PROPOSITIONS + 1
            })
        );
    }

    #[test]
    fn check_rejects_more_answers_than_letters() {
        let mut q = question();
        q.answers = (0..=MAX_ANSWERS)
            .map(|i| AnswerOption::wrong(&format!("option {i}")))
            .collect();
        q.answers[0].correct = true;
        assert!(matches!(
            Question::MultipleChoice(q).check(),
            Err(ContentError::TooManyAnswers { count: 27, .. })
        ));
    }

    #[test]
    fn every_lettered_answer_is_reachable() {
        for index in 0..MAX_ANSWERS {
            let letter = choice_letter(index).to_string();
            assert_eq!(parse_choice(&letter, MAX_ANSWERS), Some(index));
        }
    }

    #[test]
    fn roman_numerals() {
        assert_eq!(roman_numeral(1), "I");
        assert_eq!(roman_numeral(4), "IV");
        assert_eq!(roman_numeral(9), "IX");
        assert_eq!(roman_numeral(14), "XIV");
        assert_eq!(roman_numeral(1994), "MCMXCIV");
    }

    #[test]
    fn choice_letters_round_trip() {
        assert_eq!(choice_letter(0), 'a');
        assert_eq!(parse_choice(" C ", 4), Some(2));
        assert_eq!(parse_choice("e", 4), None);
        assert_eq!(parse_choice("ab", 4), None);
    }

    #[test]
    fn sub_question_tags() {
        for kind in SubQuestionKind::ALL {
            assert_eq!(SubQuestionKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(SubQuestionKind::from_tag("nope"), None);
    }
}
