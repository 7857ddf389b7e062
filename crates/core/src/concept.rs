//! Concepts: the units of knowledge the tutor traces.
//!
//! A concept is keyed by its short identifier ([`ConceptId`]). That id is
//! the key used by the skill model, so it must be globally unique within
//! a [`Content`](crate::Content) registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, unique short identifier of a concept (e.g. `"causeinfact1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(String);

impl ConceptId {
    pub fn new(id: impl Into<String>) -> Self {
        ConceptId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConceptId {
    fn from(s: &str) -> Self {
        ConceptId::new(s)
    }
}

/// A pointer to outside reading material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Reference {
    /// A paragraph of the Restatement (Second) of Torts.
    Restatement { paragraph: String },
    Url(String),
}

impl Reference {
    pub fn text(&self) -> String {
        match self {
            Reference::Restatement { paragraph } => {
                format!("Restatement, Torts, Second, §{}", paragraph)
            }
            Reference::Url(url) => url.clone(),
        }
    }
}

/// Paragraphs of explanatory text plus optional references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub text: Vec<String>,
    pub references: Vec<Reference>,
}

impl Explanation {
    pub fn new<I, S>(text: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Explanation {
            text: text.into_iter().map(Into::into).collect(),
            references: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }
}

/// A tort-law concept.
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub id: ConceptId,
    pub name: String,
    /// Nominal difficulty level (0 = vocabulary, 2 = composite doctrine).
    pub level: u8,
    pub explanation: Option<Explanation>,
    /// Author-maintained links; sorted by name when the registry is built.
    pub related: Vec<ConceptId>,
    pub hints: Vec<String>,
}

impl Concept {
    pub fn new(id: &str, name: &str, level: u8) -> Self {
        Concept {
            id: ConceptId::new(id),
            name: name.to_string(),
            level,
            explanation: None,
            related: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn explained(mut self, explanation: Explanation) -> Self {
        self.explanation = Some(explanation);
        self
    }

    pub fn hint(mut self, hint: &str) -> Self {
        self.hints.push(hint.to_string());
        self
    }

    pub fn related_to(mut self, related: &[&str]) -> Self {
        self.related
            .extend(related.iter().map(|id| ConceptId::new(*id)));
        self
    }

    /// Descriptive text that lets a concept act as a reference.
    pub fn reference_text(&self) -> String {
        format!("Concept: {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restatement_reference_text() {
        let r = Reference::Restatement {
            paragraph: "288".to_string(),
        };
        assert_eq!(r.text(), "Restatement, Torts, Second, §288");
    }

    #[test]
    fn concept_builder_collects_hints_and_related() {
        let c = Concept::new("compneg1", "comparative negligence", 1)
            .hint("Is the plaintiff negligent themselves?")
            .related_to(&["purecompneg1", "contribneg1"]);
        assert_eq!(c.hints.len(), 1);
        assert_eq!(c.related, vec![ConceptId::from("purecompneg1"), ConceptId::from("contribneg1")]);
        assert_eq!(c.reference_text(), "Concept: comparative negligence");
    }

    #[test]
    fn concept_id_serializes_transparently() {
        let id = ConceptId::new("negperse1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"negperse1\"");
    }
}
