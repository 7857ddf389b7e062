//! Case graph model.
//!
//! A case is a small causal world: persons, the events and acts they are
//! involved in, the duties those events allegedly breach, the statutes
//! they violate and the injuries they produce. Every entity lives in an
//! arena owned by the [`Case`] and is referred to by a typed index, so
//! identity is positional: two persons with the same name are distinct
//! unless they share an id.
//!
//! The forward structure (event -> consequences) is authored content and
//! never changes after [`CaseBuilder::build`]. Reverse links (direct causes,
//! breaching events, ...) are derived once by [`Case::preprocess`] and
//! live in a separate [`PreprocessedCase`] index.

use serde::Serialize;
use std::sync::OnceLock;

use crate::concept::Explanation;
use crate::error::ContentError;
use crate::preprocess::{self, PreprocessedCase};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(usize);

        impl $name {
            /// Position of the entity in its arena.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Index of a [`Person`] within its case.
    PersonId
);
arena_id!(
    /// Index of an [`Event`] within its case.
    EventId
);
arena_id!(
    /// Index of a [`Duty`] within its case.
    DutyId
);
arena_id!(
    /// Index of a [`BrokenLegalRequirement`] within its case.
    RequirementId
);
arena_id!(
    /// Index of an [`InjuryOrDamage`] within its case.
    DamageId
);
arena_id!(
    /// Index of a [`Claim`] within its case.
    ClaimId
);

// ──────────────────────────────────────────────
// Entities
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
}

/// The two flavours of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Something that happens without a responsible actor.
    Passive,
    /// Something a person does.
    Act { actor: PersonId },
}

/// A node in the causal graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Optional stable name, used to look events up in tests and tooling.
    pub short_name: Option<String>,
    pub description: String,
    pub kind: EventKind,
    /// Forward edges, in authored order.
    pub consequences: Vec<EventId>,
    /// The duty this event allegedly breaches.
    pub duty: Option<DutyId>,
    /// The statute or regulation this event violates (negligence per se).
    pub broken_requirement: Option<RequirementId>,
    pub damages: Vec<DamageId>,
    pub claims: Vec<ClaimId>,
}

impl Event {
    pub fn passive(description: &str) -> Self {
        Event::with_kind(EventKind::Passive, description)
    }

    pub fn act(actor: PersonId, description: &str) -> Self {
        Event::with_kind(EventKind::Act { actor }, description)
    }

    fn with_kind(kind: EventKind, description: &str) -> Self {
        Event {
            short_name: None,
            description: description.to_string(),
            kind,
            consequences: Vec::new(),
            duty: None,
            broken_requirement: None,
            damages: Vec::new(),
            claims: Vec::new(),
        }
    }

    pub fn named(mut self, short_name: &str) -> Self {
        self.short_name = Some(short_name.to_string());
        self
    }

    pub fn leads_to(mut self, consequences: &[EventId]) -> Self {
        self.consequences.extend_from_slice(consequences);
        self
    }

    pub fn breaching(mut self, duty: DutyId) -> Self {
        self.duty = Some(duty);
        self
    }

    pub fn violating(mut self, requirement: RequirementId) -> Self {
        self.broken_requirement = Some(requirement);
        self
    }

    pub fn causing(mut self, damages: &[DamageId]) -> Self {
        self.damages.extend_from_slice(damages);
        self
    }

    pub fn with_claim(mut self, claim: ClaimId) -> Self {
        self.claims.push(claim);
        self
    }

    /// The acting person, if this event is an act.
    pub fn actor(&self) -> Option<PersonId> {
        match self.kind {
            EventKind::Act { actor } => Some(actor),
            EventKind::Passive => None,
        }
    }

    pub fn is_act(&self) -> bool {
        matches!(self.kind, EventKind::Act { .. })
    }
}

/// A legal obligation owed by some persons to others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duty {
    pub description: String,
    pub owed_from: Vec<PersonId>,
    pub owed_to: Vec<PersonId>,
}

/// A violated statute or regulation, the basis for negligence per se.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLegalRequirement {
    pub description: String,
    /// Persons in violation.
    pub persons: Vec<PersonId>,
    pub consequences: Vec<EventId>,
    pub explanation: Option<Explanation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DamageKind {
    BodilyInjury,
    PropertyDamage,
    EmotionalHarm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjuryOrDamage {
    pub kind: DamageKind,
    pub description: String,
    /// Persons who suffered it.
    pub persons: Vec<PersonId>,
}

/// An assertion a person makes about an event ("I didn't see the car").
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub person: PersonId,
    pub description: String,
    pub explanation: Option<Explanation>,
}

// ──────────────────────────────────────────────
// Case
// ──────────────────────────────────────────────

/// A complete case: root events, narrative text and the entity arenas.
#[derive(Debug, Clone)]
pub struct Case {
    short_name: String,
    text: Vec<String>,
    root_events: Vec<EventId>,
    persons: Vec<Person>,
    events: Vec<Event>,
    duties: Vec<Duty>,
    requirements: Vec<BrokenLegalRequirement>,
    damages: Vec<InjuryOrDamage>,
    claims: Vec<Claim>,
    preprocessed: OnceLock<PreprocessedCase>,
}

impl Case {
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Narrative paragraphs shown to the student.
    pub fn text(&self) -> &[String] {
        &self.text
    }

    pub fn root_events(&self) -> &[EventId] {
        &self.root_events
    }

    pub fn person(&self, id: PersonId) -> &Person {
        &self.persons[id.0]
    }

    pub fn event(&self, id: EventId) -> &Event {
        &self.events[id.0]
    }

    pub fn duty(&self, id: DutyId) -> &Duty {
        &self.duties[id.0]
    }

    pub fn requirement(&self, id: RequirementId) -> &BrokenLegalRequirement {
        &self.requirements[id.0]
    }

    pub fn damage(&self, id: DamageId) -> &InjuryOrDamage {
        &self.damages[id.0]
    }

    pub fn claim(&self, id: ClaimId) -> &Claim {
        &self.claims[id.0]
    }

    /// Number of events in the arena, reachable or not.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The derived index for this case.
    ///
    /// The traversal runs at most once per `Case` value; every later call
    /// returns the same cached index. Safe to call from several threads.
    pub fn preprocess(&self) -> &PreprocessedCase {
        self.preprocessed
            .get_or_init(|| preprocess::preprocess_case(self))
    }

    /// Finds a reachable event by short name.
    pub fn find_event(&self, short_name: &str) -> Option<EventId> {
        self.preprocess()
            .events()
            .iter()
            .copied()
            .find(|id| self.event(*id).short_name.as_deref() == Some(short_name))
    }

    /// Finds a person by name (case-insensitive). Returns the first match.
    pub fn find_person(&self, name: &str) -> Option<PersonId> {
        self.persons
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .map(PersonId)
    }
}

// ──────────────────────────────────────────────
// Builder
// ──────────────────────────────────────────────

/// Incrementally assembles a [`Case`].
///
/// Entities are created bottom-up: an event can only list consequences
/// that already exist. The one legitimate back-reference in authored
/// content (an event violating a requirement whose consequences include
/// that same event) is wired with [`CaseBuilder::attach_requirement`].
#[derive(Debug, Default)]
pub struct CaseBuilder {
    short_name: String,
    text: Vec<String>,
    root_events: Vec<EventId>,
    persons: Vec<Person>,
    events: Vec<Event>,
    duties: Vec<Duty>,
    requirements: Vec<BrokenLegalRequirement>,
    damages: Vec<InjuryOrDamage>,
    claims: Vec<Claim>,
}

impl CaseBuilder {
    pub fn new(short_name: &str) -> Self {
        CaseBuilder {
            short_name: short_name.to_string(),
            ..Default::default()
        }
    }

    pub fn paragraph(&mut self, text: &str) -> &mut Self {
        self.text.push(text.to_string());
        self
    }

    pub fn person(&mut self, name: &str) -> PersonId {
        self.persons.push(Person {
            name: name.to_string(),
        });
        PersonId(self.persons.len() - 1)
    }

    pub fn duty(&mut self, description: &str, owed_from: &[PersonId], owed_to: &[PersonId]) -> DutyId {
        self.duties.push(Duty {
            description: description.to_string(),
            owed_from: owed_from.to_vec(),
            owed_to: owed_to.to_vec(),
        });
        DutyId(self.duties.len() - 1)
    }

    pub fn damage(&mut self, kind: DamageKind, description: &str, persons: &[PersonId]) -> DamageId {
        self.damages.push(InjuryOrDamage {
            kind,
            description: description.to_string(),
            persons: persons.to_vec(),
        });
        DamageId(self.damages.len() - 1)
    }

    pub fn requirement(
        &mut self,
        description: &str,
        persons: &[PersonId],
        consequences: &[EventId],
        explanation: Option<Explanation>,
    ) -> RequirementId {
        self.requirements.push(BrokenLegalRequirement {
            description: description.to_string(),
            persons: persons.to_vec(),
            consequences: consequences.to_vec(),
            explanation,
        });
        RequirementId(self.requirements.len() - 1)
    }

    pub fn claim(&mut self, person: PersonId, description: &str, explanation: Option<Explanation>) -> ClaimId {
        self.claims.push(Claim {
            person,
            description: description.to_string(),
            explanation,
        });
        ClaimId(self.claims.len() - 1)
    }

    pub fn event(&mut self, event: Event) -> EventId {
        self.events.push(event);
        EventId(self.events.len() - 1)
    }

    /// Marks `event` as violating `requirement` after both exist.
    pub fn attach_requirement(&mut self, event: EventId, requirement: RequirementId) -> &mut Self {
        if let Some(e) = self.events.get_mut(event.0) {
            e.broken_requirement = Some(requirement);
        }
        self
    }

    pub fn root(&mut self, event: EventId) -> &mut Self {
        self.root_events.push(event);
        self
    }

    /// Checks referential integrity and freezes the case.
    pub fn build(self) -> Result<Case, ContentError> {
        self.check_references()?;
        Ok(Case {
            short_name: self.short_name,
            text: self.text,
            root_events: self.root_events,
            persons: self.persons,
            events: self.events,
            duties: self.duties,
            requirements: self.requirements,
            damages: self.damages,
            claims: self.claims,
            preprocessed: OnceLock::new(),
        })
    }

    fn check_references(&self) -> Result<(), ContentError> {
        if self.root_events.is_empty() {
            return Err(ContentError::NoRootEvents {
                case: self.short_name.clone(),
            });
        }

        let dangling = |what: &str, index: usize| ContentError::DanglingReference {
            case: self.short_name.clone(),
            message: format!("{} #{} does not exist", what, index),
        };
        let persons_ok = |ids: &[PersonId]| ids.iter().find(|p| p.0 >= self.persons.len()).copied();
        let events_ok = |ids: &[EventId]| ids.iter().find(|e| e.0 >= self.events.len()).copied();

        if let Some(e) = events_ok(&self.root_events) {
            return Err(dangling("root event", e.0));
        }
        for event in &self.events {
            if let Some(e) = events_ok(&event.consequences) {
                return Err(dangling("event", e.0));
            }
            if let Some(actor) = event.actor() {
                if actor.0 >= self.persons.len() {
                    return Err(dangling("person", actor.0));
                }
            }
            if let Some(d) = event.duty.filter(|d| d.0 >= self.duties.len()) {
                return Err(dangling("duty", d.0));
            }
            if let Some(r) = event
                .broken_requirement
                .filter(|r| r.0 >= self.requirements.len())
            {
                return Err(dangling("legal requirement", r.0));
            }
            if let Some(d) = event.damages.iter().find(|d| d.0 >= self.damages.len()) {
                return Err(dangling("damage", d.0));
            }
            if let Some(c) = event.claims.iter().find(|c| c.0 >= self.claims.len()) {
                return Err(dangling("claim", c.0));
            }
        }
        for duty in &self.duties {
            if let Some(p) = persons_ok(&duty.owed_from).or_else(|| persons_ok(&duty.owed_to)) {
                return Err(dangling("person", p.0));
            }
        }
        for req in &self.requirements {
            if let Some(p) = persons_ok(&req.persons) {
                return Err(dangling("person", p.0));
            }
            if let Some(e) = events_ok(&req.consequences) {
                return Err(dangling("event", e.0));
            }
        }
        for damage in &self.damages {
            if let Some(p) = persons_ok(&damage.persons) {
                return Err(dangling("person", p.0));
            }
        }
        for claim in &self.claims {
            if claim.person.0 >= self.persons.len() {
                return Err(dangling("person", claim.person.0));
            }
        }
        Ok(())
    }
}
