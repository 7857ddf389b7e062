//! Case preprocessing: one depth-first walk from the root events that
//! builds the per-type registries and every reverse link.
//!
//! The result is an immutable index kept next to the case (see
//! [`Case::preprocess`]). The authored graph itself is never touched.

use std::collections::{BTreeMap, BTreeSet};

use crate::case::{
    Case, ClaimId, DamageId, DutyId, EventId, EventKind, PersonId, RequirementId,
};

/// Derived index for a single [`Case`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessedCase {
    events: BTreeSet<EventId>,
    acts: BTreeSet<EventId>,
    persons: BTreeSet<PersonId>,
    duties: BTreeSet<DutyId>,
    damages: BTreeSet<DamageId>,
    claims: BTreeSet<ClaimId>,
    requirements: BTreeSet<RequirementId>,
    event_causes: BTreeMap<EventId, Vec<EventId>>,
    damage_causes: BTreeMap<DamageId, Vec<EventId>>,
    duty_events: BTreeMap<DutyId, EventId>,
    claim_events: BTreeMap<ClaimId, EventId>,
    requirement_events: BTreeMap<RequirementId, EventId>,
    person_damages: BTreeMap<PersonId, BTreeSet<DamageId>>,
}

impl PreprocessedCase {
    /// Every event reachable from the root events.
    pub fn events(&self) -> &BTreeSet<EventId> {
        &self.events
    }

    /// The reachable events that are acts.
    pub fn acts(&self) -> &BTreeSet<EventId> {
        &self.acts
    }

    pub fn persons(&self) -> &BTreeSet<PersonId> {
        &self.persons
    }

    pub fn duties(&self) -> &BTreeSet<DutyId> {
        &self.duties
    }

    pub fn damages(&self) -> &BTreeSet<DamageId> {
        &self.damages
    }

    pub fn claims(&self) -> &BTreeSet<ClaimId> {
        &self.claims
    }

    pub fn requirements(&self) -> &BTreeSet<RequirementId> {
        &self.requirements
    }

    /// Events that list `event` as a direct consequence, in discovery order.
    pub fn direct_causes(&self, event: EventId) -> &[EventId] {
        self.event_causes
            .get(&event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Events that directly produced `damage`, in discovery order.
    pub fn damage_causes(&self, damage: DamageId) -> &[EventId] {
        self.damage_causes
            .get(&damage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The event that allegedly breached `duty`.
    pub fn breaching_event(&self, duty: DutyId) -> Option<EventId> {
        self.duty_events.get(&duty).copied()
    }

    pub fn claim_event(&self, claim: ClaimId) -> Option<EventId> {
        self.claim_events.get(&claim).copied()
    }

    /// The event whose conduct violated `requirement`.
    pub fn requirement_event(&self, requirement: RequirementId) -> Option<EventId> {
        self.requirement_events.get(&requirement).copied()
    }

    /// Damages suffered by `person`.
    pub fn damages_of(&self, person: PersonId) -> impl Iterator<Item = DamageId> + '_ {
        self.person_damages
            .get(&person)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}

pub(crate) fn preprocess_case(case: &Case) -> PreprocessedCase {
    let mut walker = Walker {
        case,
        index: PreprocessedCase::default(),
    };
    for root in case.root_events() {
        walker.visit_event(None, *root);
    }
    tracing::debug!(
        case = case.short_name(),
        events = walker.index.events.len(),
        damages = walker.index.damages.len(),
        duties = walker.index.duties.len(),
        "preprocessed case"
    );
    walker.index
}

struct Walker<'c> {
    case: &'c Case,
    index: PreprocessedCase,
}

impl<'c> Walker<'c> {
    fn visit_event(&mut self, parent: Option<EventId>, id: EventId) {
        // The incoming edge is recorded on every visit; the subtree only once.
        if let Some(parent) = parent {
            push_unique(self.index.event_causes.entry(id).or_default(), parent);
        }
        if !self.index.events.insert(id) {
            return;
        }

        let case = self.case;
        let event = case.event(id);
        if let EventKind::Act { actor } = event.kind {
            self.index.acts.insert(id);
            self.index.persons.insert(actor);
        }

        for child in &event.consequences {
            self.visit_event(Some(id), *child);
        }

        for damage in &event.damages {
            push_unique(self.index.damage_causes.entry(*damage).or_default(), id);
            if self.index.damages.insert(*damage) {
                for person in &case.damage(*damage).persons {
                    self.index.persons.insert(*person);
                    self.index
                        .person_damages
                        .entry(*person)
                        .or_default()
                        .insert(*damage);
                }
            }
        }

        for claim in &event.claims {
            self.index.claim_events.entry(*claim).or_insert(id);
            if self.index.claims.insert(*claim) {
                self.index.persons.insert(case.claim(*claim).person);
            }
        }

        if let Some(req) = event.broken_requirement {
            self.index.requirement_events.entry(req).or_insert(id);
            if self.index.requirements.insert(req) {
                let requirement = case.requirement(req);
                self.index.persons.extend(requirement.persons.iter().copied());
                for child in &requirement.consequences {
                    self.visit_event(None, *child);
                }
            }
        }

        if let Some(duty_id) = event.duty {
            self.index.duty_events.entry(duty_id).or_insert(id);
            if self.index.duties.insert(duty_id) {
                let duty = case.duty(duty_id);
                self.index.persons.extend(duty.owed_from.iter().copied());
                self.index.persons.extend(duty.owed_to.iter().copied());
            }
        }
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseBuilder, DamageKind, Event};

    /// root -> left -> joined, root -> right -> joined; joined injures Pat.
    fn diamond() -> (Case, [EventId; 4]) {
        let mut b = CaseBuilder::new("diamond");
        let pat = b.person("Pat");
        let hurt = b.damage(DamageKind::BodilyInjury, "Pat is hurt", &[pat]);
        let joined = b.event(Event::passive("joined").named("joined").causing(&[hurt]));
        let left = b.event(Event::passive("left").leads_to(&[joined]));
        let right = b.event(Event::passive("right").leads_to(&[joined]));
        let root = b.event(Event::passive("root").leads_to(&[left, right]));
        b.root(root);
        (b.build().unwrap(), [root, left, right, joined])
    }

    #[test]
    fn diamond_records_both_parents_once() {
        let (case, [root, left, right, joined]) = diamond();
        let pp = case.preprocess();
        assert_eq!(pp.events().len(), 4);
        assert_eq!(pp.direct_causes(joined), &[left, right]);
        assert_eq!(pp.direct_causes(left), &[root]);
        assert!(pp.direct_causes(root).is_empty());
    }

    #[test]
    fn preprocess_is_memoized() {
        let (case, _) = diamond();
        let first = case.preprocess() as *const PreprocessedCase;
        let second = case.preprocess() as *const PreprocessedCase;
        assert_eq!(first, second);
    }

    #[test]
    fn damage_registry_and_victims() {
        let (case, [_, _, _, joined]) = diamond();
        let pp = case.preprocess();
        assert_eq!(pp.damages().len(), 1);
        let damage = *pp.damages().iter().next().unwrap();
        assert_eq!(pp.damage_causes(damage), &[joined]);
        let pat = case.find_person("Pat").unwrap();
        assert_eq!(pp.damages_of(pat).collect::<Vec<_>>(), vec![damage]);
        assert!(pp.persons().contains(&pat));
    }

    #[test]
    fn requirement_consequences_are_walked_without_parent() {
        let mut b = CaseBuilder::new("statute");
        let driver = b.person("Driver");
        let only_via_statute = b.event(Event::passive("fine issued").named("fine"));
        let speeding = b.event(Event::act(driver, "speeds"));
        let req = b.requirement("speed limit", &[driver], &[only_via_statute], None);
        b.attach_requirement(speeding, req).root(speeding);
        let case = b.build().unwrap();

        let pp = case.preprocess();
        assert!(pp.events().contains(&only_via_statute));
        assert!(pp.direct_causes(only_via_statute).is_empty());
        assert_eq!(pp.requirement_event(req), Some(speeding));
        assert_eq!(case.find_event("fine"), Some(only_via_statute));
    }

    #[test]
    fn duty_backlink_and_persons() {
        let mut b = CaseBuilder::new("duty");
        let a = b.person("A");
        let c = b.person("C");
        let duty = b.duty("drive carefully", &[a], &[c]);
        let act = b.event(Event::act(a, "drives badly").breaching(duty));
        b.root(act);
        let case = b.build().unwrap();
        let pp = case.preprocess();
        assert_eq!(pp.breaching_event(duty), Some(act));
        assert!(pp.persons().contains(&c));
        assert!(pp.acts().contains(&act));
    }

    #[test]
    fn unreachable_events_are_not_registered() {
        let mut b = CaseBuilder::new("island");
        let root = b.event(Event::passive("root"));
        let island = b.event(Event::passive("island"));
        b.root(root);
        let case = b.build().unwrap();
        assert!(!case.preprocess().events().contains(&island));
        assert_eq!(case.event_count(), 2);
    }
}
