//! Legal queries over a preprocessed case graph.
//!
//! All traversals keep a seen set, since the same event can be reached
//! along several paths. Behaviour on a cyclic consequence graph is
//! unspecified but every function here still terminates.

use std::collections::{BTreeSet, VecDeque};

use crate::case::{Case, DamageId, DutyId, EventId, PersonId};

/// True iff `candidate` is `event` or lies upstream of it.
pub fn is_ancestor(case: &Case, candidate: EventId, event: EventId) -> bool {
    if candidate == event {
        return true;
    }
    let pp = case.preprocess();
    let mut seen = BTreeSet::new();
    let mut stack = vec![event];
    while let Some(current) = stack.pop() {
        for cause in pp.direct_causes(current) {
            if *cause == candidate {
                return true;
            }
            if seen.insert(*cause) {
                stack.push(*cause);
            }
        }
    }
    false
}

/// But-for test: `event` is upstream of (or equal to) a direct cause of `damage`.
pub fn is_cause_in_fact(case: &Case, damage: DamageId, event: EventId) -> bool {
    case.preprocess()
        .damage_causes(damage)
        .iter()
        .any(|cause| is_ancestor(case, event, *cause))
}

/// Every event that is a cause-in-fact of `damage`, direct causes included.
pub fn upstream_events(case: &Case, damage: DamageId) -> BTreeSet<EventId> {
    let pp = case.preprocess();
    let mut seen: BTreeSet<EventId> = pp.damage_causes(damage).iter().copied().collect();
    let mut queue: VecDeque<EventId> = seen.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        for cause in pp.direct_causes(current) {
            if seen.insert(*cause) {
                queue.push_back(*cause);
            }
        }
    }
    seen
}

/// Acts that are a cause-in-fact of `damage`.
pub fn acts_causing(case: &Case, damage: DamageId) -> BTreeSet<EventId> {
    let acts = case.preprocess().acts();
    upstream_events(case, damage)
        .into_iter()
        .filter(|e| acts.contains(e))
        .collect()
}

/// Duties breached upstream of `damage` that were owed to one of its victims.
///
/// Walks up level by level from the damage's direct causes. An empty
/// result means no claim is derivable, which is not an error.
pub fn find_breached_duties(case: &Case, damage: DamageId) -> BTreeSet<DutyId> {
    let pp = case.preprocess();
    let victims = &case.damage(damage).persons;
    let mut result = BTreeSet::new();
    let mut seen: BTreeSet<EventId> = BTreeSet::new();
    let mut level: Vec<EventId> = pp
        .damage_causes(damage)
        .iter()
        .copied()
        .filter(|e| seen.insert(*e))
        .collect();

    while !level.is_empty() {
        let mut next = Vec::new();
        for id in level {
            if let Some(duty_id) = case.event(id).duty {
                let duty = case.duty(duty_id);
                if !intersect_persons(&duty.owed_to, victims).is_empty() {
                    result.insert(duty_id);
                }
            }
            for cause in pp.direct_causes(id) {
                if seen.insert(*cause) {
                    next.push(*cause);
                }
            }
        }
        level = next;
    }
    result
}

/// Damages attached to any event at or downstream of `start`.
pub fn find_damages<I>(case: &Case, start: I) -> BTreeSet<DamageId>
where
    I: IntoIterator<Item = EventId>,
{
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    for id in start {
        if seen.insert(id) {
            queue.push_back(id);
        }
    }

    let mut damages = BTreeSet::new();
    while let Some(id) = queue.pop_front() {
        let event = case.event(id);
        damages.extend(event.damages.iter().copied());
        for child in &event.consequences {
            if seen.insert(*child) {
                queue.push_back(*child);
            }
        }
    }
    damages
}

/// Persons present in both lists, each reported once.
pub fn intersect_persons(a: &[PersonId], b: &[PersonId]) -> BTreeSet<PersonId> {
    let right: BTreeSet<PersonId> = b.iter().copied().collect();
    a.iter().copied().filter(|p| right.contains(p)).collect()
}

/// Everyone who owes a duty breached upstream of `damage`.
pub fn defendants(case: &Case, damage: DamageId) -> BTreeSet<PersonId> {
    find_breached_duties(case, damage)
        .into_iter()
        .flat_map(|duty| case.duty(duty).owed_from.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseBuilder, DamageKind, Event};

    struct Chain {
        case: Case,
        a: EventId,
        b: EventId,
        c: EventId,
        x: EventId,
        damage: DamageId,
    }

    /// A -> B -> C, C injures Vic; X is a separate root.
    fn chain(duty_owed_to_victim: bool) -> Chain {
        let mut bld = CaseBuilder::new("chain");
        let owner = bld.person("Owner");
        let vic = bld.person("Vic");
        let stranger = bld.person("Stranger");
        let owed_to = if duty_owed_to_victim { vic } else { stranger };
        let duty = bld.duty("keep things safe", &[owner], &[owed_to]);
        let damage = bld.damage(DamageKind::BodilyInjury, "Vic breaks an arm", &[vic]);
        let c = bld.event(Event::passive("C").causing(&[damage]));
        let b = bld.event(Event::act(owner, "B").leads_to(&[c]).breaching(duty));
        let a = bld.event(Event::passive("A").leads_to(&[b]));
        let x = bld.event(Event::passive("X"));
        bld.root(a).root(x);
        Chain {
            case: bld.build().unwrap(),
            a,
            b,
            c,
            x,
            damage,
        }
    }

    #[test]
    fn cause_in_fact_along_chain() {
        let t = chain(true);
        assert!(is_cause_in_fact(&t.case, t.damage, t.a));
        assert!(is_cause_in_fact(&t.case, t.damage, t.b));
        assert!(is_cause_in_fact(&t.case, t.damage, t.c));
        assert!(!is_cause_in_fact(&t.case, t.damage, t.x));
    }

    #[test]
    fn ancestor_is_reflexive_and_directed() {
        let t = chain(true);
        assert!(is_ancestor(&t.case, t.b, t.b));
        assert!(is_ancestor(&t.case, t.a, t.c));
        assert!(!is_ancestor(&t.case, t.c, t.a));
    }

    #[test]
    fn duty_owed_to_victim_is_breached() {
        let t = chain(true);
        let duties = find_breached_duties(&t.case, t.damage);
        assert_eq!(duties.len(), 1);
        let owner = t.case.find_person("Owner").unwrap();
        assert_eq!(defendants(&t.case, t.damage), BTreeSet::from([owner]));
    }

    #[test]
    fn duty_owed_to_stranger_is_ignored() {
        let t = chain(false);
        assert!(find_breached_duties(&t.case, t.damage).is_empty());
        assert!(defendants(&t.case, t.damage).is_empty());
    }

    #[test]
    fn find_damages_downstream() {
        let t = chain(true);
        assert_eq!(find_damages(&t.case, [t.a]), BTreeSet::from([t.damage]));
        assert!(find_damages(&t.case, [t.x]).is_empty());
    }

    #[test]
    fn acts_causing_only_returns_acts() {
        let t = chain(true);
        assert_eq!(acts_causing(&t.case, t.damage), BTreeSet::from([t.b]));
        assert_eq!(upstream_events(&t.case, t.damage).len(), 3);
    }

    #[test]
    fn intersect_persons_counts_duplicates_once() {
        let mut bld = CaseBuilder::new("people");
        let p = bld.person("P");
        let q = bld.person("Q");
        let r = bld.person("R");
        let got = intersect_persons(&[p, p, q], &[q, p, p, r]);
        assert_eq!(got, BTreeSet::from([p, q]));
        assert!(intersect_persons(&[r], &[p, q]).is_empty());
    }
}
