//! Causal queries against the built-in Ashton case.

use std::collections::BTreeSet;

use nits_core::default_case::default_case;
use nits_core::graph::{
    acts_causing, defendants, find_breached_duties, find_damages, is_ancestor, is_cause_in_fact,
};
use nits_core::{prima_facie, Case, DamageId, EventId};

fn event(case: &Case, name: &str) -> EventId {
    case.find_event(name)
        .unwrap_or_else(|| panic!("event {name} not in the default case"))
}

fn damage_of(case: &Case, person: &str) -> DamageId {
    let person = case.find_person(person).unwrap();
    case.preprocess().damages_of(person).next().unwrap()
}

fn names(case: &Case, persons: BTreeSet<nits_core::PersonId>) -> Vec<String> {
    persons
        .into_iter()
        .map(|p| case.person(p).name.clone())
        .collect()
}

#[test]
fn car_dies_is_ancestor_of_plows_but_not_the_reverse() {
    let case = default_case().unwrap();
    let plows = event(&case, "plows");
    let car_dies = event(&case, "car_dies");
    assert!(is_ancestor(&case, car_dies, plows));
    assert!(!is_ancestor(&case, plows, car_dies));
}

#[test]
fn whole_chain_is_cause_in_fact_of_rookes_injury() {
    let case = default_case().unwrap();
    let injury = damage_of(&case, "Rooke");
    for name in ["bad_oil_change", "bad_advice", "car_dies", "flees", "plows", "rooke_thrown"] {
        assert!(
            is_cause_in_fact(&case, injury, event(&case, name)),
            "{name} should be a cause in fact"
        );
    }
    assert!(!is_cause_in_fact(&case, injury, event(&case, "dials_911")));
}

#[test]
fn rookes_injury_is_not_a_cause_of_bruces_damage() {
    let case = default_case().unwrap();
    let bruces = damage_of(&case, "Bruce");
    assert!(is_cause_in_fact(&case, bruces, event(&case, "plows")));
    assert!(!is_cause_in_fact(&case, bruces, event(&case, "rooke_thrown")));
}

#[test]
fn only_duty_owed_to_victims_is_breached() {
    let case = default_case().unwrap();
    for victim in ["Bruce", "Rooke"] {
        let damage = damage_of(&case, victim);
        let duties = find_breached_duties(&case, damage);
        let descriptions: Vec<&str> = duties
            .iter()
            .map(|d| case.duty(*d).description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec!["Cars should not be left in the middle of the road."]
        );
        assert_eq!(names(&case, defendants(&case, damage)), vec!["Ashton"]);
    }
}

#[test]
fn drunk_driving_statute_leads_to_both_damages() {
    let case = default_case().unwrap();
    let pp = case.preprocess();
    let drunk = pp
        .requirements()
        .iter()
        .copied()
        .find(|r| case.requirement(*r).description.starts_with("Bruce had drank"))
        .unwrap();
    assert_eq!(pp.requirement_event(drunk), Some(event(&case, "plows")));
    let damages = find_damages(&case, case.requirement(drunk).consequences.iter().copied());
    assert_eq!(damages.len(), 2);
}

#[test]
fn acts_causing_bruces_damage() {
    let case = default_case().unwrap();
    let acts = acts_causing(&case, damage_of(&case, "Bruce"));
    assert!(acts.contains(&event(&case, "plows")));
    assert!(acts.contains(&event(&case, "flees")));
    assert!(acts.contains(&event(&case, "bad_advice")));
    assert!(!acts.contains(&event(&case, "dials_911")));
}

#[test]
fn prima_facie_for_every_damage() {
    let case = default_case().unwrap();
    for damage in case.preprocess().damages().iter().copied() {
        let pf = prima_facie(&case, damage);
        assert!(pf.is_established());
        assert_eq!(pf.breaches, BTreeSet::from([event(&case, "flees")]));
    }
}

#[test]
fn preprocess_returns_the_same_index() {
    let case = default_case().unwrap();
    let first = case.preprocess();
    let second = case.preprocess();
    assert!(std::ptr::eq(first, second));
    assert_eq!(first.direct_causes(event(&case, "plows")), &[event(&case, "flees")]);
}
