//! Case analysis: prima facie elements and a per-damage report.
//!
//! The report is the human/JSON view of everything the graph queries
//! can derive about a case. It is keyed by names and descriptions
//! rather than arena ids so it can be printed or serialized as-is.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::case::{Case, DamageId, DamageKind, DutyId, EventId, PersonId};
use crate::graph;

/// The four prima facie elements for one damage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaFacie {
    pub damage: DamageId,
    /// Persons who suffered the damage.
    pub plaintiffs: BTreeSet<PersonId>,
    /// Duties owed to a plaintiff and breached upstream of the damage.
    pub duties: BTreeSet<DutyId>,
    pub defendants: BTreeSet<PersonId>,
    /// The events that breached those duties. Each is a cause-in-fact.
    pub breaches: BTreeSet<EventId>,
    compensable: bool,
}

impl PrimaFacie {
    /// Injury or property damage, owed duty, breach, and causation.
    pub fn is_established(&self) -> bool {
        self.compensable && !self.plaintiffs.is_empty() && !self.duties.is_empty()
    }
}

pub fn prima_facie(case: &Case, damage: DamageId) -> PrimaFacie {
    let pp = case.preprocess();
    let duties = graph::find_breached_duties(case, damage);
    let breaches = duties
        .iter()
        .filter_map(|d| pp.breaching_event(*d))
        .filter(|e| graph::is_cause_in_fact(case, damage, *e))
        .collect();
    let defendants = duties
        .iter()
        .flat_map(|d| case.duty(*d).owed_from.iter().copied())
        .collect();
    let injury = case.damage(damage);

    PrimaFacie {
        damage,
        plaintiffs: injury.persons.iter().copied().collect(),
        duties,
        defendants,
        breaches,
        compensable: matches!(
            injury.kind,
            DamageKind::BodilyInjury | DamageKind::PropertyDamage
        ),
    }
}

// ── Report ─────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub case: String,
    pub text: Vec<String>,
    pub events: usize,
    pub persons: Vec<String>,
    pub damages: Vec<DamageReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DamageReport {
    pub description: String,
    pub kind: DamageKind,
    pub victims: Vec<String>,
    pub direct_causes: Vec<String>,
    pub breached_duties: Vec<DutyReport>,
    pub defendants: Vec<String>,
    pub prima_facie: bool,
    /// Statutes violated upstream of, or leading to, the damage.
    pub broken_requirements: Vec<String>,
    pub claims: Vec<ClaimReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DutyReport {
    pub description: String,
    pub owed_from: Vec<String>,
    pub owed_to: Vec<String>,
    pub breached_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimReport {
    pub person: String,
    pub description: String,
}

impl CaseReport {
    pub fn build(case: &Case) -> Self {
        let pp = case.preprocess();
        let names = |ids: &mut dyn Iterator<Item = PersonId>| -> Vec<String> {
            ids.map(|p| case.person(p).name.clone()).collect()
        };

        let damages = pp
            .damages()
            .iter()
            .map(|&damage| {
                let injury = case.damage(damage);
                let upstream = graph::upstream_events(case, damage);
                let pf = prima_facie(case, damage);

                let breached_duties = pf
                    .duties
                    .iter()
                    .map(|&d| {
                        let duty = case.duty(d);
                        DutyReport {
                            description: duty.description.clone(),
                            owed_from: names(&mut duty.owed_from.iter().copied()),
                            owed_to: names(&mut duty.owed_to.iter().copied()),
                            breached_by: pp
                                .breaching_event(d)
                                .map(|e| case.event(e).description.clone()),
                        }
                    })
                    .collect();

                let broken_requirements = pp
                    .requirements()
                    .iter()
                    .filter(|&&r| {
                        pp.requirement_event(r).is_some_and(|e| upstream.contains(&e))
                            || graph::find_damages(
                                case,
                                case.requirement(r).consequences.iter().copied(),
                            )
                            .contains(&damage)
                    })
                    .map(|&r| case.requirement(r).description.clone())
                    .collect();

                let claims = pp
                    .claims()
                    .iter()
                    .filter(|&&c| pp.claim_event(c).is_some_and(|e| upstream.contains(&e)))
                    .map(|&c| {
                        let claim = case.claim(c);
                        ClaimReport {
                            person: case.person(claim.person).name.clone(),
                            description: claim.description.clone(),
                        }
                    })
                    .collect();

                DamageReport {
                    description: injury.description.clone(),
                    kind: injury.kind,
                    victims: names(&mut injury.persons.iter().copied()),
                    direct_causes: pp
                        .damage_causes(damage)
                        .iter()
                        .map(|e| case.event(*e).description.clone())
                        .collect(),
                    breached_duties,
                    defendants: names(&mut pf.defendants.iter().copied()),
                    prima_facie: pf.is_established(),
                    broken_requirements,
                    claims,
                }
            })
            .collect();

        CaseReport {
            case: case.short_name().to_string(),
            text: case.text().to_vec(),
            events: pp.events().len(),
            persons: names(&mut pp.persons().iter().copied()),
            damages,
        }
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Case: {}", self.case)?;
        writeln!(f, "  Events: {}", self.events)?;
        writeln!(f, "  Persons: {}", self.persons.join(", "))?;
        for damage in &self.damages {
            writeln!(f)?;
            writeln!(f, "  Damage: {} ({:?})", damage.description, damage.kind)?;
            writeln!(f, "    Victims: {}", damage.victims.join(", "))?;
            for cause in &damage.direct_causes {
                writeln!(f, "    Direct cause: {}", cause)?;
            }
            for duty in &damage.breached_duties {
                writeln!(
                    f,
                    "    Breached duty: {} (owed by {} to {})",
                    duty.description,
                    duty.owed_from.join(", "),
                    duty.owed_to.join(", ")
                )?;
                if let Some(event) = &duty.breached_by {
                    writeln!(f, "      breached by: {}", event)?;
                }
            }
            if damage.defendants.is_empty() {
                writeln!(f, "    Defendants: none")?;
            } else {
                writeln!(f, "    Defendants: {}", damage.defendants.join(", "))?;
            }
            for req in &damage.broken_requirements {
                writeln!(f, "    Broken legal requirement: {}", req)?;
            }
            for claim in &damage.claims {
                writeln!(f, "    Claim by {}: {}", claim.person, claim.description)?;
            }
            writeln!(
                f,
                "    Prima facie case: {}",
                if damage.prima_facie { "yes" } else { "no" }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseBuilder, Event};

    fn fall(kind: DamageKind) -> (Case, DamageId) {
        let mut b = CaseBuilder::new("fall");
        let shop = b.person("Shop");
        let guest = b.person("Guest");
        let duty = b.duty("keep the floor dry", &[shop], &[guest]);
        let damage = b.damage(kind, "Guest is hurt", &[guest]);
        let slip = b.event(Event::passive("Guest slips").causing(&[damage]));
        let mop = b.event(Event::act(shop, "leaves the floor wet").leads_to(&[slip]).breaching(duty));
        b.paragraph("A guest slips on a wet floor.").root(mop);
        (b.build().unwrap(), damage)
    }

    #[test]
    fn prima_facie_established() {
        let (case, damage) = fall(DamageKind::BodilyInjury);
        let pf = prima_facie(&case, damage);
        assert!(pf.is_established());
        assert_eq!(pf.defendants.len(), 1);
        assert_eq!(pf.breaches.len(), 1);
    }

    #[test]
    fn emotional_harm_alone_is_not_prima_facie() {
        let (case, damage) = fall(DamageKind::EmotionalHarm);
        assert!(!prima_facie(&case, damage).is_established());
    }

    #[test]
    fn report_lists_defendants_and_duties() {
        let (case, _) = fall(DamageKind::BodilyInjury);
        let report = CaseReport::build(&case);
        assert_eq!(report.damages.len(), 1);
        let d = &report.damages[0];
        assert_eq!(d.defendants, vec!["Shop".to_string()]);
        assert_eq!(d.breached_duties[0].breached_by.as_deref(), Some("leaves the floor wet"));
        let text = report.to_string();
        assert!(text.contains("Prima facie case: yes"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["damages"][0]["kind"], "BodilyInjury");
    }
}
