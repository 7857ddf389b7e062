//! The built-in "Ashton car crash" case.
//!
//! Used by the standard catalog and as the fixture for causality tests.

use crate::case::{Case, CaseBuilder, DamageKind, Event};
use crate::concept::Explanation;
use crate::error::ContentError;

pub const DEFAULT_CASE_NAME: &str = "case_ashton_car_crash";

const TEXT: [&str; 3] = [
    "Ashton left his home at 5:00 p.m. on Thursday, November 12, 2010, for a doctor's \
     appointment. His appointment was at 5:30 p.m. and it would take him at least 25 minutes to \
     reach his doctor's office. As Ashton pulled into traffic, he noted that the yellow low oil \
     pressure light on his dashboard was on. He was concerned, because he had just taken the car \
     in for a routine service and oil change at Mayko the day before. He pulled over to the side of \
     the road, pulled his receipt from the dashboard, and used his cell phone to call Demi, the \
     owner of Mayko. Demi assured Ashton that the light did not really mean that the oil pressure \
     was low because they had just changed it the day before. Instead, Demi said, the light was \
     probably just the result of a failure to reset a switch when they changed the oil or some sort of \
     short in the wiring. Demi advised Ashton to bring the car by at his convenience, and that she \
     would reset or repair the light.",
    "Relieved, Ashton continued down the highway toward his doctor's office. A few minutes \
     later, when Ashton was less than a mile from his doctor's office, he saw smoke coming from \
     the hood of the car. He tried to pull over to the side of the road, but before he could make it, \
     his engine died completely and the volume of smoke became even greater. Ashton dashed \
     from the car, leaving it in the right hand lane of traffic. A small fire erupted from the sides of \
     the hood. Again using his cell phone, Ashton dialed 911 and requested fire department and \
     police assistance.",
    "But before fire or police units arrived, a car driven by Bruce plowed into the back of Ashton's \
     car. Bruce was not injured, but his passenger, Rooke, was thrown from the car and suffered \
     serious injuries. The police determined that although Bruce had been wearing a seatbelt at the \
     time of the collision, Rooke was not wearing a seatbelt. The police also determined that both \
     Bruce and Rooke, who had been drinking together all afternoon, had blood alcohol levels over \
     the legal limit. Bruce claimed that he did not see Ashton's car in time to stop because the 18-\
     wheeler in front of him had obscured his view of what was in the lane ahead. When the truck \
     changed lanes just before reaching Ashton's disabled car, Bruce was suddenly able to see \
     Ashton's car, but not in time to stop. An investigation reveals that Ashton's car stalled \
     because it ran out of oil. Demi had failed to replace the oil pan properly and all the oil in the \
     car had drained out.",
];

pub fn default_case() -> Result<Case, ContentError> {
    let mut b = CaseBuilder::new(DEFAULT_CASE_NAME);
    for paragraph in TEXT {
        b.paragraph(paragraph);
    }

    let ashton = b.person("Ashton");
    let demi = b.person("Demi");
    let bruce = b.person("Bruce");
    let rooke = b.person("Rooke");

    let good_oil_change = b.duty("Perform a good quality oil change", &[demi], &[ashton]);
    let good_advice = b.duty("Give good advice", &[demi], &[ashton]);
    let leave_cars_safely = b.duty(
        "Cars should not be left in the middle of the road.",
        &[ashton],
        &[bruce, rooke, demi],
    );

    let rookes_injury = b.damage(
        DamageKind::BodilyInjury,
        "Rooke suffers serious injuries because of being thrown from the car",
        &[rooke],
    );
    let bruces_damage = b.damage(
        DamageKind::PropertyDamage,
        "Bruce's car is seriously damaged because of the accident",
        &[bruce],
    );

    let thrown = b.event(
        Event::passive("Rooke gets thrown from the car")
            .named("rooke_thrown")
            .causing(&[rookes_injury]),
    );
    let seatbelt = b.requirement(
        "Rooke did not wear a seatbelt",
        &[rooke],
        &[thrown],
        Some(Explanation::new([
            "Riding without a seatbelt violates the seatbelt statute, which exists to prevent \
             exactly this kind of injury.",
        ])),
    );
    b.attach_requirement(thrown, seatbelt);

    let didnt_see = b.claim(
        bruce,
        "Bruce claims that he did not see Ashton's car because of the truck in front of him",
        Some(Explanation::new([
            "A driver must keep a distance that lets them stop for whatever is in the lane ahead, \
             so an obscured view does not excuse the collision.",
        ])),
    );
    let plows = b.event(
        Event::act(bruce, "Bruce plows his car into Ashton's car")
            .named("plows")
            .leads_to(&[thrown])
            .causing(&[bruces_damage])
            .with_claim(didnt_see),
    );
    let drunk = b.requirement(
        "Bruce had drank too much and had blood alcohol levels over the legal limit",
        &[bruce],
        &[plows],
        Some(Explanation::new([
            "Driving over the legal blood alcohol limit violates a traffic statute meant to protect \
             other road users.",
        ])),
    );
    b.attach_requirement(plows, drunk);

    let dials_911 = b.event(
        Event::act(
            ashton,
            "Ashton dials 911 and requests fire department and police assistance",
        )
        .named("dials_911"),
    );
    let flees = b.event(
        Event::act(ashton, "Ashton abandons the car")
            .named("flees")
            .breaching(leave_cars_safely)
            .leads_to(&[plows]),
    );
    let car_dies = b.event(
        Event::passive("The engine of Ashton's car dies")
            .named("car_dies")
            .leads_to(&[flees, dials_911]),
    );
    let smoke = b.event(Event::passive(
        "Smoke comes out from under the hood of Ashton's car",
    ));
    let continues = b.event(
        Event::act(ashton, "Ashton continues to drive his car")
            .named("continues_driving")
            .leads_to(&[smoke, car_dies]),
    );
    let bad_advice = b.event(
        Event::act(
            demi,
            "Demi advises Ashton to continue driving and to bring the car in at his convenience",
        )
        .named("bad_advice")
        .breaching(good_advice)
        .leads_to(&[continues]),
    );
    let asks = b.event(
        Event::act(ashton, "Ashton calls Demi and asks for advice")
            .named("asks_advice")
            .leads_to(&[bad_advice]),
    );
    let oil_light = b.event(
        Event::passive("The low oil indicator in Ashton's car flips on").leads_to(&[asks]),
    );
    let low_oil = b.event(Event::passive("Ashton's car is low on oil").leads_to(&[oil_light]));
    let bad_oil_change = b.event(
        Event::act(demi, "Demi (or Mayko) performs a bad oil change on Ashton's car")
            .named("bad_oil_change")
            .breaching(good_oil_change)
            .leads_to(&[low_oil]),
    );

    b.root(bad_oil_change);
    b.build()
}
