//! The built-in catalog: standard tort-law concepts, a handful of
//! authored questions, the default case and the four sub-question types.

use crate::concept::{Concept, ConceptId, Explanation, Reference};
use crate::content::{Content, ContentBuilder};
use crate::default_case::default_case;
use crate::error::ContentError;
use crate::question::{
    AnswerOption, MultipleChoiceQuestion, PropsQuestion, Proposition, Question, SubQuestionKind,
};

pub fn standard_concepts() -> Vec<Concept> {
    vec![
        Concept::new("defendant0", "defendant", 0)
            .explained(Explanation::new([
                "Defendants are the people that are being sued. Typically these are the people \
                 who are claimed to be responsible for the damages of the plaintiff.",
            ]))
            .related_to(&["plaintiff0"]),
        Concept::new("plaintiff0", "plaintiff", 0)
            .explained(Explanation::new([
                "Plaintiffs are the people that sue. Typically these are the people that have \
                 suffered some form of damage and who are trying to recover these damages from \
                 the defendants.",
            ]))
            .related_to(&["defendant0"]),
        Concept::new("foreseeability1", "foreseeability (basic)", 1),
        Concept::new("causeinfact1", "cause in fact (basic)", 1).explained(Explanation::new([
            "Cause-in-fact causation requires a plaintiff to show that he or she would not have \
             been injured but for the defendant's actions. The essential question in determining \
             the cause-in-fact is whether the plaintiff's injuries would have resulted regardless \
             of the defendant's negligence.",
        ])),
        Concept::new("compneg1", "comparative negligence", 1)
            .hint("Is the plaintiff negligent themselves?")
            .explained(
                Explanation::new([
                    "Comparative negligence is a doctrine where the damages that the defendant is \
                     liable for are reduced because the plaintiff is herself somewhat at fault for \
                     the injury or damage.",
                ])
                .with_reference(Reference::Url(
                    "https://en.wikipedia.org/wiki/Comparative_negligence".to_string(),
                )),
            )
            .related_to(&["modcompneg1", "purecompneg1", "contribneg1"]),
        Concept::new("modcompneg1", "modified comparative negligence", 1)
            .explained(Explanation::new([
                "The doctrine of modified comparative negligence is a form of comparative \
                 negligence where there is a threshold for the plaintiff's contribution to the \
                 injury or damage. There are two variants of this doctrine, depending on whether \
                 an exact 50% culpability on the side of the plaintiff bars recovery or not.",
            ]))
            .hint("What is the difference between this and pure comparative negligence?")
            .related_to(&["compneg1", "purecompneg1", "contribneg1"]),
        Concept::new("purecompneg1", "pure comparative negligence", 1)
            .explained(Explanation::new([
                "In pure comparative negligence there is no threshold for barring the plaintiff \
                 from recovering part of the damages, even though she is responsible for some (or \
                 a large) part of the injury or property damages. For instance in pure comparative \
                 negligence you can recover 5% of the damages if you yourself are 95% at fault.",
            ]))
            .hint("To what extent (percentage) is the plaintiff responsible for the injury or damage?")
            .hint("Is there a threshold for the extent (percentage) that the plaintiff is responsible?")
            .related_to(&["compneg1", "modcompneg1", "contribneg1"]),
        Concept::new("contribneg1", "contributory negligence", 1)
            .related_to(&["compneg1", "modcompneg1", "purecompneg1"]),
        Concept::new("prepond1", "preponderance of the elements", 1),
        Concept::new("assumprisk1", "assumption of risk", 1),
        Concept::new("negperse1", "negligence per se", 1).explained(
            Explanation::new([
                "In order for there to be negligence per se, the defendant must have been acting \
                 in violation of a statute or regulation.",
                "To prove negligence per se the plaintiff must prove that the defendant was in \
                 violation of a statute or regulation, that the statute or regulation was designed \
                 to prevent the kind of harm that the plaintiff suffered, and that the plaintiff is \
                 in the class of people that the statute or regulation sought to protect.",
            ])
            .with_reference(Reference::Restatement {
                paragraph: "288".to_string(),
            }),
        ),
        Concept::new("resipsa1", "res ipsa loquitur (basic)", 1).explained(Explanation::new([
            "Res ipsa loquitur: the thing speaks for itself.",
            "The doctrine of res ipsa loquitur can be called in when, even though it is not \
             exactly known what happened, it is obvious that something negligent happened. The \
             doctrinal example is a sack of flour falling from above and landing on someone's head.",
        ])),
        Concept::new("vicliab1", "vicarious liability", 1).explained(Explanation::new([
            "Vicarious liability is a legal doctrine whereby a person who is not personally at \
             fault is legally required to bear the burden of another's tortious wrongdoing.",
        ])),
        Concept::new("pundam1", "punitive damages", 1).explained(Explanation::new([
            "Punitive damages (as opposed to compensatory damages) are designed to prevent others \
             from being hurt by the same or similar actions.",
        ])),
        Concept::new("ecodam1", "economic damages", 1).explained(Explanation::new([
            "Economic damages are compensation you receive as a result of monetary losses you \
             suffer because of an accident.",
        ])),
        Concept::new("collsrcpay1", "collateral source payments", 1).explained(
            Explanation::new([
                "Collateral source payments are payments a plaintiff might receive from for \
                 instance an insurance company for part or all of the damages. The Collateral \
                 Source Rule states that no evidence of collateral source payments may be \
                 introduced to the jury. Because of this these payments do not reduce the \
                 liability for the tortfeasor. Many states have abrogated this rule by statute.",
            ])
            .with_reference(Reference::Restatement {
                paragraph: "920A".to_string(),
            })
            .with_reference(Reference::Url(
                "https://www.claimsjournal.com/news/national/2018/01/11/282417.htm".to_string(),
            )),
        ),
        Concept::new("primafacie", "prima facie case", 2).explained(Explanation::new([
            "We say there is a prima facie case to answer if the case contains all of the \
             following four elements:",
            "1) The plaintiff suffered property damage or a bodily injury.",
            "2) The defendant has a legal duty owed to the plaintiff that sees to preventing the \
             kind of injury/damage that the plaintiff suffered.",
            "3) The defendant breached that duty.",
            "4) Proof that the defendant's breach caused the injury.",
        ])),
    ]
}

fn ids(concepts: &[&str]) -> Vec<ConceptId> {
    concepts.iter().map(|c| ConceptId::new(*c)).collect()
}

pub fn standard_questions() -> Vec<Question> {
    vec![
        Question::MultipleChoice(MultipleChoiceQuestion {
            short_name: "foreseeability_basic".to_string(),
            stem: vec!["The concept of reasonable foreseeability is satisfied only if:".to_string()],
            concepts: ids(&["foreseeability1"]),
            answers: vec![
                AnswerOption::wrong(
                    "The plaintiff has proved, beyond a reasonable doubt, that he or she in fact \
                     suffered a loss that was caused by the defendant's carelessness.",
                ),
                AnswerOption::wrong(
                    "The defendant's behavior was virtually certain to inflict a loss on the plaintiff.",
                ),
                AnswerOption::wrong(
                    "The plaintiff has proved, on a balance of probabilities, that he or she in \
                     fact suffered a loss that was actually caused by the defendant's carelessness.",
                )
                .with_concepts(&["prepond1"]),
                AnswerOption::right(
                    "The defendant's behavior was more likely than not to inflict a loss on the plaintiff.",
                ),
                AnswerOption::none_of_the_above(false),
            ],
        }),
        Question::MultipleChoice(MultipleChoiceQuestion {
            short_name: "pure_comparative_negligence".to_string(),
            stem: vec![
                "Assume that the state of East Delaware has a statute under which Ellen would \
                 recover $60,000 of her $300,000 in damages because a jury found her to be 80% \
                 negligent in the accident in which she was injured. Which defense does the \
                 statute describe?"
                    .to_string(),
            ],
            concepts: ids(&["compneg1"]),
            answers: vec![
                AnswerOption::right("The defense of pure comparative negligence.")
                    .with_concepts(&["purecompneg1"]),
                AnswerOption::wrong("The defense of modified comparative negligence.")
                    .with_concepts(&["modcompneg1"]),
                AnswerOption::wrong("The defense of contributory negligence.")
                    .with_concepts(&["contribneg1"]),
                AnswerOption::wrong("The defense of assumption of the risk.")
                    .with_concepts(&["assumprisk1"]),
                AnswerOption::wrong("The defense of negligence per se.")
                    .with_concepts(&["negperse1"]),
            ],
        }),
        Question::MultipleChoice(MultipleChoiceQuestion {
            short_name: "contributory_negligence_pedestrian".to_string(),
            stem: vec![
                "In response to a number of accidents involving pedestrians, a city enacted a \
                 statute making it illegal to walk through the business district other than on \
                 the sidewalk. The city also enacted a statute making it illegal for a business to \
                 obstruct the sidewalk in front of its establishment. Mr. Bean was walking along \
                 the sidewalk when he discovered that a store has stacked a pile of boxes such that \
                 the sidewalk was totally obstructed. Mr. Bean stepped into the street to walk \
                 around the boxes and was struck by a negligently driven taxi. This jurisdiction \
                 follows contributory negligence rules. What is the effect of Mr. Bean's violation \
                 of the statute?"
                    .to_string(),
            ],
            concepts: ids(&["contribneg1"]),
            answers: vec![
                AnswerOption::right("It will bar his recovery as a matter of law."),
                AnswerOption::wrong("It will reduce his recovery.").with_concepts(&["compneg1"]),
                AnswerOption::wrong(
                    "It may be considered by the trier of fact on the issue of the taxi driver's liability.",
                ),
                AnswerOption::wrong("It is not relevant to determining Mr. Bean's rights."),
            ],
        }),
        Question::Props(PropsQuestion {
            short_name: "negligence_doctrines".to_string(),
            propositions: vec![
                Proposition::new(
                    "Under pure comparative negligence a plaintiff who is 95% at fault can still \
                     recover 5% of the damages.",
                    true,
                    &["purecompneg1"],
                ),
                Proposition::new(
                    "Under contributory negligence any fault of the plaintiff reduces, but never \
                     bars, recovery.",
                    false,
                    &["contribneg1"],
                ),
                Proposition::new(
                    "Negligence per se requires that the defendant violated a statute or regulation.",
                    true,
                    &["negperse1"],
                ),
            ],
        }),
    ]
}

/// The complete standard content, validated.
pub fn standard_content() -> Result<Content, ContentError> {
    let mut builder = ContentBuilder::new();
    for concept in standard_concepts() {
        builder.concept(concept);
    }
    for question in standard_questions() {
        builder.question(question);
    }
    builder
        .question(Question::Case(default_case()?))
        .sub_question(SubQuestionKind::CauseInFact, &["causeinfact1"])
        .sub_question(SubQuestionKind::Defendants, &["defendant0"])
        .sub_question(SubQuestionKind::NegligencePerSe, &["negperse1"])
        .sub_question(SubQuestionKind::PrimaFacie, &["primafacie"]);
    builder.build()
}
