use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nits_core::catalog::standard_content;
use nits_core::{
    AnswerOption, Concept, ConceptId, Content, ContentBuilder, MultipleChoiceQuestion, Question,
};
use nits_tutor::{
    EstimatorError, RowPredictions, Selection, SkillEstimator, TraceRow, Tutor,
};

// ── Stub estimators ──────────────────────────────────────────────────

/// Reports a fixed score per concept, zero for anything else.
struct FixedScores {
    scores: BTreeMap<ConceptId, f64>,
    calls: Arc<AtomicUsize>,
}

impl FixedScores {
    fn new(scores: &[(&str, f64)]) -> Self {
        FixedScores {
            scores: scores
                .iter()
                .map(|(c, s)| (ConceptId::from(*c), *s))
                .collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SkillEstimator for FixedScores {
    async fn fit(&self, rows: &[TraceRow]) -> Result<RowPredictions, EstimatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(rows
            .iter()
            .map(|row| {
                row.concepts
                    .iter()
                    .map(|c| self.scores.get(c).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct Broken;

#[async_trait]
impl SkillEstimator for Broken {
    async fn fit(&self, _rows: &[TraceRow]) -> Result<RowPredictions, EstimatorError> {
        Err(EstimatorError::NotFound { tried: Vec::new() })
    }

    fn name(&self) -> &str {
        "broken"
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

fn mc(short_name: &str, concepts: &[&str]) -> Question {
    Question::MultipleChoice(MultipleChoiceQuestion {
        short_name: short_name.to_string(),
        stem: vec![format!("Question {short_name}?")],
        concepts: concepts.iter().map(|c| ConceptId::from(*c)).collect(),
        answers: vec![AnswerOption::right("yes"), AnswerOption::wrong("no")],
    })
}

fn race_content() -> Content {
    let mut b = ContentBuilder::new();
    b.concept(Concept::new("near", "nearly mastered", 1))
        .concept(Concept::new("far", "barely started", 1))
        .question(mc("warmup", &["near", "far"]))
        .question(mc("weak", &["far"]))
        .question(mc("strong", &["near"]));
    b.build().unwrap()
}

fn tutor(content: Content, estimator: impl SkillEstimator + 'static) -> Tutor {
    Tutor::new(Arc::new(content), Box::new(estimator)).with_seed(11)
}

// ── Selection ────────────────────────────────────────────────────────

#[tokio::test]
async fn race_to_mastery_prefers_higher_average() {
    let mut t = tutor(race_content(), FixedScores::new(&[("near", 0.9), ("far", 0.3)]));
    t.register_answer("warmup", None, true).unwrap();

    let selection = t.select().await;
    assert!(matches!(selection, Selection::Adaptive(ref q) if q == "strong"));
    assert_eq!(t.state().score(&ConceptId::from("near")), 0.9);
}

#[tokio::test]
async fn no_history_means_no_estimator_call() {
    let estimator = FixedScores::new(&[]);
    let calls = Arc::clone(&estimator.calls);
    let mut t = tutor(race_content(), estimator);

    assert!(t.select().await.question().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(t.state().scores().is_empty());
}

#[tokio::test]
async fn selection_terminates_within_question_count() {
    let content = standard_content().unwrap();
    let limit = content.questions().len();
    let mut t = tutor(content, FixedScores::new(&[]));

    let mut asked = 0;
    while let Some(question) = t.select().await.question().map(str::to_string) {
        t.burn(&question).unwrap();
        asked += 1;
        assert!(asked <= limit, "selection did not terminate");
    }
    assert_eq!(asked, limit);
}

#[tokio::test]
async fn mastered_content_is_exhausted() {
    let mut t = tutor(race_content(), FixedScores::new(&[("near", 0.95), ("far", 0.99)]));
    t.register_answer("warmup", None, true).unwrap();

    assert!(matches!(t.select().await, Selection::Exhausted));
}

#[tokio::test]
async fn staged_question_is_returned_once() {
    let mut t = tutor(race_content(), FixedScores::new(&[("near", 0.9)]));
    t.register_answer("warmup", None, true).unwrap();
    t.stage_next("weak").unwrap();

    assert!(matches!(t.select().await, Selection::Override(ref q) if q == "weak"));
    assert!(matches!(t.select().await, Selection::Adaptive(ref q) if q == "strong"));
    assert!(t.stage_next("nope").is_err());
}

#[tokio::test]
async fn estimator_failure_falls_back_to_first_unburnt() {
    let mut t = tutor(race_content(), Broken);
    t.register_answer("warmup", None, true).unwrap();

    match t.select().await {
        Selection::Fallback { question, reason } => {
            assert_eq!(question, "weak");
            assert!(!reason.is_recoverable());
        }
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn ranking_after_an_override_uses_fresh_scores() {
    let mut t = tutor(race_content(), FixedScores::new(&[("near", 0.9), ("far", 0.3)]));
    t.register_answer("warmup", None, true).unwrap();
    t.stage_next("weak").unwrap();
    assert!(matches!(t.select().await, Selection::Override(_)));

    let ranked = t.ranked_candidates().await;
    let listed: Vec<(&str, f64)> = ranked
        .iter()
        .map(|c| (c.short_name.as_str(), c.average))
        .collect();
    assert_eq!(listed, vec![("strong", 0.9), ("weak", 0.3)]);
}

// ── Cases ────────────────────────────────────────────────────────────

#[tokio::test]
async fn case_sub_questions_run_out_and_burn_the_case() {
    let mut t = tutor(standard_content().unwrap(), FixedScores::new(&[]));
    let case = "case_ashton_car_crash";
    let mut session = nits_tutor::CaseSession::new();

    let mut prompts = 0;
    while let Some(prompt) = t.next_sub_question(case, &mut session).unwrap() {
        t.register_answer(case, Some(prompt.kind()), true).unwrap();
        prompts += 1;
    }
    assert_eq!(prompts, 8);
    assert!(t.state().is_burnt(case));
    assert!(t.register_answer(case, None, true).is_err());
    assert!(t.next_sub_question("foreseeability_basic", &mut session).is_err());
}

#[tokio::test]
async fn mastered_sub_questions_drop_out_mid_case() {
    let estimator = FixedScores::new(&[
        ("causeinfact1", 0.99),
        ("defendant0", 0.99),
        ("negperse1", 0.99),
        ("primafacie", 0.99),
    ]);
    let mut t = tutor(standard_content().unwrap(), estimator);
    let case = "case_ashton_car_crash";
    let mut session = nits_tutor::CaseSession::new();

    let mut asked = Vec::new();
    while let Some(prompt) = t.next_sub_question(case, &mut session).unwrap() {
        t.register_sub_answer(case, prompt.kind(), true).await.unwrap();
        asked.push(prompt.kind());
    }
    asked.sort();
    asked.dedup();
    assert_eq!(asked.len(), 4, "each type asked once: {asked:?}");
    assert_eq!(t.state().answers().len(), 4);
}

#[tokio::test]
async fn sub_answer_keeps_scores_when_training_fails() {
    let mut t = tutor(standard_content().unwrap(), Broken);
    t.register_sub_answer("case_ashton_car_crash", nits_core::SubQuestionKind::PrimaFacie, true)
        .await
        .unwrap();
    assert_eq!(t.state().answers().len(), 1);
    assert!(t.state().scores().is_empty());
}
