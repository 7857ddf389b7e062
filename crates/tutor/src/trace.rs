//! Knowledge-tracing input rows and the `train` step.

use std::collections::BTreeMap;

use nits_core::{ConceptId, Content};

use crate::error::EstimatorError;
use crate::estimator::SkillEstimator;
use crate::state::Answer;

/// Constant student identifier written into every row.
pub const STUDENT_ID: &str = "student";
/// Separator between concept ids in the concept column.
pub const CONCEPT_SEPARATOR: &str = "~";

/// One answer, ready for the skill estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    pub correct: bool,
    /// `questionShortName` or `questionShortName#subQuestionTag`.
    pub tag: String,
    /// Training concepts, sorted by concept name.
    pub concepts: Vec<ConceptId>,
}

impl TraceRow {
    /// Tab-separated line: correctness (`1`/`2`), student, tag, concepts.
    pub fn to_line(&self) -> String {
        let concepts: Vec<&str> = self.concepts.iter().map(ConceptId::as_str).collect();
        format!(
            "{}\t{}\t{}\t{}",
            if self.correct { "1" } else { "2" },
            STUDENT_ID,
            self.tag,
            concepts.join(CONCEPT_SEPARATOR)
        )
    }
}

/// Rows for every answer that still resolves against `content`.
pub fn trace_rows(content: &Content, answers: &[Answer]) -> Vec<TraceRow> {
    answers
        .iter()
        .filter_map(|answer| {
            let concepts = content
                .find_question(&answer.question)
                .and_then(|q| content.training_concepts(q, answer.sub_question));
            let Some(concepts) = concepts else {
                tracing::debug!(
                    question = %answer.question,
                    sub_question = ?answer.sub_question,
                    "skipping answer that no longer resolves"
                );
                return None;
            };
            let tag = match answer.sub_question {
                Some(sub) => format!("{}#{}", answer.question, sub.tag()),
                None => answer.question.clone(),
            };
            Some(TraceRow {
                correct: answer.correct,
                tag,
                concepts,
            })
        })
        .collect()
}

/// Re-fits the skill model on the whole history and returns the latest
/// mastery score per concept.
///
/// With no usable history the estimator is not called at all.
pub async fn train(
    content: &Content,
    answers: &[Answer],
    estimator: &dyn SkillEstimator,
) -> Result<BTreeMap<ConceptId, f64>, EstimatorError> {
    let rows = trace_rows(content, answers);
    if rows.is_empty() {
        return Ok(BTreeMap::new());
    }

    tracing::info!(estimator = estimator.name(), rows = rows.len(), "training skill model");
    let predictions = estimator.fit(&rows).await?;
    if predictions.len() != rows.len() {
        return Err(EstimatorError::prediction(format!(
            "expected {} rows, got {}",
            rows.len(),
            predictions.len()
        )));
    }

    let mut scores = BTreeMap::new();
    for (row, values) in rows.iter().zip(predictions) {
        if values.len() != row.concepts.len() {
            return Err(EstimatorError::prediction(format!(
                "row {} has {} concepts but {} predictions",
                row.tag,
                row.concepts.len(),
                values.len()
            )));
        }
        for (concept, value) in row.concepts.iter().zip(values) {
            scores.insert(concept.clone(), value);
        }
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nits_core::catalog::standard_content;
    use nits_core::SubQuestionKind;

    #[test]
    fn row_line_format() {
        let row = TraceRow {
            correct: false,
            tag: "case_ashton_car_crash#causeInFact".to_string(),
            concepts: vec![ConceptId::from("a"), ConceptId::from("b")],
        };
        assert_eq!(
            row.to_line(),
            "2\tstudent\tcase_ashton_car_crash#causeInFact\ta~b"
        );
    }

    #[test]
    fn rows_skip_unresolvable_answers() {
        let content = standard_content().unwrap();
        let answers = vec![
            Answer::new("foreseeability_basic", None, true),
            Answer::new("deleted_question", None, true),
            Answer::new(
                "case_ashton_car_crash",
                Some(SubQuestionKind::Defendants),
                false,
            ),
        ];
        let rows = trace_rows(&content, &answers);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_line(), "1\tstudent\tforeseeability_basic\tforeseeability1");
        assert_eq!(rows[1].tag, "case_ashton_car_crash#defendants");
        assert_eq!(rows[1].concepts, vec![ConceptId::from("defendant0")]);
    }
}
