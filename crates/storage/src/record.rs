use serde::{Deserialize, Serialize};

/// One persisted answer.
///
/// Serialized as `{ "shortName": ..., "correct": ..., "subQuestion": ... }`.
/// An empty `sub_question` means the answer was not to a case sub-question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub short_name: String,
    pub correct: bool,
    pub sub_question: String,
}

impl AnswerRecord {
    pub fn new(short_name: &str, sub_question: Option<&str>, correct: bool) -> Self {
        AnswerRecord {
            short_name: short_name.to_string(),
            correct,
            sub_question: sub_question.unwrap_or_default().to_string(),
        }
    }

    pub fn sub_question(&self) -> Option<&str> {
        (!self.sub_question.is_empty()).then_some(self.sub_question.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let r = AnswerRecord::new("case_ashton_car_crash", Some("defendants"), true);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["shortName"], "case_ashton_car_crash");
        assert_eq!(json["subQuestion"], "defendants");
        assert_eq!(json["correct"], true);
    }

    #[test]
    fn empty_sub_question_means_none() {
        let r: AnswerRecord =
            serde_json::from_str(r#"{"shortName":"q","correct":false,"subQuestion":""}"#).unwrap();
        assert_eq!(r.sub_question(), None);
        assert!(!r.correct);
    }

    #[test]
    fn missing_field_is_rejected() {
        let r = serde_json::from_str::<AnswerRecord>(r#"{"shortName":"q","correct":true}"#);
        assert!(r.is_err());
    }
}
