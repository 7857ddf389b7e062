//! nits-tutor: knowledge tracing and adaptive question selection.
//!
//! # Public API
//!
//! - [`StudentState`] -- answer history, burnt questions and scores
//! - [`train`] -- refit the skill model from the whole history
//! - [`SkillEstimator`] -- the fitting seam: [`TrainHmm`] runs the
//!   external binary, [`InProcessBkt`] fits the same model in-process
//! - [`select_question`] -- race-to-mastery selection
//! - [`CaseSession`] / [`SubQuestionPrompt`] -- sub-questions on a case
//! - [`Tutor`] -- all of the above for one session, plus persistence

pub mod error;
pub mod estimator;
pub mod selection;
pub mod state;
pub mod subquestion;
pub mod trace;
pub mod tutor;

// ── Convenience re-exports ───────────────────────────────────────────

pub use error::{EstimatorError, TutorError};
pub use estimator::{BktParams, InProcessBkt, RowPredictions, SkillEstimator, TrainHmm};
pub use selection::{candidates, rank, select_question, Candidate, Selection};
pub use state::{Answer, StudentState, MASTERY_THRESHOLD};
pub use subquestion::{CaseSession, SubQuestionAnswer, SubQuestionPrompt, MAX_TIMES_ASKED};
pub use trace::{train, trace_rows, TraceRow};
pub use tutor::{Restored, Tutor};
