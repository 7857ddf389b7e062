//! Conformance test suite for `HistoryStore` implementations.
//!
//! Covers:
//!
//! - **Load**: an empty store reports `NotFound`; `load_or_empty` maps it
//!   to an empty history
//! - **Round trip**: order, correctness and sub-question tags survive a
//!   save/load cycle
//! - **Overwrite**: a second save replaces the first
//!
//! # Usage
//!
//! ```ignore
//! use nits_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn file_store_conformance() {
//!     let dir = tempfile::tempdir().unwrap();
//!     let counter = std::sync::atomic::AtomicUsize::new(0);
//!     let report = run_conformance_suite(|| {
//!         let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
//!         let path = dir.path().join(format!("h{n}"));
//!         async move { JsonFileStore::new(path) }
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod load;
mod roundtrip;

use std::fmt;
use std::future::Future;

use crate::record::AnswerRecord;
use crate::HistoryStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "load", "roundtrip").
    pub category: String,
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        TestResult {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in self.results.iter().filter(|r| !r.passed) {
            writeln!(
                f,
                "  FAIL [{}/{}]: {}",
                r.category,
                r.name,
                r.message.as_deref().unwrap_or("(no message)")
            )?;
        }
        Ok(())
    }
}

/// Run the full conformance suite against a store.
///
/// `factory` is called once per test and must return a fresh, empty store.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: HistoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();
    results.extend(load::run_load_tests(&factory).await);
    results.extend(roundtrip::run_roundtrip_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();
    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

fn sample_history() -> Vec<AnswerRecord> {
    vec![
        AnswerRecord::new("foreseeability_basic", None, false),
        AnswerRecord::new("case_ashton_car_crash", Some("causeInFact"), true),
        AnswerRecord::new("case_ashton_car_crash", Some("defendants"), false),
        AnswerRecord::new("pure_comparative_negligence", None, true),
    ]
}
