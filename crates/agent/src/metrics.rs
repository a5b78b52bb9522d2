//! Pipeline metrics
//!
//! Recorded through the `metrics` facade; the server installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use std::time::Duration;

pub const RETRIEVAL_LATENCY: &str = "seva_retrieval_latency_seconds";
pub const SYNTHESIS_LATENCY: &str = "seva_synthesis_latency_seconds";
pub const SYNTHESIS_FAILURES: &str = "seva_synthesis_failures_total";
pub const QUESTIONS: &str = "seva_questions_total";

pub fn record_retrieval_latency(elapsed: Duration, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    ::metrics::histogram!(RETRIEVAL_LATENCY, "outcome" => outcome).record(elapsed.as_secs_f64());
}

pub fn record_synthesis_latency(elapsed: Duration) {
    ::metrics::histogram!(SYNTHESIS_LATENCY).record(elapsed.as_secs_f64());
}

pub fn record_synthesis_failure() {
    ::metrics::counter!(SYNTHESIS_FAILURES).increment(1);
}

pub fn record_question(language: &'static str) {
    ::metrics::counter!(QUESTIONS, "language" => language).increment(1);
}
