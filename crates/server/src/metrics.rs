//! Prometheus metrics
//!
//! The recorder is installed once by the server binary. Pipeline metrics are
//! emitted by `seva_agent::metrics`; this module adds HTTP request metrics and
//! serves the scrape endpoint.

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

pub const HTTP_REQUESTS: &str = "seva_http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "seva_http_request_duration_seconds";
pub const ERRORS: &str = "seva_errors_total";

/// Install the global Prometheus recorder
///
/// Returns `None` when a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_metrics();
            Some(handle)
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        },
    }
}

fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS, "HTTP requests by route and status");
    describe_histogram!(HTTP_REQUEST_DURATION, Unit::Seconds, "HTTP request latency");
    describe_counter!(ERRORS, "Error responses by kind");
    describe_counter!(seva_agent::metrics::QUESTIONS, "Questions by answer language");
    describe_histogram!(
        seva_agent::metrics::RETRIEVAL_LATENCY,
        Unit::Seconds,
        "Knowledge base retrieve-and-generate latency"
    );
    describe_histogram!(
        seva_agent::metrics::SYNTHESIS_LATENCY,
        Unit::Seconds,
        "Speech synthesis latency"
    );
    describe_counter!(
        seva_agent::metrics::SYNTHESIS_FAILURES,
        "Answers delivered without audio"
    );
}

pub fn record_request(method: &str, route: &str, status: u16, duration: Duration) {
    counter!(
        HTTP_REQUESTS,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(HTTP_REQUEST_DURATION, "route" => route.to_string()).record(duration.as_secs_f64());
}

pub fn record_error(kind: &'static str) {
    counter!(ERRORS, "kind" => kind).increment(1);
}

/// Middleware recording one sample per request, labelled by matched route
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start.elapsed());
    response
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
