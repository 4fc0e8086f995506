//! # Prometheus Metrics
//!
//! Request and lifecycle metrics recorded through the `metrics` facade.
//! The binary installs a Prometheus recorder at startup; without one (tests,
//! embedding) every macro is a no-op.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use navette_core::EntityKind;
use navette_state::Rejection;

use crate::state::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "navette_http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "navette_http_request_duration_seconds";
pub const TRANSITIONS_TOTAL: &str = "navette_transitions_total";
pub const TRANSITIONS_REJECTED_TOTAL: &str = "navette_transitions_rejected_total";

/// Install the process-wide Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Middleware that counts requests by method and status and times them.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method.clone())
        .record(started.elapsed().as_secs_f64());
    counter!(HTTP_REQUESTS_TOTAL, "method" => method, "status" => status).increment(1);

    response
}

/// Count an applied status change.
pub fn record_transition(kind: EntityKind, to: &'static str) {
    counter!(TRANSITIONS_TOTAL, "kind" => kind.as_str(), "to" => to).increment(1);
}

/// Count a refused status change.
pub fn record_rejection(kind: EntityKind, reason: Rejection) {
    counter!(TRANSITIONS_REJECTED_TOTAL, "kind" => kind.as_str(), "reason" => reason.as_str())
        .increment(1);
}

/// GET /metrics — Prometheus text exposition.
pub async fn render(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
