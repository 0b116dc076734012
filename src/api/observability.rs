use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::api::AppState;

const HEALTH_PATH: &str = "/api/system/health";

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus_handle {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics are disabled in config",
        )
            .into_response(),
    }
}

const fn outcome(status: u16) -> &'static str {
    match status {
        500.. => "error",
        400..=499 => "client_error",
        _ => "success",
    }
}

/// Request span, metrics and a completion log line for every request.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let span = info_span!(
        "request",
        %request_id,
        %method,
        %path,
        route = route.clone(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();
        let outcome = outcome(status);

        // Matched route keeps label cardinality bounded
        let labels = [
            ("method", method),
            ("path", route.unwrap_or_else(|| path.clone())),
            ("status", status.to_string()),
            ("outcome", outcome.to_string()),
        ];
        metrics::counter!("intelboard_http_requests_total", &labels).increment(1);
        metrics::histogram!("intelboard_http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if path == HEALTH_PATH && outcome == "success" {
            debug!(duration_ms, status_code = status, "Health probe");
        } else {
            info!(
                event = "http_request_finished",
                duration_ms,
                status_code = status,
                outcome,
                "Request finished"
            );
        }

        response
    }
    .instrument(span)
    .await
}
