use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::api::state::AppState;
use crate::services::HealthStatus;

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.health.get_health();
    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

/// GET /healthz -- is the process alive?
pub async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /readyz -- should traffic be routed here?
pub async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.health.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /metrics -- Prometheus text exposition
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.prometheus(state.health.uptime_seconds());
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}
