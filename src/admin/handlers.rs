use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::config::ConfigSummary;
use crate::security::{CircuitBreakerStats, CircuitSnapshot, ValidationOutcome};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub ip: String,
    pub reset: bool,
}

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub text: String,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_stats(State(state): State<AdminState>) -> Json<CircuitBreakerStats> {
    Json(state.breaker.get_stats())
}

/// Values the running engine and validator actually use.
pub async fn get_config(State(state): State<AdminState>) -> Json<ConfigSummary> {
    Json(ConfigSummary::new(
        state.breaker.config(),
        &state.validator.limits(),
    ))
}

pub async fn get_ip(
    State(state): State<AdminState>,
    Path(ip): Path<String>,
) -> Result<Json<CircuitSnapshot>, StatusCode> {
    state.breaker.snapshot(&ip).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn reset_ip(
    State(state): State<AdminState>,
    Path(ip): Path<String>,
) -> Json<ResetResponse> {
    let reset = state.breaker.reset_ip(&ip);
    tracing::info!(ip = %ip, reset, "Admin reset requested");
    Json(ResetResponse { ip, reset })
}

/// Dry-run the chat validator, for operators tuning false positives.
pub async fn validate_text(
    State(state): State<AdminState>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidationOutcome> {
    Json(state.validator.validate(&request.text))
}
