// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Data directory write-read check.
    pub storage: String,
    /// Whether the sweep scheduler is active ("enabled" or "disabled").
    pub sweeping: String,
    /// Chain node reachability. Only probed by the readiness check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn base_checks(state: &AppState) -> HealthChecks {
    HealthChecks {
        service: "ok".to_string(),
        storage: match state.store.health_check() {
            Ok(()) => "ok".to_string(),
            Err(_) => "failed".to_string(),
        },
        sweeping: if state.scheduler.is_some() {
            "enabled".to_string()
        } else {
            "disabled".to_string()
        },
        chain: None,
    }
}

fn respond(checks: HealthChecks) -> (StatusCode, Json<ReadyResponse>) {
    let storage_ok = checks.storage == "ok";
    let chain_ok = checks.chain.as_deref().map(|s| s == "ok").unwrap_or(true);
    let all_ok = storage_ok && chain_ok;

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks,
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 otherwise. Does not touch the
/// network; use readiness for the chain probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    respond(base_checks(&state))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Returns 200 only when storage and the chain node are both available.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let mut checks = base_checks(&state);
    checks.chain = Some(match state.chain.block_number().await {
        Ok(_) => "ok".to_string(),
        Err(_) => "unreachable".to_string(),
    });
    respond(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;

    #[tokio::test]
    async fn health_reports_ok_with_working_storage() {
        let (state, _dir) = test_state();

        let (status, Json(body)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.checks.storage, "ok");
        assert_eq!(body.checks.sweeping, "disabled");
        assert!(body.checks.chain.is_none());
    }

    #[tokio::test]
    async fn liveness_always_ok() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
    }
}
