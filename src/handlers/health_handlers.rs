//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that runs the object store's own checks

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Liveness probe; never performs I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// HTTP 200 when every check of the configured store passes, 503 otherwise.
/// The local store probes SQLite (`SELECT 1`) and a disk write/read/delete.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let checks = state.store.health_checks().await;
    let overall_ok = checks.iter().all(|check| check.ok);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks: checks
            .into_iter()
            .map(|check| {
                (
                    check.name,
                    CheckStatus {
                        ok: check.ok,
                        error: check.error,
                    },
                )
            })
            .collect(),
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        tracing::warn!("readiness check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
