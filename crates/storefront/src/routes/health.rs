//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};

use crate::db::Database;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Opens (and drops) a transaction to verify storage is reachable.
/// Returns 503 Service Unavailable otherwise.
pub async fn readiness<D: Database>(State(state): State<AppState<D>>) -> StatusCode {
    match state.db().begin().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
