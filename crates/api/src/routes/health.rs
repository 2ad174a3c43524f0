//! Health and probe endpoints.
//!
//! `ready` only reports ready once the database answers and the registration
//! schema exists, so a pod started against an unmigrated database stays out
//! of rotation.

use axum::{extract::State, http::StatusCode, Json};
use persistence::metrics::record_pool_metrics;
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

use crate::app::AppState;

/// Tables the admission and check-in paths need.
const REQUIRED_TABLES: [&str; 3] = ["events", "registrations", "check_ins"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub schema_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    pub pool_size: u32,
    pub idle_connections: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Round-trip check that also confirms the schema is migrated.
///
/// Returns `None` when the database is unreachable.
async fn probe_schema(pool: &PgPool) -> Option<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT bool_and(to_regclass(t) IS NOT NULL) FROM unnest($1::text[]) AS t",
    )
    .bind(&REQUIRED_TABLES[..])
    .fetch_one(pool)
    .await
    .ok()
}

fn overall_status(connected: bool, schema_ready: bool) -> &'static str {
    match (connected, schema_ready) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        _ => "unhealthy",
    }
}

/// Full health check.
///
/// GET /api/health
///
/// Always returns a body; the status code is 503 unless fully healthy.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = Instant::now();
    let probe = probe_schema(&state.pool).await;
    let latency_ms = probe.map(|_| start.elapsed().as_millis() as u64);

    record_pool_metrics(&state.pool);

    let connected = probe.is_some();
    let schema_ready = probe.unwrap_or(false);
    let status = overall_status(connected, schema_ready);
    if status != "healthy" {
        tracing::warn!(connected, schema_ready, "Health check failed");
    }

    let code = if status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database: DatabaseHealth {
                connected,
                schema_ready,
                latency_ms,
                pool_size: state.pool.size(),
                idle_connections: state.pool.num_idle(),
            },
        }),
    )
}

/// GET /api/health/live
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse { status: "alive" })
}

/// GET /api/health/ready
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    match probe_schema(&state.pool).await {
        Some(true) => Ok(Json(StatusResponse { status: "ready" })),
        _ => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
