//! # System Procedures
//!
//! Liveness reporting and an echo procedure for client connectivity checks.
//!
//! Routes:
//! - GET /health: plain JSON health status
//! - GET /api/trpc/health: same payload as a tRPC query
//! - GET /api/trpc/echo: returns the input message

use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::RpcError;
use crate::extractors::{parse_input, to_output};
use crate::state::AppState;

/// Health status payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Current server time, RFC 3339 UTC with milliseconds.
    pub timestamp: String,
}

impl HealthStatus {
    /// Status stamped with the current time.
    pub fn now() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Echo procedure input.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EchoInput {
    pub message: String,
}

/// Echo procedure output.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EchoOutput {
    pub echo: String,
}

/// Build the plain HTTP system router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_http))
}

/// GET /health: Plain JSON health status.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = HealthStatus)),
    tag = "system"
)]
pub async fn health_http() -> Json<HealthStatus> {
    Json(HealthStatus::now())
}

/// `health` query.
#[utoipa::path(
    get,
    path = "/api/trpc/health",
    responses((status = 200, description = "Server is up, inside a tRPC result envelope", body = HealthStatus)),
    tag = "system"
)]
pub fn health(_state: &AppState, _input: Option<Value>) -> Result<Value, RpcError> {
    to_output(&HealthStatus::now())
}

/// `echo` query.
#[utoipa::path(
    get,
    path = "/api/trpc/echo",
    params(("input" = String, Query, description = "URL-encoded JSON EchoInput")),
    responses(
        (status = 200, description = "Echoed message, inside a tRPC result envelope", body = EchoOutput),
        (status = 400, description = "Missing or malformed input", body = crate::error::ErrorEnvelope),
    ),
    tag = "system"
)]
pub fn echo(_state: &AppState, input: Option<Value>) -> Result<Value, RpcError> {
    let req: EchoInput = parse_input(input)?;
    to_output(&EchoOutput { echo: req.message })
}
