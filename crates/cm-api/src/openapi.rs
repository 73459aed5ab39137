//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI spec served
//! at `/openapi.json`. tRPC procedures are documented at their concrete
//! `/api/trpc/<path>` URLs; response bodies are shown unwrapped.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Community Manager API",
        version = "0.1.0",
        description = "RPC server for the Community Manager dashboard: health, echo, and RUT tax-ID validation.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::system::health_http,
        crate::routes::system::health,
        crate::routes::system::echo,
        crate::routes::integrations::validate_tax_id,
    ),
    components(schemas(
        crate::routes::system::HealthStatus,
        crate::routes::system::EchoInput,
        crate::routes::system::EchoOutput,
        crate::routes::integrations::ValidateTaxIdInput,
        cm_core::ValidationResult,
        crate::error::ErrorEnvelope,
        crate::error::ErrorShape,
        crate::error::ErrorData,
    )),
    tags(
        (name = "system", description = "Health and connectivity"),
        (name = "integrations", description = "External identifier validation"),
    )
)]
pub struct ApiDoc;

/// Router serving `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
