//! # cm-api: RPC Server for Community Manager
//!
//! Axum/Tower/Tokio server exposing the `cm-core` RUT validator to the web
//! dashboard through a tRPC-compatible procedure router.
//!
//! ## API Surface
//!
//! | Path                                   | Module               |
//! |----------------------------------------|----------------------|
//! | `/health`                              | [`routes::system`]   |
//! | `/health/liveness`, `/health/readiness`| this module          |
//! | `/api/trpc/<procedure>`                | [`rpc`], [`routes`]  |
//! | `/openapi.json`                        | [`openapi`]          |
//! | `/*` (when `STATIC_DIR` is set)        | built frontend       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → SecurityHeaders → CORS → RateLimit → BodyLimit → Handler
//! ```
//!
//! Liveness and readiness probes sit outside the rate limiter.

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod rpc;
pub mod state;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::RpcError;
pub use state::AppState;

use crate::middleware::rate_limit::rate_limit_middleware;
use crate::middleware::security_headers::security_headers_middleware;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    let mut api = Router::new()
        .merge(routes::system::router())
        .merge(rpc::router())
        .merge(openapi::router());

    if let Some(dir) = &config.static_dir {
        tracing::info!(dir = %dir.display(), "serving static frontend");
        api = api.fallback_service(static_files(dir));
    }

    let api = api
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware));

    Router::new()
        .merge(probes)
        .merge(api)
        .layer(cors_layer(&config))
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the configured frontend origin, otherwise any
/// origin without credentials.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    match &config.allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-trpc-source"),
            ]),
        None => CorsLayer::permissive(),
    }
}

/// Built single-page app: real files when they exist, `index.html` otherwise.
fn static_files(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The server has no external dependencies, so it is ready
/// as soon as it accepts connections.
async fn readiness() -> &'static str {
    "ready"
}
