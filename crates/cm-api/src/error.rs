//! # RPC Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every error renders as a tRPC error envelope:
//!
//! ```json
//! {"error":{"message":"...","code":-32600,"data":{"code":"BAD_REQUEST","httpStatus":400,"path":"integrations.validateTaxId"}}}
//! ```
//!
//! Internal error details are logged, never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::rpc::ProcedureKind;

/// tRPC error envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    pub error: ErrorShape,
}

/// Body of a tRPC error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorShape {
    /// Human-readable error message.
    pub message: String,
    /// JSON-RPC 2.0 error code (e.g. `-32600`).
    pub code: i32,
    pub data: ErrorData,
}

/// Machine-readable details of a tRPC error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    /// tRPC error code (e.g. `"BAD_REQUEST"`).
    pub code: String,
    /// HTTP status the error maps to.
    pub http_status: u16,
    /// Procedure path, when the error belongs to a call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Application-level error for RPC calls and middleware.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Input was not valid JSON (400).
    #[error("{0}")]
    Parse(String),

    /// Input was valid JSON but not what the procedure accepts (400).
    #[error("{0}")]
    BadRequest(String),

    /// No procedure of that kind exists at the path (404).
    #[error("No \"{kind}\"-procedure on path \"{path}\"")]
    NotFound {
        /// Requested path.
        path: String,
        /// Kind implied by the HTTP method.
        kind: ProcedureKind,
    },

    /// The procedure exists but the HTTP method selects the other kind (405).
    #[error("Unsupported {method} request to {kind} procedure at path \"{path}\"")]
    MethodNotSupported {
        /// Requested path.
        path: String,
        /// HTTP method used.
        method: &'static str,
        /// Actual kind of the procedure.
        kind: ProcedureKind,
    },

    /// Request body exceeds the configured limit (413).
    #[error("request body exceeds the {0}-byte limit")]
    PayloadTooLarge(usize),

    /// Client exceeded its rate limit (429).
    #[error("Too many requests, please try again later.")]
    TooManyRequests,

    /// Internal server error (500). Message is logged but not returned to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    /// HTTP status, tRPC code name and JSON-RPC code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str, i32) {
        match self {
            Self::Parse(_) => (StatusCode::BAD_REQUEST, "PARSE_ERROR", -32700),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", -32600),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", -32004),
            Self::MethodNotSupported { .. } => {
                (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_SUPPORTED", -32005)
            }
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", -32013),
            Self::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS", -32029),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                -32603,
            ),
        }
    }

    /// Render as a tRPC error envelope, attributed to `path` when given.
    pub fn envelope(&self, path: Option<&str>) -> (StatusCode, ErrorEnvelope) {
        let (status, trpc_code, json_rpc_code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match self {
            Self::Internal(_) => {
                tracing::error!(error = %self, path = ?path, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let envelope = ErrorEnvelope {
            error: ErrorShape {
                message,
                code: json_rpc_code,
                data: ErrorData {
                    code: trpc_code.to_string(),
                    http_status: status.as_u16(),
                    path: path.map(str::to_string),
                },
            },
        };
        (status, envelope)
    }

    /// Render as a response attributed to a procedure path.
    pub fn into_response_at(self, path: &str) -> Response {
        let (status, envelope) = self.envelope(Some(path));
        (status, Json(envelope)).into_response()
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, envelope) = self.envelope(None);
        (status, Json(envelope)).into_response()
    }
}

/// RUT format errors are the caller's fault.
impl From<cm_core::ValidationError> for RpcError {
    fn from(err: cm_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("failed to serialize output: {err}"))
    }
}
