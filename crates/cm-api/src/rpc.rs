//! # tRPC HTTP Adapter
//!
//! Serves procedures under `/api/trpc/<path>` using the tRPC HTTP wire format,
//! so the existing web client can call them unchanged:
//!
//! - Queries are `GET` with the input as URL-encoded JSON in `?input=`.
//! - Mutations are `POST` with the input as the JSON body.
//! - Success bodies are `{"result":{"data":<output>}}`.
//! - Errors are [`ErrorEnvelope`]s.
//!
//! ## Batching
//!
//! With `?batch=1` the path is a comma-separated list of procedures and the
//! input is an object keyed by call index (`{"0":..,"1":..}`). The response is
//! an array of envelopes in call order. The HTTP status is the common status
//! of all calls, or `207 Multi-Status` when they differ.

use std::fmt;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorEnvelope, RpcError};
use crate::routes;
use crate::state::AppState;

/// Mount point of the procedure router.
pub const RPC_PREFIX: &str = "/api/trpc";

/// Whether a procedure reads (query) or writes (mutation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

impl ProcedureKind {
    /// Lowercase name used in tRPC messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }

    /// HTTP method that selects this kind.
    pub fn http_method(self) -> &'static str {
        match self {
            Self::Query => "GET",
            Self::Mutation => "POST",
        }
    }
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A procedure body. Inputs arrive as raw JSON; `None` means no input was sent.
pub type Handler = fn(&AppState, Option<Value>) -> Result<Value, RpcError>;

/// A named, typed entry in the procedure registry.
#[derive(Debug, Clone, Copy)]
pub struct Procedure {
    /// Dotted path, e.g. `integrations.validateTaxId`.
    pub path: &'static str,
    pub kind: ProcedureKind,
    pub handler: Handler,
}

/// Successful call envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub result: ResultData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultData {
    pub data: Value,
}

impl ResultEnvelope {
    fn new(data: Value) -> Self {
        Self {
            result: ResultData { data },
        }
    }
}

/// One element of a batch response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum BatchItem {
    Result(ResultEnvelope),
    Error(ErrorEnvelope),
}

/// Query-string parameters understood by the adapter.
#[derive(Debug, Default, Deserialize)]
pub struct RpcParams {
    /// URL-encoded JSON input (queries only).
    pub input: Option<String>,
    /// `1` or `true` to enable batching.
    pub batch: Option<String>,
}

impl RpcParams {
    fn is_batch(&self) -> bool {
        matches!(self.batch.as_deref(), Some("1") | Some("true"))
    }
}

/// Build the procedure router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        &format!("{RPC_PREFIX}/:path"),
        get(handle_query).post(handle_mutation),
    )
}

/// GET /api/trpc/:path: run query procedures.
async fn handle_query(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<RpcParams>,
) -> Response {
    let input = match params.input.as_deref().map(|s| parse_json(s.as_bytes())).transpose() {
        Ok(input) => input,
        Err(err) => return err.into_response_at(&path),
    };
    respond(&state, ProcedureKind::Query, &path, params.is_batch(), input)
}

/// POST /api/trpc/:path: run mutation procedures.
async fn handle_mutation(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<RpcParams>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return RpcError::PayloadTooLarge(state.config.body_limit_bytes).into_response_at(&path)
        }
        Err(rejection) => return RpcError::BadRequest(rejection.body_text()).into_response_at(&path),
    };

    let input = if bytes.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match parse_json(&bytes) {
            Ok(value) => Some(value),
            Err(err) => return err.into_response_at(&path),
        }
    };
    respond(&state, ProcedureKind::Mutation, &path, params.is_batch(), input)
}

fn parse_json(raw: &[u8]) -> Result<Value, RpcError> {
    serde_json::from_slice(raw).map_err(|err| RpcError::Parse(format!("malformed JSON input: {err}")))
}

fn respond(
    state: &AppState,
    kind: ProcedureKind,
    path: &str,
    batch: bool,
    input: Option<Value>,
) -> Response {
    if !batch {
        return match call(state, kind, path, input) {
            Ok(data) => (StatusCode::OK, Json(ResultEnvelope::new(data))).into_response(),
            Err(err) => err.into_response_at(path),
        };
    }

    let mut inputs = match input {
        None => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return RpcError::BadRequest(
                "batch input must be an object keyed by call index".to_string(),
            )
            .into_response_at(path)
        }
    };

    let mut statuses = Vec::new();
    let mut items = Vec::new();
    for (index, procedure_path) in path.split(',').enumerate() {
        let input = inputs.remove(&index.to_string());
        let (status, item) = match call(state, kind, procedure_path, input) {
            Ok(data) => (StatusCode::OK, BatchItem::Result(ResultEnvelope::new(data))),
            Err(err) => {
                let (status, envelope) = err.envelope(Some(procedure_path));
                (status, BatchItem::Error(envelope))
            }
        };
        statuses.push(status);
        items.push(item);
    }

    let status = match statuses.split_first() {
        Some((first, rest)) if rest.iter().all(|s| s == first) => *first,
        _ => StatusCode::MULTI_STATUS,
    };
    (status, Json(items)).into_response()
}

/// Resolve and run one procedure.
fn call(
    state: &AppState,
    kind: ProcedureKind,
    path: &str,
    input: Option<Value>,
) -> Result<Value, RpcError> {
    match routes::find(path) {
        None => Err(RpcError::NotFound {
            path: path.to_string(),
            kind,
        }),
        Some(procedure) if procedure.kind != kind => Err(RpcError::MethodNotSupported {
            path: path.to_string(),
            method: kind.http_method(),
            kind: procedure.kind,
        }),
        Some(procedure) => {
            tracing::debug!(procedure = path, kind = %kind, "rpc call");
            (procedure.handler)(state, input)
        }
    }
}
