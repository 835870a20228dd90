//! HTTP handlers
//!
//! Fixed routes resolve their capability by kind and hand the extracted
//! arguments to the dispatcher; nothing here inspects argument values.

pub mod dirs;
pub mod dispatch;
pub mod files;
pub mod health;
pub mod shell;

use std::collections::HashMap;

use apilama_core::{Arguments, CapabilityKind, Operation, OperationRequest};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{Method, Uri};
use axum::Json;
use serde_json::Value;

use crate::error::{ApiError, EnvelopeResponse};
use crate::state::AppState;

/// Query-string extractor that reports rejections as envelopes
pub type QueryArgs = Result<Query<HashMap<String, String>>, QueryRejection>;

/// JSON body extractor that reports rejections as envelopes
pub type JsonArgs = Result<Json<Value>, JsonRejection>;

pub(crate) fn query_arguments(query: QueryArgs) -> Result<Arguments, ApiError> {
    let Query(params) = query?;
    Ok(params
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect())
}

pub(crate) fn body_arguments(body: JsonArgs) -> Result<Arguments, ApiError> {
    let Json(value) = body?;
    object_arguments(value)
}

/// Like [`body_arguments`], but an empty body is an empty argument map
pub(crate) fn optional_body_arguments(body: &Bytes) -> Result<Arguments, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Arguments::new());
    }
    let value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;
    object_arguments(value)
}

fn object_arguments(value: Value) -> Result<Arguments, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Dispatch `operation` to the capability serving `kind`
pub(crate) async fn run(
    state: &AppState,
    kind: CapabilityKind,
    operation: Operation,
    arguments: Arguments,
) -> Result<EnvelopeResponse, ApiError> {
    let capability = state.capability_for(kind)?;
    let request = OperationRequest::new(capability, operation.as_str(), arguments);
    Ok(EnvelopeResponse(state.dispatcher().dispatch(request).await))
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

/// Fallback for known routes called with an unsupported method
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!(
        "Method {} not allowed for {}",
        method,
        uri.path()
    ))
}
