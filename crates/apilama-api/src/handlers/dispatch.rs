//! Generic operation dispatch

use apilama_core::OperationRequest;
use axum::body::Bytes;
use axum::extract::{Path, State};

use super::optional_body_arguments;
use crate::error::{ApiError, EnvelopeResponse};
use crate::state::AppState;

/// POST /api/{capability}/{operation}
/// Dispatch any operation by name; unknown names are rejected by the dispatcher.
/// An empty body means no arguments.
pub async fn dispatch_operation(
    State(state): State<AppState>,
    Path((capability, operation)): Path<(String, String)>,
    body: Bytes,
) -> Result<EnvelopeResponse, ApiError> {
    let args = optional_body_arguments(&body)?;
    let request = OperationRequest::new(capability, operation, args);
    Ok(EnvelopeResponse(state.dispatcher().dispatch(request).await))
}
