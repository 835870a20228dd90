//! File routes

use apilama_core::{CapabilityKind, Operation};
use axum::extract::State;

use super::{body_arguments, query_arguments, run, JsonArgs, QueryArgs};
use crate::error::{ApiError, EnvelopeResponse};
use crate::state::AppState;

/// GET /api/files?directory=
pub async fn list_files(
    State(state): State<AppState>,
    query: QueryArgs,
) -> Result<EnvelopeResponse, ApiError> {
    let args = query_arguments(query)?;
    run(&state, CapabilityKind::Files, Operation::ListFiles, args).await
}

/// GET /api/file?filename=
pub async fn read_file(
    State(state): State<AppState>,
    query: QueryArgs,
) -> Result<EnvelopeResponse, ApiError> {
    let args = query_arguments(query)?;
    run(&state, CapabilityKind::Files, Operation::ReadFile, args).await
}

/// POST /api/file
/// Create or overwrite a file: `{"path", "content"}`
pub async fn create_file(
    State(state): State<AppState>,
    body: JsonArgs,
) -> Result<EnvelopeResponse, ApiError> {
    let args = body_arguments(body)?;
    run(&state, CapabilityKind::Files, Operation::CreateFile, args).await
}

/// DELETE /api/file?filename=
pub async fn delete_file(
    State(state): State<AppState>,
    query: QueryArgs,
) -> Result<EnvelopeResponse, ApiError> {
    let args = query_arguments(query)?;
    run(&state, CapabilityKind::Files, Operation::DeleteFile, args).await
}
