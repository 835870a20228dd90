//! Directory routes

use apilama_core::{CapabilityKind, Operation};
use axum::extract::State;

use super::{body_arguments, query_arguments, run, JsonArgs, QueryArgs};
use crate::error::{ApiError, EnvelopeResponse};
use crate::state::AppState;

/// GET /api/directories?path=
pub async fn list_directory(
    State(state): State<AppState>,
    query: QueryArgs,
) -> Result<EnvelopeResponse, ApiError> {
    let args = query_arguments(query)?;
    run(&state, CapabilityKind::Dirs, Operation::ListDirectory, args).await
}

/// POST /api/directory
pub async fn create_directory(
    State(state): State<AppState>,
    body: JsonArgs,
) -> Result<EnvelopeResponse, ApiError> {
    let args = body_arguments(body)?;
    run(&state, CapabilityKind::Dirs, Operation::CreateDirectory, args).await
}
