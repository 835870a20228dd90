//! Shell routes

use apilama_core::{CapabilityKind, Operation};
use axum::extract::State;

use super::{body_arguments, run, JsonArgs};
use crate::error::{ApiError, EnvelopeResponse};
use crate::state::AppState;

/// POST /api/shell/execute
/// Run a command: `{"command", "cwd"?, "timeout_ms"?}`
pub async fn execute_command(
    State(state): State<AppState>,
    body: JsonArgs,
) -> Result<EnvelopeResponse, ApiError> {
    let args = body_arguments(body)?;
    run(&state, CapabilityKind::Shell, Operation::ExecuteCommand, args).await
}
