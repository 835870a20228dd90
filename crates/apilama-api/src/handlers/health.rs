//! Health handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use apilama_gateway::CapabilityHealth;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GatewayHealth {
    pub status: &'static str,
    pub service: String,
}

/// GET /health
/// Always ok; does not consult any backend
pub async fn gateway_health(State(state): State<AppState>) -> Json<GatewayHealth> {
    Json(GatewayHealth {
        status: "ok",
        service: state.service_name().to_string(),
    })
}

/// GET /api/{capability}/health
pub async fn capability_health(
    State(state): State<AppState>,
    Path(capability): Path<String>,
) -> Result<(StatusCode, Json<CapabilityHealth>), ApiError> {
    let health = state
        .dispatcher()
        .capability_health(&capability)
        .await
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown capability: '{}'", capability)))?;

    let status = if health.available {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(health)))
}
