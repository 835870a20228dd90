//! Application state for the gateway API

use std::sync::Arc;

use apilama_core::CapabilityKind;
use apilama_gateway::Dispatcher;

use crate::error::ApiError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    /// Name reported by `GET /health`
    service_name: Arc<str>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, service_name: impl Into<String>) -> Self {
        Self {
            dispatcher,
            service_name: Arc::from(service_name.into()),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Name of the capability that serves the fixed routes for `kind`
    pub fn capability_for(&self, kind: CapabilityKind) -> Result<String, ApiError> {
        self.dispatcher
            .capability_for(kind)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("No capability configured for kind '{}'", kind))
            })
    }
}
