//! InProcessAdapter - serves a capability by calling a LocalService directly

use std::sync::Arc;

use apilama_core::{
    AdapterError, Arguments, AvailabilityState, CapabilityAdapter, Operation, OperationOutcome,
};
use async_trait::async_trait;

use crate::service::LocalService;

/// Adapter for capabilities running inside the gateway process.
///
/// Failures from the service are reclassified into [`AdapterError`]:
/// missing resources become `NotFound`, bad arguments `InvalidInput`,
/// everything else `Execution`.
pub struct InProcessAdapter {
    capability: String,
    service: Arc<dyn LocalService>,
}

impl InProcessAdapter {
    pub fn new(capability: impl Into<String>, service: Arc<dyn LocalService>) -> Self {
        Self {
            capability: capability.into(),
            service,
        }
    }
}

#[async_trait]
impl CapabilityAdapter for InProcessAdapter {
    fn capability(&self) -> &str {
        &self.capability
    }

    async fn probe(&self) -> AvailabilityState {
        AvailabilityState::from_reachable(self.service.self_test().await)
    }

    async fn execute(&self, operation: Operation, arguments: &Arguments) -> OperationOutcome {
        if operation.kind() != self.service.kind() {
            return Err(AdapterError::InvalidInput(format!(
                "Capability '{}' does not support operation '{}'",
                self.capability, operation
            )));
        }

        self.service
            .call(operation, arguments)
            .await
            .map_err(|e| {
                tracing::debug!(
                    capability = %self.capability,
                    operation = %operation,
                    error = %e,
                    "In-process call failed"
                );
                AdapterError::from(e)
            })
    }
}
