//! CapabilityAdapter trait - the execution strategy for a capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;
use crate::operation::{Arguments, Operation};

/// Operation-specific result fields
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Result of executing one operation through an adapter
pub type OperationOutcome = Result<Payload, AdapterError>;

/// Availability verdict for a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityState {
    /// No trustworthy probe result
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl AvailabilityState {
    /// Only an explicit `Available` counts; `Unknown` fails closed.
    pub fn is_available(self) -> bool {
        self == AvailabilityState::Available
    }

    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            AvailabilityState::Available
        } else {
            AvailabilityState::Unavailable
        }
    }
}

/// Executes operations against one capability.
///
/// Implemented once per execution mode (in-process, remote HTTP). The
/// dispatcher only sees this trait, so a capability can switch mode through
/// configuration without any route changing.
#[async_trait]
pub trait CapabilityAdapter: Send + Sync {
    /// Name of the capability this adapter serves
    fn capability(&self) -> &str;

    /// Liveness check. Never fails: any error becomes `Unavailable`.
    async fn probe(&self) -> AvailabilityState;

    /// Execute `operation` with `arguments`. Implementations do not retry.
    async fn execute(&self, operation: Operation, arguments: &Arguments) -> OperationOutcome;
}
