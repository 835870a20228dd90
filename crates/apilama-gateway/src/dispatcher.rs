//! Dispatcher - routes operation requests to capability adapters

use std::collections::HashMap;
use std::sync::Arc;

use apilama_core::envelope::normalize;
use apilama_core::{
    AvailabilityState, BackendDescriptor, CapabilityAdapter, CapabilityKind, ErrorKind, Operation,
    OperationRequest, ResponseEnvelope,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::availability::AvailabilityMonitor;

struct Backend {
    descriptor: BackendDescriptor,
    adapter: Arc<dyn CapabilityAdapter>,
}

/// Availability report for one capability
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityHealth {
    /// `"ok"` when available, `"error"` otherwise
    pub status: &'static str,
    pub service: String,
    pub available: bool,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

/// Dispatches operations to the adapter registered for each capability.
///
/// The capability set is fixed once the dispatcher is shared; lookups are
/// plain map reads. The only mutable state is the availability cache held
/// by the monitor.
pub struct Dispatcher {
    backends: HashMap<String, Backend>,
    monitor: AvailabilityMonitor,
}

impl Dispatcher {
    pub fn new(monitor: AvailabilityMonitor) -> Self {
        Self {
            backends: HashMap::new(),
            monitor,
        }
    }

    /// Register the adapter serving `descriptor`, replacing any previous one
    pub fn register(&mut self, descriptor: BackendDescriptor, adapter: Arc<dyn CapabilityAdapter>) {
        info!(
            capability = %descriptor.name(),
            kind = %descriptor.kind(),
            mode = descriptor.mode_name(),
            "Registering capability"
        );
        self.backends.insert(
            descriptor.name().to_string(),
            Backend {
                descriptor,
                adapter,
            },
        );
    }

    /// Registered capability names, sorted
    pub fn capability_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn descriptor(&self, capability: &str) -> Option<&BackendDescriptor> {
        self.backends.get(capability).map(|b| &b.descriptor)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.backends.values().map(|b| &b.descriptor)
    }

    /// Capability serving `kind`. A capability named after the kind is
    /// preferred, otherwise the first by name.
    pub fn capability_for(&self, kind: CapabilityKind) -> Option<&str> {
        if let Some(backend) = self.backends.get(kind.as_str()) {
            if backend.descriptor.kind() == kind {
                return Some(backend.descriptor.name());
            }
        }

        self.backends
            .values()
            .filter(|b| b.descriptor.kind() == kind)
            .map(|b| b.descriptor.name())
            .min()
    }

    pub fn monitor(&self) -> &AvailabilityMonitor {
        &self.monitor
    }

    /// Run one request through validation, availability and the adapter.
    ///
    /// Always produces an envelope; every failure is mapped to its
    /// taxonomy kind here.
    pub async fn dispatch(&self, request: OperationRequest) -> ResponseEnvelope {
        let OperationRequest {
            capability,
            operation,
            arguments,
        } = request;

        let Some(backend) = self.backends.get(&capability) else {
            return reject(
                ErrorKind::ClientError,
                &capability,
                &operation,
                format!("Unknown capability: '{}'", capability),
            );
        };

        let op = match operation.parse::<Operation>() {
            Ok(op) if op.kind() == backend.descriptor.kind() => op,
            _ => {
                return reject(
                    ErrorKind::ClientError,
                    &capability,
                    &operation,
                    format!(
                        "Capability '{}' does not support operation '{}'",
                        capability, operation
                    ),
                )
            }
        };

        if let Some(missing) = op.missing_argument(&arguments) {
            return reject(
                ErrorKind::ClientError,
                &capability,
                &operation,
                format!("Missing required argument: {}", missing),
            );
        }

        let state = self.monitor.check(&capability, backend.adapter.as_ref()).await;
        if !state.is_available() {
            return reject(
                ErrorKind::BackendUnavailable,
                &capability,
                &operation,
                format!("Capability '{}' is not available", capability),
            );
        }

        debug!(capability = %capability, operation = %op, "Dispatching operation");
        let outcome = backend.adapter.execute(op, &arguments).await;
        if let Err(ref e) = outcome {
            log_failure(e.kind().error_kind(), &capability, &operation, e.detail());
        }
        normalize(outcome)
    }

    /// Availability of `capability`, probing if the cached record expired.
    /// `None` for an unregistered capability.
    pub async fn capability_health(&self, capability: &str) -> Option<CapabilityHealth> {
        let backend = self.backends.get(capability)?;
        let state = self.monitor.check(capability, backend.adapter.as_ref()).await;
        let available = state.is_available();

        Some(CapabilityHealth {
            status: if available { "ok" } else { "error" },
            service: capability.to_string(),
            available,
            mode: backend.descriptor.mode_name(),
            checked_at: self.monitor.snapshot(capability).map(|r| r.checked_at_utc),
        })
    }

    /// Probe every capability once, bypassing the cache
    pub async fn refresh_all(&self) -> Vec<(String, AvailabilityState)> {
        let mut states = Vec::with_capacity(self.backends.len());
        for name in self.capability_names() {
            if let Some(backend) = self.backends.get(&name) {
                self.monitor.invalidate(&name);
                let state = self.monitor.check(&name, backend.adapter.as_ref()).await;
                states.push((name, state));
            }
        }
        states
    }
}

fn reject(kind: ErrorKind, capability: &str, operation: &str, message: String) -> ResponseEnvelope {
    log_failure(kind, capability, operation, &message);
    ResponseEnvelope::error(kind, message)
}

fn log_failure(kind: ErrorKind, capability: &str, operation: &str, message: &str) {
    match kind {
        ErrorKind::InternalError => {
            error!(
                kind = %kind,
                capability = %capability,
                operation = %operation,
                error = %message,
                "Operation failed"
            )
        }
        k if k.is_backend_fault() => {
            warn!(
                kind = %kind,
                capability = %capability,
                operation = %operation,
                error = %message,
                "Operation failed"
            )
        }
        _ => {
            debug!(
                kind = %kind,
                capability = %capability,
                operation = %operation,
                error = %message,
                "Request rejected"
            )
        }
    }
}
