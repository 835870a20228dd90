//! apilama-gateway - Capability dispatch
//!
//! This crate owns the request path between the HTTP surface and the
//! adapters:
//!
//! ```text
//! OperationRequest
//!       │
//!       ▼
//! ┌──────────────┐  unknown / missing arg   ┌───────────────────┐
//! │  Dispatcher  │ ───────────────────────▶ │ 400 error envelope│
//! └──────┬───────┘                          └───────────────────┘
//!        │ check(capability)
//!        ▼
//! ┌─────────────────────┐  unavailable      ┌───────────────────┐
//! │ AvailabilityMonitor │ ────────────────▶ │ 503 error envelope│
//! └──────┬──────────────┘                   └───────────────────┘
//!        │ available
//!        ▼
//! ┌─────────────────────────────────────┐
//! │ CapabilityAdapter (local | remote)  │ ──▶ normalize ──▶ envelope
//! └─────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::new(AvailabilityMonitor::new(ttl, probe_timeout));
//! dispatcher.register(descriptor, Arc::new(adapter));
//!
//! let envelope = dispatcher
//!     .dispatch(OperationRequest::new("files", "read_file", args))
//!     .await;
//! ```

mod availability;
mod dispatcher;

pub use availability::{
    AvailabilityMonitor, AvailabilityRecord, DEFAULT_AVAILABILITY_TTL, DEFAULT_PROBE_TIMEOUT,
};
pub use dispatcher::{CapabilityHealth, Dispatcher};

// Re-export core types for convenience
pub use apilama_core::{
    AvailabilityState, BackendDescriptor, CapabilityAdapter, OperationRequest, ResponseEnvelope,
};
