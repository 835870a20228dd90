//! apilama-core - Core traits and types for the apilama gateway
//!
//! This crate provides the abstractions shared by every execution mode of a
//! capability: the operation catalog, backend descriptors, the
//! [`CapabilityAdapter`] trait implemented by in-process and remote adapters,
//! and the uniform [`ResponseEnvelope`] every gateway endpoint returns.

pub mod adapter;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod operation;

pub use adapter::{AvailabilityState, CapabilityAdapter, OperationOutcome, Payload};
pub use descriptor::{
    BackendDescriptor, BackendMode, DEFAULT_COMMAND_TIMEOUT, DEFAULT_OPERATION_TIMEOUT,
};
pub use envelope::ResponseEnvelope;
pub use error::{AdapterError, DescriptorError, ErrorKind, FailureKind};
pub use operation::{
    ArgumentSource, Arguments, CapabilityKind, HttpMethod, Operation, OperationRequest,
    OperationRoute,
};
