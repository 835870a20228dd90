//! LocalService trait - contract between the in-process adapter and a service

use apilama_core::{Arguments, CapabilityKind, Operation, Payload};
use async_trait::async_trait;

use crate::error::LocalResult;

/// A capability implemented inside the gateway process
#[async_trait]
pub trait LocalService: Send + Sync {
    /// Kind of capability this service implements
    fn kind(&self) -> CapabilityKind;

    /// Lightweight readiness check used by availability probes
    async fn self_test(&self) -> bool;

    /// Run `operation`. Only operations of [`Self::kind`] are routed here.
    async fn call(&self, operation: Operation, arguments: &Arguments) -> LocalResult<Payload>;
}
