//! apilama-proxy - Remote capability adapter
//!
//! Implements `CapabilityAdapter` by forwarding every operation over HTTP
//! to a backend that serves the gateway route table (another apilama
//! instance, or a standalone capability service). This lets a capability
//! move out of the gateway process without any route changing.

mod error;
mod proxy;

pub use error::ProxyError;
pub use proxy::{RemoteProxyAdapter, DEFAULT_PROBE_TIMEOUT};
