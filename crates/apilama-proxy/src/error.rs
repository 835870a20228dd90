//! Errors raised while constructing a remote adapter

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Descriptor is not a remote_http descriptor
    #[error("Capability '{0}' has no remote endpoint")]
    NotRemote(String),
}
