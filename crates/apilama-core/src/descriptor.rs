//! Backend descriptors - the configured identity of a capability

use std::time::Duration;

use url::Url;

use crate::error::DescriptorError;
use crate::operation::CapabilityKind;

/// Default per-call timeout for remote operations
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Shell command timeout applied when the caller does not supply one
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// How a capability is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    /// Direct library call inside the gateway process
    InProcess,
    /// HTTP service at `endpoint`
    RemoteHttp { endpoint: Url },
}

/// Configured identity of one capability. Immutable after startup.
#[derive(Debug, Clone)]
pub struct BackendDescriptor {
    name: String,
    kind: CapabilityKind,
    mode: BackendMode,
    operation_timeout: Duration,
}

impl BackendDescriptor {
    /// Describe a capability served in-process
    pub fn in_process(name: impl Into<String>, kind: CapabilityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mode: BackendMode::InProcess,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Describe a capability served by a remote HTTP backend
    pub fn remote(
        name: impl Into<String>,
        kind: CapabilityKind,
        endpoint: &str,
    ) -> Result<Self, DescriptorError> {
        let name = name.into();
        if endpoint.trim().is_empty() {
            return Err(DescriptorError::MissingEndpoint(name));
        }

        let endpoint = Url::parse(endpoint).map_err(|e| DescriptorError::InvalidEndpoint {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(DescriptorError::InvalidEndpoint {
                name,
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        Ok(Self {
            name,
            kind,
            mode: BackendMode::RemoteHttp { endpoint },
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        })
    }

    /// Override the per-call timeout used for remote operations
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn mode(&self) -> &BackendMode {
        &self.mode
    }

    /// Short name of the mode, as used in configuration
    pub fn mode_name(&self) -> &'static str {
        match self.mode {
            BackendMode::InProcess => "in_process",
            BackendMode::RemoteHttp { .. } => "remote_http",
        }
    }

    /// Base URL of the backend; `None` for in-process capabilities
    pub fn endpoint(&self) -> Option<&Url> {
        match &self.mode {
            BackendMode::InProcess => None,
            BackendMode::RemoteHttp { endpoint } => Some(endpoint),
        }
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }
}
