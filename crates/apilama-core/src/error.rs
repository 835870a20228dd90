//! Error types shared by adapters and the dispatcher

use std::fmt;

use thiserror::Error;

/// Failure reported by an adapter after attempting an operation.
///
/// Adapters translate their own failures (I/O errors, HTTP statuses,
/// transport errors) into one of these variants so nothing
/// transport-specific crosses the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// Target resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or ill-typed arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation itself failed while running in-process
    #[error("Execution failed: {0}")]
    Execution(String),

    /// The backend could not be reached (timeout, connection refused, DNS)
    #[error("Backend unreachable: {0}")]
    Unavailable(String),

    /// The backend was reached but reported a failure of its own
    #[error("Upstream error: {message}")]
    Upstream {
        /// HTTP status returned by the backend, if any
        status: Option<u16>,
        /// Message extracted from the backend response
        message: String,
    },
}

impl AdapterError {
    /// Create an upstream error from an HTTP status and message
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Classify this failure
    pub fn kind(&self) -> FailureKind {
        match self {
            AdapterError::NotFound(_) => FailureKind::NotFound,
            AdapterError::InvalidInput(_) => FailureKind::InvalidInput,
            AdapterError::Execution(_) => FailureKind::ExecutionError,
            AdapterError::Unavailable(_) => FailureKind::Unavailable,
            AdapterError::Upstream { .. } => FailureKind::UpstreamError,
        }
    }

    /// Human-readable detail without the classification prefix
    pub fn detail(&self) -> &str {
        match self {
            AdapterError::NotFound(m)
            | AdapterError::InvalidInput(m)
            | AdapterError::Execution(m)
            | AdapterError::Unavailable(m) => m,
            AdapterError::Upstream { message, .. } => message,
        }
    }
}

/// Classification of an adapter failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotFound,
    InvalidInput,
    ExecutionError,
    Unavailable,
    UpstreamError,
}

impl FailureKind {
    /// Taxonomy kind the dispatcher reports for this failure
    pub fn error_kind(self) -> ErrorKind {
        match self {
            FailureKind::NotFound => ErrorKind::NotFound,
            FailureKind::InvalidInput => ErrorKind::ClientError,
            FailureKind::ExecutionError => ErrorKind::InternalError,
            // Reachable when probed, failed when called: a proxy upstream error.
            FailureKind::Unavailable => ErrorKind::UpstreamError,
            FailureKind::UpstreamError => ErrorKind::UpstreamError,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::ExecutionError => "execution_error",
            FailureKind::Unavailable => "unavailable",
            FailureKind::UpstreamError => "upstream_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway error taxonomy, each kind owning one HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request: unknown capability/operation, missing argument
    ClientError,
    /// Requested resource absent
    NotFound,
    /// Backend known to be down (short-circuited before execution)
    BackendUnavailable,
    /// Backend reachable but the operation failed there
    UpstreamError,
    /// In-process execution failed unexpectedly
    InternalError,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::ClientError => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::BackendUnavailable => 503,
            ErrorKind::UpstreamError => 502,
            ErrorKind::InternalError => 500,
        }
    }

    /// Whether this kind indicates a fault on the backend side
    pub fn is_backend_fault(self) -> bool {
        matches!(
            self,
            ErrorKind::BackendUnavailable | ErrorKind::UpstreamError | ErrorKind::InternalError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ClientError => "client_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building a backend descriptor
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Capability '{0}' uses remote_http mode but has no endpoint")]
    MissingEndpoint(String),

    #[error("Invalid endpoint for capability '{name}': {reason}")]
    InvalidEndpoint { name: String, reason: String },

    #[error("Unknown capability kind: {0}")]
    UnknownKind(String),
}
