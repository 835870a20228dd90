//! Local service errors

use std::time::Duration;

use apilama_core::AdapterError;
use thiserror::Error;

/// Result type for local service calls
pub type LocalResult<T> = Result<T, LocalError>;

/// Errors raised by in-process services
#[derive(Debug, Error)]
pub enum LocalError {
    /// Requested file or directory does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Argument missing, of the wrong type, or outside the sandbox
    #[error("{0}")]
    InvalidArgument(String),

    /// Operation not offered by this service
    #[error("Operation not supported by capability '{capability}': {operation}")]
    Unsupported {
        capability: String,
        operation: String,
    },

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Command did not finish in time
    #[error("Command timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Command could not be started
    #[error("Failed to start command: {0}")]
    Spawn(String),
}

impl From<LocalError> for AdapterError {
    fn from(err: LocalError) -> Self {
        match err {
            LocalError::NotFound(_) => AdapterError::NotFound(err.to_string()),
            LocalError::InvalidArgument(msg) => AdapterError::InvalidInput(msg),
            LocalError::Unsupported { .. } => AdapterError::InvalidInput(err.to_string()),
            LocalError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
                AdapterError::NotFound(err.to_string())
            }
            LocalError::Io(_) | LocalError::Timeout(_) | LocalError::Spawn(_) => {
                AdapterError::Execution(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilama_core::FailureKind;

    #[test]
    fn test_reclassification() {
        let cases = [
            (LocalError::NotFound("File a.md".into()), FailureKind::NotFound),
            (
                LocalError::InvalidArgument("bad".into()),
                FailureKind::InvalidInput,
            ),
            (
                LocalError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)),
                FailureKind::NotFound,
            ),
            (
                LocalError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied)),
                FailureKind::ExecutionError,
            ),
            (
                LocalError::Timeout(Duration::from_millis(5)),
                FailureKind::ExecutionError,
            ),
        ];
        for (local, kind) in cases {
            assert_eq!(AdapterError::from(local).kind(), kind);
        }
    }

    #[test]
    fn test_not_found_message() {
        let err = AdapterError::from(LocalError::NotFound("File a.md".into()));
        assert_eq!(err.detail(), "File a.md not found");
    }
}
