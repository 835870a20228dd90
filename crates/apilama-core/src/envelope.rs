//! Response envelope and normalizer
//!
//! Every gateway endpoint answers with one of two JSON shapes:
//!
//! ```text
//! { "status": "success", <operation-specific fields> }
//! { "status": "error", "message": <string> }
//! ```
//!
//! The functions here are the single place where adapter outcomes and raw
//! remote bodies become that shape. They hold no state and perform no I/O.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::Value;

use crate::adapter::{OperationOutcome, Payload};
use crate::error::{AdapterError, ErrorKind};

const STATUS_FIELD: &str = "status";

/// Uniform response shape. Exactly one of payload or error is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Success(Payload),
    Error { code: u16, message: String },
}

impl ResponseEnvelope {
    pub fn success(payload: Payload) -> Self {
        ResponseEnvelope::Success(payload)
    }

    /// Build an error envelope whose code is determined by the taxonomy kind
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ResponseEnvelope::Error {
            code: kind.status_code(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success(_))
    }

    /// HTTP status code for this envelope
    pub fn status_code(&self) -> u16 {
        match self {
            ResponseEnvelope::Success(_) => 200,
            ResponseEnvelope::Error { code, .. } => *code,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ResponseEnvelope::Success(payload) => Some(payload),
            ResponseEnvelope::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Success(_) => None,
            ResponseEnvelope::Error { message, .. } => Some(message),
        }
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseEnvelope::Success(payload) => {
                let fields = payload.iter().filter(|(k, _)| k.as_str() != STATUS_FIELD);
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry(STATUS_FIELD, "success")?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            ResponseEnvelope::Error { message, .. } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(STATUS_FIELD, "error")?;
                map.serialize_entry("message", message)?;
                map.end()
            }
        }
    }
}

/// Convert an adapter outcome into the wire envelope
pub fn normalize(outcome: OperationOutcome) -> ResponseEnvelope {
    match outcome {
        Ok(payload) => ResponseEnvelope::success(payload),
        Err(err) => from_adapter_error(&err),
    }
}

/// Convert an adapter failure into an error envelope
pub fn from_adapter_error(err: &AdapterError) -> ResponseEnvelope {
    ResponseEnvelope::error(err.kind().error_kind(), err.detail())
}

#[derive(Deserialize)]
struct RemoteStatus {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Validate a 2xx remote body and extract its payload.
///
/// The body must be one of the two envelope shapes. A success envelope
/// yields its fields without `status`; an error envelope or any other
/// body is reported as an upstream failure.
pub fn payload_from_remote(body: Value) -> Result<Payload, AdapterError> {
    let Value::Object(mut fields) = body else {
        return Err(AdapterError::upstream(
            None,
            "Malformed backend response: expected a JSON object",
        ));
    };

    let status: RemoteStatus = serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| AdapterError::upstream(None, format!("Malformed backend response: {}", e)))?;

    match status.status.as_str() {
        "success" => {
            fields.remove(STATUS_FIELD);
            Ok(fields)
        }
        "error" => Err(AdapterError::upstream(
            None,
            status
                .message
                .unwrap_or_else(|| "Backend reported an error".to_string()),
        )),
        other => Err(AdapterError::upstream(
            None,
            format!("Malformed backend response: unknown status '{}'", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[test]
    fn test_success_serializes_flat() {
        let env = ResponseEnvelope::success(payload(json!({"path": "a.md", "size": 2})));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value, json!({"status": "success", "path": "a.md", "size": 2}));
        assert_eq!(env.status_code(), 200);
    }

    #[test]
    fn test_payload_cannot_override_status() {
        let env = ResponseEnvelope::success(payload(json!({"status": "error", "x": 1})));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["x"], 1);
    }

    #[test]
    fn test_error_serializes_message_only() {
        let env = ResponseEnvelope::error(ErrorKind::BackendUnavailable, "files is not available");
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({"status": "error", "message": "files is not available"})
        );
        assert_eq!(env.status_code(), 503);
        assert!(env.payload().is_none());
    }

    #[test]
    fn test_normalize_maps_failure_kinds() {
        let cases = [
            (AdapterError::NotFound("x".into()), 404),
            (AdapterError::InvalidInput("x".into()), 400),
            (AdapterError::Execution("x".into()), 500),
            (AdapterError::Unavailable("x".into()), 502),
            (AdapterError::upstream(Some(500), "x"), 502),
        ];
        for (err, code) in cases {
            let env = normalize(Err(err));
            assert_eq!(env.status_code(), code);
            assert_eq!(env.message(), Some("x"));
        }
    }

    #[test]
    fn test_remote_success_strips_status() {
        let body = json!({"status": "success", "content": "hi"});
        let payload = payload_from_remote(body).unwrap();
        assert_eq!(payload.get("content"), Some(&json!("hi")));
        assert!(!payload.contains_key("status"));
    }

    #[test]
    fn test_remote_error_and_malformed_bodies_are_upstream() {
        let err = payload_from_remote(json!({"status": "error", "message": "boom"})).unwrap_err();
        assert_eq!(err, AdapterError::upstream(None, "boom"));

        for body in [json!([1, 2]), json!({"content": "no status"}), json!({"status": "ok"})] {
            let err = payload_from_remote(body).unwrap_err();
            assert_eq!(err.kind(), crate::error::FailureKind::UpstreamError);
        }
    }
}
