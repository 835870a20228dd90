//! API error types and envelope responses

use apilama_core::{ErrorKind, ResponseEnvelope};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Errors raised by the HTTP layer before a request reaches the dispatcher
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 404 Not Found
    NotFound(String),
    /// 405 Method Not Allowed
    MethodNotAllowed(String),
}

impl ApiError {
    fn envelope(self) -> ResponseEnvelope {
        match self {
            ApiError::BadRequest(msg) => ResponseEnvelope::error(ErrorKind::ClientError, msg),
            ApiError::NotFound(msg) => ResponseEnvelope::error(ErrorKind::NotFound, msg),
            ApiError::MethodNotAllowed(msg) => ResponseEnvelope::Error {
                code: StatusCode::METHOD_NOT_ALLOWED.as_u16(),
                message: msg,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        tracing::debug!(
            code = envelope.status_code(),
            message = envelope.message(),
            "API client error"
        );
        EnvelopeResponse(envelope).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// A [`ResponseEnvelope`] sent with the status code it carries
#[derive(Debug)]
pub struct EnvelopeResponse(pub ResponseEnvelope);

impl IntoResponse for EnvelopeResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}
