//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from navette-core and navette-state to HTTP status
//! codes with JSON bodies. Internal error details are never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use navette_core::{ReferenceError, ValidationError};
use navette_state::{IllegalTransition, Rejection, TrackedError, UnknownStatus};

use crate::issuer::SerialsExhausted;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "INVALID_REFERENCE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// A tracking code was rejected by the codec (422, `details.kind`).
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The lifecycle refused a status change (403 for role, 409 otherwise).
    #[error(transparent)]
    Transition(#[from] IllegalTransition),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Reference(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REFERENCE"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Transition(e) if e.reason == Rejection::RoleNotPermitted => {
                (StatusCode::FORBIDDEN, "TRANSITION_FORBIDDEN")
            }
            Self::Transition(_) => (StatusCode::CONFLICT, "ILLEGAL_TRANSITION"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Reference(e) => Some(json!({ "kind": e.kind() })),
            Self::Transition(e) => Some(json!({
                "kind": e.kind,
                "from": e.from,
                "to": e.to,
                "role": e.role,
                "reason": e.reason,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<UnknownStatus> for AppError {
    fn from(err: UnknownStatus) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<SerialsExhausted> for AppError {
    fn from(err: SerialsExhausted) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<TrackedError> for AppError {
    fn from(err: TrackedError) -> Self {
        match err {
            TrackedError::Illegal(e) => Self::Transition(e),
            TrackedError::Invalid(e) => Self::Validation(e.to_string()),
            TrackedError::KindMismatch { .. } => Self::Internal(err.to_string()),
            TrackedError::History(_) | TrackedError::Closed { .. } => Self::Conflict(err.to_string()),
        }
    }
}
