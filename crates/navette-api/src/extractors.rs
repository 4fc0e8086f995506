//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs, a helper to extract
//! and validate JSON bodies, and the path-code normalization every
//! `/{code}` route goes through.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use navette_core::ReferenceCode;

use crate::error::AppError;

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Normalize a code typed by a user (path segment, search box).
///
/// Failures become 422 responses carrying the codec's error kind.
pub fn normalize_code(raw: &str) -> Result<ReferenceCode, AppError> {
    ReferenceCode::normalize(raw).map_err(|err| {
        tracing::debug!(input = %raw, kind = err.kind(), "reference rejected");
        AppError::from(err)
    })
}
