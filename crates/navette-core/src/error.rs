//! # Error Hierarchy
//!
//! Structured error types shared across Navette, built with `thiserror`.
//!
//! The tracking-code errors live next to the codec in
//! [`crate::reference::ReferenceError`]; this module holds the umbrella
//! type and the validation errors of the smaller primitives.

use thiserror::Error;

use crate::reference::ReferenceError;

/// Top-level error type for Navette.
#[derive(Error, Debug)]
pub enum NavetteError {
    /// A tracking reference was rejected by the codec.
    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A requested status change is not permitted.
    #[error("illegal transition: {0}")]
    IllegalTransition(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for domain primitives other than reference codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Role tag is not one of client, livreur, gerant, admin.
    #[error("unknown role: \"{0}\" (expected client, livreur, gerant or admin)")]
    UnknownRole(String),

    /// Entity kind tag is not parcel or mandate.
    #[error("unknown entity kind: \"{0}\" (expected parcel or mandate)")]
    UnknownEntityKind(String),

    /// Payment method tag is not recognised.
    #[error("unknown payment method: \"{0}\"")]
    UnknownPaymentMethod(String),

    /// A party (sender, recipient, requester) is missing required data.
    #[error("invalid party: {0}")]
    InvalidParty(String),

    /// Timestamp string is malformed or not UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
