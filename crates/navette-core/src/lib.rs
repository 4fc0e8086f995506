#![deny(missing_docs)]

//! # navette-core — Foundational Types for Navette
//!
//! This crate defines the primitives every other crate in the workspace
//! depends on. It has no internal crate dependencies — only `serde`,
//! `serde_json`, `thiserror`, `chrono`, and `uuid` from the ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Tracking references are a type, not a string.** A [`ReferenceCode`]
//!    can only be obtained through the codec, so every value in the system
//!    is already canonical (`CLS-YYYY-NNNNNN` or `MND-YYYY-NNNNNN`).
//!
//! 2. **Roles are passed explicitly.** [`Role`] is a plain value handed to
//!    the state machines; nothing here reads an ambient session.
//!
//! 3. **Newtype wrappers for identifiers.** You cannot pass an [`AgencyId`]
//!    where a [`UserId`] is expected.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision,
//!    rendered `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! 5. **[`NavetteError`] hierarchy.** Structured errors with `thiserror` — no
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod party;
pub mod reference;
pub mod role;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{NavetteError, ValidationError};
pub use identity::{AgencyId, UserId};
pub use party::{Party, PaymentMethod};
pub use reference::{EntityKind, ReferenceCode, ReferenceError};
pub use role::Role;
pub use temporal::Timestamp;
