//! # Tracking Reference Codec
//!
//! Parses, validates, and normalizes human-entered tracking codes into a
//! single canonical form.
//!
//! ## Format
//!
//! ```text
//! PREFIX-YYYY-NNNNNN
//!   PREFIX  CLS | SHP (parcel, SHP is the legacy spelling) | MND (mandate)
//!   YYYY    four-digit issuing year
//!   NNNNNN  zero-padded six-digit serial
//! ```
//!
//! The short form `PREFIX-N` (one to six digits) is accepted at the input
//! boundary and expanded with the current year, so a counter clerk can type
//! `cls-42` and get `CLS-2026-000042`.
//!
//! ## Two Entry Points
//!
//! - [`ReferenceCode::normalize`] is for user input. It applies the year
//!   window (current year ± 1) so that a typo in the year fails here with a
//!   specific message instead of a generic "not found" further down.
//! - [`ReferenceCode::parse`] is for codes that are already stored. It checks
//!   shape and prefix only; a code issued three years ago stays readable.
//!
//! Both produce the canonical prefix: `SHP-` is rewritten to `CLS-`.

use std::str::FromStr;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;

/// Canonical parcel prefix.
pub const PARCEL_PREFIX: &str = "CLS";
/// Legacy parcel prefix, accepted on input and rewritten to [`PARCEL_PREFIX`].
pub const LEGACY_PARCEL_PREFIX: &str = "SHP";
/// Mandate prefix.
pub const MANDATE_PREFIX: &str = "MND";

/// Largest serial a reference can carry.
pub const MAX_SERIAL: u32 = 999_999;

const YEAR_DIGITS: usize = 4;
const SERIAL_DIGITS: usize = 6;

// ─── Entity Kind ─────────────────────────────────────────────────────

/// The class of record a reference denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A physical shipment (colis).
    Parcel,
    /// An administrative-document errand (mandat).
    Mandate,
}

impl EntityKind {
    /// Both kinds, in display order.
    pub const ALL: [EntityKind; 2] = [EntityKind::Parcel, EntityKind::Mandate];

    /// The snake_case tag used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parcel => "parcel",
            Self::Mandate => "mandate",
        }
    }

    /// The canonical reference prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Parcel => PARCEL_PREFIX,
            Self::Mandate => MANDATE_PREFIX,
        }
    }

    /// Resolve a prefix (without the dash) to its kind.
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            PARCEL_PREFIX | LEGACY_PARCEL_PREFIX => Some(Self::Parcel),
            MANDATE_PREFIX => Some(Self::Mandate),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parcel" | "colis" => Ok(Self::Parcel),
            "mandate" | "mandat" => Ok(Self::Mandate),
            _ => Err(ValidationError::UnknownEntityKind(s.to_string())),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Rejection of a tracking code at the input boundary.
///
/// Always recoverable: the caller shows the message to whoever typed the
/// code and asks again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// The input does not have the `PREFIX-YYYY-NNNNNN` shape, even after
    /// short-form expansion.
    #[error(
        "invalid reference format {input:?}; valid examples: \
         CLS-{current_year}-000001, SHP-{current_year}-000001, MND-{current_year}-000001"
    )]
    InvalidFormat {
        /// The input as received.
        input: String,
        /// The year the examples are rendered for.
        current_year: i32,
    },

    /// The prefix is well-formed but not one of `CLS-`, `SHP-`, `MND-`.
    #[error("unknown reference prefix {prefix:?}; expected CLS-, SHP- or MND-")]
    InvalidPrefix {
        /// The offending prefix, including its trailing dash.
        prefix: String,
    },

    /// The year lies outside the accepted window around the current year.
    #[error(
        "reference year {year} is outside the accepted window {}..={}",
        .current_year.saturating_sub(1),
        .current_year.saturating_add(1)
    )]
    InvalidYear {
        /// The year carried by the code.
        year: i32,
        /// The year the window is centred on.
        current_year: i32,
    },
}

impl ReferenceError {
    /// Machine-readable error kind, as exposed to front ends.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "InvalidFormat",
            Self::InvalidPrefix { .. } => "InvalidPrefix",
            Self::InvalidYear { .. } => "InvalidYear",
        }
    }
}

// ─── Reference Code ──────────────────────────────────────────────────

/// A canonical tracking reference (`CLS-YYYY-NNNNNN` or `MND-YYYY-NNNNNN`).
///
/// Immutable once created. Serializes as its canonical string; deserializes
/// through [`ReferenceCode::parse`], so stored `SHP-` codes load as `CLS-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceCode(String);

impl ReferenceCode {
    /// Normalize user input against the current UTC year.
    ///
    /// See [`ReferenceCode::normalize_for_year`] for the rules.
    pub fn normalize(input: &str) -> Result<Self, ReferenceError> {
        Self::normalize_for_year(input, chrono::Utc::now().year())
    }

    /// Normalize user input against an explicit current year.
    ///
    /// 1. Trim and upper-case.
    /// 2. Expand the short form `PREFIX-N` to `PREFIX-{year}-{N:06}`.
    /// 3. Require the full `PREFIX-YYYY-NNNNNN` shape ([`ReferenceError::InvalidFormat`]).
    /// 4. Require a known prefix ([`ReferenceError::InvalidPrefix`]).
    /// 5. Require `current_year - 1 <= YYYY <= current_year + 1`
    ///    ([`ReferenceError::InvalidYear`]).
    /// 6. Rewrite `SHP-` to `CLS-`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check in the order above.
    pub fn normalize_for_year(input: &str, current_year: i32) -> Result<Self, ReferenceError> {
        let upper = input.trim().to_uppercase();
        let candidate = expand_short_form(&upper, current_year).unwrap_or(upper);

        let parts = split_full_form(&candidate).ok_or_else(|| ReferenceError::InvalidFormat {
            input: input.to_string(),
            current_year,
        })?;

        let kind = EntityKind::from_prefix(parts.prefix).ok_or_else(|| {
            ReferenceError::InvalidPrefix {
                prefix: format!("{}-", parts.prefix),
            }
        })?;

        if parts.year < current_year.saturating_sub(1) || parts.year > current_year.saturating_add(1) {
            return Err(ReferenceError::InvalidYear {
                year: parts.year,
                current_year,
            });
        }

        Ok(Self::assemble(kind, parts.year, parts.serial))
    }

    /// Structural parse of a stored code: shape and prefix, no year window.
    ///
    /// Accepts only the full form. Leading/trailing whitespace is trimmed
    /// and letters are upper-cased; `SHP-` is canonicalized.
    ///
    /// # Errors
    ///
    /// [`ReferenceError::InvalidFormat`] or [`ReferenceError::InvalidPrefix`].
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        let upper = input.trim().to_uppercase();
        let parts = split_full_form(&upper).ok_or_else(|| ReferenceError::InvalidFormat {
            input: input.to_string(),
            current_year: chrono::Utc::now().year(),
        })?;
        let kind = EntityKind::from_prefix(parts.prefix).ok_or_else(|| {
            ReferenceError::InvalidPrefix {
                prefix: format!("{}-", parts.prefix),
            }
        })?;
        Ok(Self::assemble(kind, parts.year, parts.serial))
    }

    /// Build a fresh code for the issuing system.
    ///
    /// Returns `None` if `serial` is zero or exceeds [`MAX_SERIAL`], or if
    /// `year` does not fit in four digits.
    pub fn issue(kind: EntityKind, year: i32, serial: u32) -> Option<Self> {
        if serial == 0 || serial > MAX_SERIAL || !(1000..=9999).contains(&year) {
            return None;
        }
        Some(Self::assemble(kind, year, serial))
    }

    fn assemble(kind: EntityKind, year: i32, serial: u32) -> Self {
        Self(format!("{}-{year:04}-{serial:06}", kind.prefix()))
    }

    /// The canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entity class this code denotes.
    pub fn kind(&self) -> EntityKind {
        if self.0.starts_with(MANDATE_PREFIX) {
            EntityKind::Mandate
        } else {
            EntityKind::Parcel
        }
    }

    /// The canonical prefix, without the dash.
    pub fn prefix(&self) -> &str {
        &self.0[..3]
    }

    /// The issuing year.
    pub fn year(&self) -> i32 {
        self.0[4..8].parse().unwrap_or_default()
    }

    /// The serial number.
    pub fn serial(&self) -> u32 {
        self.0[9..].parse().unwrap_or_default()
    }
}

impl std::fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReferenceCode {
    type Err = ReferenceError;

    /// Same as [`ReferenceCode::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferenceCode {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferenceCode> for String {
    fn from(code: ReferenceCode) -> Self {
        code.0
    }
}

impl AsRef<str> for ReferenceCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ─── Parsing helpers ─────────────────────────────────────────────────

/// Components of a string with the full `LETTERS-DDDD-DDDDDD` shape.
struct FullForm<'a> {
    prefix: &'a str,
    year: i32,
    serial: u32,
}

fn is_prefix_shape(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// Split `LETTERS-DDDD-DDDDDD`, or `None` if the shape does not match.
fn split_full_form(s: &str) -> Option<FullForm<'_>> {
    let mut parts = s.split('-');
    let prefix = parts.next()?;
    let year = parts.next()?;
    let serial = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if !is_prefix_shape(prefix)
        || !is_digits(year, YEAR_DIGITS, YEAR_DIGITS)
        || !is_digits(serial, SERIAL_DIGITS, SERIAL_DIGITS)
    {
        return None;
    }
    Some(FullForm {
        prefix,
        year: year.parse().ok()?,
        serial: serial.parse().ok()?,
    })
}

/// Expand `LETTERS-D{1,6}` into the full form for `year`.
fn expand_short_form(s: &str, year: i32) -> Option<String> {
    let (prefix, serial) = s.split_once('-')?;
    if !is_prefix_shape(prefix) || !is_digits(serial, 1, SERIAL_DIGITS) {
        return None;
    }
    Some(format!("{prefix}-{year:04}-{serial:0>6}"))
}
