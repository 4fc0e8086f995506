//! # Reference Issuance
//!
//! Allocates the serial part of new reference codes: one counter per
//! `(kind, year)`, starting at 1. Serials restart every January.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use navette_core::reference::MAX_SERIAL;
use navette_core::{EntityKind, ReferenceCode, Timestamp};

/// The serial space of a year is used up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no {kind} serials left for {year}")]
pub struct SerialsExhausted {
    pub kind: EntityKind,
    pub year: i32,
}

/// Thread-safe serial allocator.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIssuer {
    counters: Arc<Mutex<HashMap<(EntityKind, i32), u32>>>,
}

impl ReferenceIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next code of `kind` for the current UTC year.
    pub fn issue(&self, kind: EntityKind) -> Result<ReferenceCode, SerialsExhausted> {
        self.issue_for_year(kind, Timestamp::now().year())
    }

    /// Issue the next code of `kind` for `year`.
    pub fn issue_for_year(&self, kind: EntityKind, year: i32) -> Result<ReferenceCode, SerialsExhausted> {
        let mut counters = self.counters.lock();
        let last = counters.entry((kind, year)).or_insert(0);
        let next = last
            .checked_add(1)
            .filter(|n| *n <= MAX_SERIAL)
            .ok_or(SerialsExhausted { kind, year })?;
        let code = ReferenceCode::issue(kind, year, next).ok_or(SerialsExhausted { kind, year })?;
        *last = next;
        Ok(code)
    }
}
