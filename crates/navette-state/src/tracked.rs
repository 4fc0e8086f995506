//! # Tracked Records
//!
//! [`Tracked`] couples a reference code with a lifecycle status and its
//! history. It is the only way a status changes: every transition is
//! checked against the lifecycle table before anything is written, so a
//! rejected request leaves the record exactly as it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use navette_core::{EntityKind, NavetteError, ReferenceCode, Role, Timestamp, ValidationError};

use crate::history::{history_entry_at, History, HistoryActor, HistoryError, HistoryRecord};
use crate::model::{check_transition, IllegalTransition, Lifecycle};

/// Errors raised by tracked records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackedError {
    /// The reference code belongs to another entity kind.
    #[error("reference {reference} is not a {expected} code")]
    KindMismatch {
        /// Offending code.
        reference: String,
        /// Kind the record expects.
        expected: EntityKind,
    },

    /// The lifecycle refused the transition.
    #[error(transparent)]
    Illegal(#[from] IllegalTransition),

    /// The history refused the entry.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// The record is closed and only its status may be read.
    #[error("{reference} is in terminal status {status}")]
    Closed {
        /// Reference of the record.
        reference: String,
        /// Its terminal status.
        status: &'static str,
    },

    /// Record data failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// A stored record contradicts itself.
    #[error("stored record {reference} is inconsistent: {problem}")]
    Inconsistent {
        /// Reference of the record.
        reference: String,
        /// What does not hold.
        problem: &'static str,
    },
}

impl From<TrackedError> for NavetteError {
    fn from(err: TrackedError) -> Self {
        match err {
            TrackedError::Invalid(e) => NavetteError::Validation(e),
            other => NavetteError::IllegalTransition(other.to_string()),
        }
    }
}

/// A reference code with its lifecycle status and history.
///
/// Deserialization goes through [`TrackedRaw`] and refuses records that
/// [`Tracked::new`] and [`Tracked::transition`] could never have produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Lifecycle", try_from = "TrackedRaw<S>")]
pub struct Tracked<S> {
    reference: ReferenceCode,
    status: S,
    history: History<S>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

/// Stored shape of a [`Tracked`] record, before its invariants are checked.
#[derive(Deserialize)]
#[serde(bound = "S: Lifecycle")]
pub struct TrackedRaw<S> {
    reference: ReferenceCode,
    status: S,
    history: History<S>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl<S: Lifecycle> TryFrom<TrackedRaw<S>> for Tracked<S> {
    type Error = TrackedError;

    fn try_from(raw: TrackedRaw<S>) -> Result<Self, Self::Error> {
        if raw.reference.kind() != S::KIND {
            return Err(TrackedError::KindMismatch {
                reference: raw.reference.to_string(),
                expected: S::KIND,
            });
        }
        let inconsistent = |problem| TrackedError::Inconsistent {
            reference: raw.reference.to_string(),
            problem,
        };
        let latest = raw.history.latest().ok_or_else(|| inconsistent("empty history"))?;
        if !raw.history.is_ordered() {
            return Err(inconsistent("history dates go backwards"));
        }
        if latest.status != raw.status {
            return Err(inconsistent("status differs from the latest history entry"));
        }
        Ok(Self {
            reference: raw.reference,
            status: raw.status,
            history: raw.history,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

impl<S: Lifecycle> Tracked<S> {
    /// Start tracking in the initial status, with one history entry.
    pub fn new(
        reference: ReferenceCode,
        description: &str,
        actor: Option<HistoryActor>,
    ) -> Result<Self, TrackedError> {
        Self::new_at(reference, description, actor, Timestamp::now())
    }

    /// [`Tracked::new`] with an explicit creation time.
    pub fn new_at(
        reference: ReferenceCode,
        description: &str,
        actor: Option<HistoryActor>,
        at: Timestamp,
    ) -> Result<Self, TrackedError> {
        if reference.kind() != S::KIND {
            return Err(TrackedError::KindMismatch {
                reference: reference.to_string(),
                expected: S::KIND,
            });
        }
        let mut history = History::new();
        history.append(history_entry_at(S::INITIAL, description, actor, at))?;
        Ok(Self {
            reference,
            status: S::INITIAL,
            history,
            created_at: at,
            updated_at: at,
        })
    }

    pub fn reference(&self) -> &ReferenceCode {
        &self.reference
    }

    pub fn status(&self) -> S {
        self.status
    }

    pub fn history(&self) -> &History<S> {
        &self.history
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Whether the record reached a terminal status.
    pub fn is_closed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `to` as `role`, recording the change. Returns the previous status.
    pub fn transition(
        &mut self,
        to: S,
        role: Role,
        description: &str,
        actor: Option<HistoryActor>,
    ) -> Result<S, TrackedError> {
        self.transition_at(to, role, description, actor, Timestamp::now())
    }

    /// [`Tracked::transition`] with an explicit time.
    pub fn transition_at(
        &mut self,
        to: S,
        role: Role,
        description: &str,
        actor: Option<HistoryActor>,
        at: Timestamp,
    ) -> Result<S, TrackedError> {
        check_transition(self.status, to, role)?;
        self.history
            .append(history_entry_at(to, description, actor, at))?;
        let from = self.status;
        self.status = to;
        self.updated_at = at;
        Ok(from)
    }

    /// Statuses `role` may move this record to.
    pub fn allowed_actions(&self, role: Role) -> Vec<S> {
        crate::model::allowed_actions(self.status, role)
    }

    /// Most recent history entry.
    pub fn latest(&self) -> Option<&HistoryRecord<S>> {
        self.history.latest()
    }

    pub(crate) fn require_open(&self) -> Result<(), TrackedError> {
        if self.is_closed() {
            return Err(TrackedError::Closed {
                reference: self.reference.to_string(),
                status: self.status.as_str(),
            });
        }
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        let now = Timestamp::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
