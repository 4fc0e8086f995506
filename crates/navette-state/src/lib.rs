//! # navette-state — Parcel and Mandate Lifecycles
//!
//! The single source of truth for which statuses exist, which are
//! terminal, and which role may move a record from one status to another.
//!
//! ## State Machines
//!
//! - **Parcel** (`parcel.rs`): `en_attente → pris_en_charge → en_transit →
//!   en_livraison → {livre | echec_livraison}`, with `annule` before transit.
//!
//! - **Mandate** (`mandate.rs`): `en_attente → documents_verifies →
//!   procuration_signee → depose_administration → en_traitement →
//!   document_obtenu → en_livraison → {livre | echec}`, with `annule` before
//!   the file is lodged.
//!
//! ## Design
//!
//! Each vocabulary is a plain enum implementing [`Lifecycle`], which carries
//! its transition table as static data. Decisions are pure functions of
//! `(from, to, role)`; the role is always an argument, never ambient. The
//! only mutable type, [`Tracked`], checks before it writes.

pub mod history;
pub mod mandate;
pub mod model;
pub mod parcel;
pub mod tracked;

// ─── Model re-exports ───────────────────────────────────────────────

pub use model::{
    allowed_actions, allowed_next, can_transition, can_transition_tagged, check_transition,
    describe, describe_kind, IllegalTransition, Lifecycle, Rejection, TableRow, TransitionRule,
    UnknownStatus,
};

// ─── History re-exports ─────────────────────────────────────────────

pub use history::{history_entry, history_entry_at, History, HistoryActor, HistoryError, HistoryRecord};

// ─── Record re-exports ──────────────────────────────────────────────

pub use mandate::{Mandate, MandateDetails, MandateStatus};
pub use parcel::{Parcel, ParcelDetails, ParcelStatus};
pub use tracked::{Tracked, TrackedError, TrackedRaw};
