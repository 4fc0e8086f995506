//! # Status History
//!
//! Every status change of a parcel or mandate leaves a [`HistoryRecord`].
//! The wire shape is the one front ends already store:
//!
//! ```json
//! { "statut": "pris_en_charge", "description": "...", "date": "2026-03-08T09:30:45Z",
//!   "utilisateur": { "id": "...", "nom": "Koné", "prenom": "Awa", "role": "gerant" } }
//! ```
//!
//! [`History`] only grows, and only forward in time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use navette_core::{Role, Timestamp};

/// Who performed a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryActor {
    /// User identifier as stored by the caller.
    pub id: String,
    /// Family name.
    #[serde(rename = "nom")]
    pub last_name: String,
    /// Given name.
    #[serde(rename = "prenom")]
    pub first_name: String,
    /// Role held when acting.
    pub role: Role,
}

/// One entry of a status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord<S> {
    /// Status entered.
    #[serde(rename = "statut")]
    pub status: S,
    /// Free text shown to the client.
    pub description: String,
    /// When it happened.
    pub date: Timestamp,
    /// Who did it, absent for system entries.
    #[serde(rename = "utilisateur", default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<HistoryActor>,
}

/// Build a history entry stamped with the current time.
///
/// Pure constructor; the caller decides where it is appended.
pub fn history_entry<S>(
    status: S,
    description: impl Into<String>,
    actor: Option<HistoryActor>,
) -> HistoryRecord<S> {
    history_entry_at(status, description, actor, Timestamp::now())
}

/// Build a history entry with an explicit date.
pub fn history_entry_at<S>(
    status: S,
    description: impl Into<String>,
    actor: Option<HistoryActor>,
    date: Timestamp,
) -> HistoryRecord<S> {
    HistoryRecord {
        status,
        description: description.into(),
        date,
        actor,
    }
}

/// Errors raised when appending to a history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The entry is dated before the latest one.
    #[error("history entry dated {date} precedes the latest entry ({latest})")]
    OutOfOrder {
        /// Date of the rejected entry.
        date: Timestamp,
        /// Date of the latest entry.
        latest: Timestamp,
    },
}

/// Append-only, date-ordered status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History<S>(Vec<HistoryRecord<S>>);

impl<S> History<S> {
    /// An empty history.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an entry. Entries sharing the latest date are accepted.
    pub fn append(&mut self, entry: HistoryRecord<S>) -> Result<(), HistoryError> {
        if let Some(latest) = self.0.last() {
            if entry.date < latest.date {
                return Err(HistoryError::OutOfOrder {
                    date: entry.date,
                    latest: latest.date,
                });
            }
        }
        self.0.push(entry);
        Ok(())
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[HistoryRecord<S>] {
        &self.0
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&HistoryRecord<S>> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether dates never decrease. Always true for histories built with
    /// [`History::append`]; checked when a stored
    /// [`Tracked`](crate::Tracked) record is loaded.
    pub fn is_ordered(&self) -> bool {
        self.0.windows(2).all(|w| w[0].date <= w[1].date)
    }
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S> IntoIterator for &'a History<S> {
    type Item = &'a HistoryRecord<S>;
    type IntoIter = std::slice::Iter<'a, HistoryRecord<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parcel::ParcelStatus;

    fn at(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn actor() -> HistoryActor {
        HistoryActor {
            id: "u-17".into(),
            last_name: "Koné".into(),
            first_name: "Awa".into(),
            role: Role::Gerant,
        }
    }

    #[test]
    fn wire_shape_matches_stored_entries() {
        let entry = history_entry_at(
            ParcelStatus::PrisEnCharge,
            "Colis reçu à l'agence",
            Some(actor()),
            at("2026-03-08T09:30:45Z"),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "statut": "pris_en_charge",
                "description": "Colis reçu à l'agence",
                "date": "2026-03-08T09:30:45Z",
                "utilisateur": { "id": "u-17", "nom": "Koné", "prenom": "Awa", "role": "gerant" }
            })
        );
    }

    #[test]
    fn actor_is_omitted_when_absent() {
        let entry = history_entry_at(ParcelStatus::EnAttente, "", None, at("2026-03-08T09:30:45Z"));
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("utilisateur").is_none());
    }

    #[test]
    fn stored_legacy_entries_load() {
        let raw = r#"[{"statut":"en_preparation","description":"","date":"2025-11-02T08:00:00Z"}]"#;
        let history: History<ParcelStatus> = serde_json::from_str(raw).unwrap();
        assert_eq!(history.entries()[0].status, ParcelStatus::PrisEnCharge);
    }

    #[test]
    fn history_entry_does_not_touch_any_log() {
        let log: History<ParcelStatus> = History::new();
        let _ = history_entry(ParcelStatus::Annule, "x", None);
        assert!(log.is_empty());
    }

    #[test]
    fn append_rejects_entries_from_the_past() {
        let mut log = History::new();
        log.append(history_entry_at(ParcelStatus::EnAttente, "a", None, at("2026-03-08T10:00:00Z")))
            .unwrap();
        log.append(history_entry_at(ParcelStatus::PrisEnCharge, "b", None, at("2026-03-08T10:00:00Z")))
            .unwrap();
        let err = log
            .append(history_entry_at(ParcelStatus::Annule, "c", None, at("2026-03-08T09:59:59Z")))
            .unwrap_err();
        assert!(matches!(err, HistoryError::OutOfOrder { .. }));
        assert_eq!(log.len(), 2);
        assert_eq!(log.latest().unwrap().status, ParcelStatus::PrisEnCharge);
        assert!(log.is_ordered());
    }
}
