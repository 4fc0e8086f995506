//! # Mandate Lifecycle
//!
//! A mandate is an errand: the agency obtains an administrative document
//! (birth certificate, criminal record extract, ...) on the client's behalf
//! and delivers it.
//!
//! ```text
//! en_attente → documents_verifies → procuration_signee → depose_administration
//!   → en_traitement → document_obtenu → en_livraison → {livre | echec}
//! ```
//!
//! `annule` is reachable from the first three statuses, before the file
//! is lodged with the administration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use navette_core::{AgencyId, EntityKind, Party, PaymentMethod, ReferenceCode, Role, UserId};

use crate::history::HistoryActor;
use crate::model::{parse_tag, Lifecycle, TransitionRule, UnknownStatus};
use crate::tracked::{Tracked, TrackedError};

/// Status of a mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateStatus {
    /// Ordered, waiting for document checks.
    EnAttente,
    /// Supporting documents checked.
    DocumentsVerifies,
    /// Power of attorney signed by the client.
    ProcurationSignee,
    /// File lodged with the administration.
    DeposeAdministration,
    /// Administration is processing the file.
    EnTraitement,
    /// Document collected from the administration.
    DocumentObtenu,
    /// Out for delivery.
    EnLivraison,
    /// Document handed to the client (terminal).
    Livre,
    /// Mandate failed (terminal).
    #[serde(alias = "echec_livraison")]
    Echec,
    /// Cancelled (terminal).
    Annule,
}

const MANAGERS: &[Role] = &[Role::Gerant, Role::Admin];
const FIELD: &[Role] = &[Role::Gerant, Role::Livreur, Role::Admin];
const DELIVERY: &[Role] = &[Role::Livreur, Role::Admin];

static TRANSITIONS: [TransitionRule<MandateStatus>; 7] = [
    TransitionRule {
        from: MandateStatus::EnAttente,
        to: &[MandateStatus::DocumentsVerifies, MandateStatus::Annule],
        roles: MANAGERS,
    },
    TransitionRule {
        from: MandateStatus::DocumentsVerifies,
        to: &[MandateStatus::ProcurationSignee, MandateStatus::Annule],
        roles: MANAGERS,
    },
    TransitionRule {
        from: MandateStatus::ProcurationSignee,
        to: &[MandateStatus::DeposeAdministration, MandateStatus::Annule],
        roles: FIELD,
    },
    TransitionRule {
        from: MandateStatus::DeposeAdministration,
        to: &[MandateStatus::EnTraitement],
        roles: FIELD,
    },
    TransitionRule {
        from: MandateStatus::EnTraitement,
        to: &[MandateStatus::DocumentObtenu],
        roles: FIELD,
    },
    TransitionRule {
        from: MandateStatus::DocumentObtenu,
        to: &[MandateStatus::EnLivraison],
        roles: FIELD,
    },
    TransitionRule {
        from: MandateStatus::EnLivraison,
        to: &[MandateStatus::Livre, MandateStatus::Echec],
        roles: DELIVERY,
    },
];

static ALL: [MandateStatus; 10] = [
    MandateStatus::EnAttente,
    MandateStatus::DocumentsVerifies,
    MandateStatus::ProcurationSignee,
    MandateStatus::DeposeAdministration,
    MandateStatus::EnTraitement,
    MandateStatus::DocumentObtenu,
    MandateStatus::EnLivraison,
    MandateStatus::Livre,
    MandateStatus::Echec,
    MandateStatus::Annule,
];

impl Lifecycle for MandateStatus {
    const KIND: EntityKind = EntityKind::Mandate;
    const INITIAL: Self = Self::EnAttente;
    const LEGACY_TAGS: &'static [(&'static str, Self)] = &[("echec_livraison", Self::Echec)];

    fn all() -> &'static [Self] {
        &ALL
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::EnAttente => "en_attente",
            Self::DocumentsVerifies => "documents_verifies",
            Self::ProcurationSignee => "procuration_signee",
            Self::DeposeAdministration => "depose_administration",
            Self::EnTraitement => "en_traitement",
            Self::DocumentObtenu => "document_obtenu",
            Self::EnLivraison => "en_livraison",
            Self::Livre => "livre",
            Self::Echec => "echec",
            Self::Annule => "annule",
        }
    }

    fn transitions() -> &'static [TransitionRule<Self>] {
        &TRANSITIONS
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Livre | Self::Echec | Self::Annule)
    }
}

impl MandateStatus {
    /// Whether the mandate ended in a failure (failure or cancellation).
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Echec | Self::Annule)
    }
}

impl std::fmt::Display for MandateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MandateStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag(s)
    }
}

/// What the counter captures when a mandate is ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandateDetails {
    /// Client on whose behalf the document is obtained.
    pub requester: Party,
    /// Kind of document, e.g. "extrait d'acte de naissance".
    pub document_type: String,
    /// Administration that issues it.
    pub administration: String,
    /// Tariff in CFA francs.
    pub tariff_fcfa: u64,
    /// How the tariff is settled.
    pub payment_method: PaymentMethod,
    /// Agency handling the mandate.
    pub agency: Option<AgencyId>,
}

/// A mandate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mandate {
    /// Reference, status and history.
    pub tracking: Tracked<MandateStatus>,
    /// Client on whose behalf the document is obtained.
    pub requester: Party,
    /// Kind of document.
    pub document_type: String,
    /// Issuing administration.
    pub administration: String,
    /// Tariff in CFA francs.
    pub tariff_fcfa: u64,
    /// How the tariff is settled.
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Agency handling the mandate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<AgencyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    courier: Option<UserId>,
    /// Client who ordered it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
}

impl Mandate {
    /// Open a mandate in `en_attente`.
    pub fn open(
        reference: ReferenceCode,
        details: MandateDetails,
        owner: Option<UserId>,
        actor: Option<HistoryActor>,
    ) -> Result<Self, TrackedError> {
        details.requester.validate()?;
        let tracking = Tracked::new(reference, "Mandat enregistré", actor)?;
        Ok(Self {
            tracking,
            requester: details.requester,
            document_type: details.document_type,
            administration: details.administration,
            tariff_fcfa: details.tariff_fcfa,
            payment_method: details.payment_method,
            agency: details.agency,
            courier: None,
            owner,
        })
    }

    /// The mandate's reference.
    pub fn reference(&self) -> &ReferenceCode {
        self.tracking.reference()
    }

    /// Current status.
    pub fn status(&self) -> MandateStatus {
        self.tracking.status()
    }

    /// Assigned courier, if any.
    pub fn courier(&self) -> Option<UserId> {
        self.courier
    }

    /// Assign or reassign the courier. Refused once the mandate is terminal.
    pub fn assign_courier(&mut self, courier: UserId) -> Result<(), TrackedError> {
        self.tracking.require_open()?;
        self.courier = Some(courier);
        self.tracking.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{allowed_next, can_transition};

    #[test]
    fn legacy_failure_tag() {
        let s: MandateStatus = serde_json::from_str("\"echec_livraison\"").unwrap();
        assert_eq!(s, MandateStatus::Echec);
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"echec\"");
    }

    #[test]
    fn main_path_is_linear() {
        let path = &MandateStatus::all()[..8];
        for pair in path.windows(2) {
            assert!(allowed_next(pair[0]).contains(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn cancellation_only_before_lodging() {
        use MandateStatus::*;
        assert!(can_transition(EnAttente, Annule, Role::Gerant));
        assert!(can_transition(ProcurationSignee, Annule, Role::Livreur));
        assert!(!can_transition(DeposeAdministration, Annule, Role::Admin));
        assert!(!can_transition(EnLivraison, Annule, Role::Admin));
    }

    #[test]
    fn document_checks_are_for_managers() {
        use MandateStatus::*;
        assert!(!can_transition(EnAttente, DocumentsVerifies, Role::Livreur));
        assert!(can_transition(EnAttente, DocumentsVerifies, Role::Gerant));
        assert!(can_transition(EnLivraison, Echec, Role::Livreur));
        assert!(!can_transition(EnLivraison, Echec, Role::Gerant));
    }
}
