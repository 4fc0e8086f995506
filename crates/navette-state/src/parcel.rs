//! # Parcel Lifecycle
//!
//! ```text
//! en_attente ──▶ pris_en_charge ──▶ en_transit ──▶ en_livraison ──▶ livre
//!     │               │                                 ▲     │
//!     │               └─────────────────────────────────┘     └──▶ echec_livraison
//!     │               │
//!     └──▶ annule ◀───┘
//! ```
//!
//! `en_preparation` is the older name for `pris_en_charge` and `echec` an
//! older name for `echec_livraison`; both are read, neither is written.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use navette_core::{AgencyId, EntityKind, Party, PaymentMethod, ReferenceCode, Role, UserId};

use crate::history::HistoryActor;
use crate::model::{parse_tag, Lifecycle, TransitionRule, UnknownStatus};
use crate::tracked::{Tracked, TrackedError};

/// Status of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Registered, waiting for the agency to take it in.
    EnAttente,
    /// Taken in by the agency or picked up by a courier.
    #[serde(alias = "en_preparation")]
    PrisEnCharge,
    /// Travelling between agencies.
    EnTransit,
    /// Out for delivery.
    EnLivraison,
    /// Handed to the recipient (terminal).
    Livre,
    /// Delivery failed (terminal).
    #[serde(alias = "echec")]
    EchecLivraison,
    /// Cancelled before delivery (terminal).
    Annule,
}

const MANAGERS: &[Role] = &[Role::Gerant, Role::Admin];
const FIELD: &[Role] = &[Role::Gerant, Role::Livreur, Role::Admin];
const DELIVERY: &[Role] = &[Role::Livreur, Role::Admin];

static TRANSITIONS: [TransitionRule<ParcelStatus>; 4] = [
    TransitionRule {
        from: ParcelStatus::EnAttente,
        to: &[ParcelStatus::PrisEnCharge, ParcelStatus::Annule],
        roles: MANAGERS,
    },
    TransitionRule {
        from: ParcelStatus::PrisEnCharge,
        to: &[
            ParcelStatus::EnTransit,
            ParcelStatus::EnLivraison,
            ParcelStatus::Annule,
        ],
        roles: FIELD,
    },
    TransitionRule {
        from: ParcelStatus::EnTransit,
        to: &[ParcelStatus::EnLivraison],
        roles: FIELD,
    },
    TransitionRule {
        from: ParcelStatus::EnLivraison,
        to: &[ParcelStatus::Livre, ParcelStatus::EchecLivraison],
        roles: DELIVERY,
    },
];

static ALL: [ParcelStatus; 7] = [
    ParcelStatus::EnAttente,
    ParcelStatus::PrisEnCharge,
    ParcelStatus::EnTransit,
    ParcelStatus::EnLivraison,
    ParcelStatus::Livre,
    ParcelStatus::EchecLivraison,
    ParcelStatus::Annule,
];

impl Lifecycle for ParcelStatus {
    const KIND: EntityKind = EntityKind::Parcel;
    const INITIAL: Self = Self::EnAttente;
    const LEGACY_TAGS: &'static [(&'static str, Self)] =
        &[("en_preparation", Self::PrisEnCharge), ("echec", Self::EchecLivraison)];

    fn all() -> &'static [Self] {
        &ALL
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::EnAttente => "en_attente",
            Self::PrisEnCharge => "pris_en_charge",
            Self::EnTransit => "en_transit",
            Self::EnLivraison => "en_livraison",
            Self::Livre => "livre",
            Self::EchecLivraison => "echec_livraison",
            Self::Annule => "annule",
        }
    }

    fn transitions() -> &'static [TransitionRule<Self>] {
        &TRANSITIONS
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Livre | Self::EchecLivraison | Self::Annule)
    }
}

impl ParcelStatus {
    /// Whether the parcel ended in a failure (failed delivery or cancellation).
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::EchecLivraison | Self::Annule)
    }
}

impl std::fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParcelStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag(s)
    }
}

/// What the counter captures when a parcel is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelDetails {
    /// Who sends it.
    pub sender: Party,
    /// Who receives it.
    pub recipient: Party,
    /// Free-text description of the contents.
    pub contents: String,
    /// Declared weight.
    pub weight_grams: Option<u32>,
    /// Tariff in CFA francs.
    pub tariff_fcfa: u64,
    /// How the tariff is settled.
    pub payment_method: PaymentMethod,
    /// Agency where it was dropped off.
    pub origin_agency: Option<AgencyId>,
    /// Agency where it will be collected, if not delivered to the door.
    pub destination_agency: Option<AgencyId>,
}

/// A parcel record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    /// Reference, status and history.
    pub tracking: Tracked<ParcelStatus>,
    /// Who sends it.
    pub sender: Party,
    /// Who receives it.
    pub recipient: Party,
    /// Free-text description of the contents.
    pub contents: String,
    /// Declared weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<u32>,
    /// Tariff in CFA francs.
    pub tariff_fcfa: u64,
    /// How the tariff is settled.
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Agency where it was dropped off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_agency: Option<AgencyId>,
    /// Agency where it will be collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_agency: Option<AgencyId>,
    /// Assigned courier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    courier: Option<UserId>,
    /// Client who registered it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
}

impl Parcel {
    /// Register a parcel in `en_attente`.
    ///
    /// # Errors
    ///
    /// [`TrackedError::Invalid`] if a party fails validation,
    /// [`TrackedError::KindMismatch`] if `reference` is not a parcel code.
    pub fn register(
        reference: ReferenceCode,
        details: ParcelDetails,
        owner: Option<UserId>,
        actor: Option<HistoryActor>,
    ) -> Result<Self, TrackedError> {
        details.sender.validate()?;
        details.recipient.validate()?;
        let tracking = Tracked::new(reference, "Colis enregistré", actor)?;
        Ok(Self {
            tracking,
            sender: details.sender,
            recipient: details.recipient,
            contents: details.contents,
            weight_grams: details.weight_grams,
            tariff_fcfa: details.tariff_fcfa,
            payment_method: details.payment_method,
            origin_agency: details.origin_agency,
            destination_agency: details.destination_agency,
            courier: None,
            owner,
        })
    }

    /// The parcel's reference.
    pub fn reference(&self) -> &ReferenceCode {
        self.tracking.reference()
    }

    /// Current status.
    pub fn status(&self) -> ParcelStatus {
        self.tracking.status()
    }

    /// Assigned courier, if any.
    pub fn courier(&self) -> Option<UserId> {
        self.courier
    }

    /// Assign or reassign the courier. Refused once the parcel is terminal.
    pub fn assign_courier(&mut self, courier: UserId) -> Result<(), TrackedError> {
        self.tracking.require_open()?;
        self.courier = Some(courier);
        self.tracking.touch();
        Ok(())
    }
}
