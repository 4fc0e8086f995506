//! # API Route Modules
//!
//! - `tracking` — public code lookup and the lifecycle tables.
//! - `parcels` — parcel registration, listing, status transitions, courier assignment.
//! - `mandates` — the same for administrative-document mandates.
//! - `agencies` — agency directory.
//! - `users` — user directory (history actors, courier validation).
//! - `reports` — per-status counts for managers.
//!
//! Shared request/response pieces used by several modules live here.

pub mod agencies;
pub mod mandates;
pub mod parcels;
pub mod reports;
pub mod tracking;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use navette_core::{AgencyId, Party, PaymentMethod, Role, UserId};
use navette_state::{HistoryActor, Lifecycle, Tracked, TrackedError};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::Validate;
use crate::middleware::metrics::{record_rejection, record_transition};
use crate::state::AppState;

// ── Shared DTOs ─────────────────────────────────────────────────────

/// A sender, recipient or requester.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartyBody {
    pub name: String,
    /// Phone number, national or international form.
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<PartyBody> for Party {
    fn from(body: PartyBody) -> Self {
        Party {
            name: body.name,
            phone: body.phone,
            address: body.address,
        }
    }
}

impl From<&Party> for PartyBody {
    fn from(party: &Party) -> Self {
        PartyBody {
            name: party.name.clone(),
            phone: party.phone.clone(),
            address: party.address.clone(),
        }
    }
}

/// Who performed a status change.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActorView {
    pub id: String,
    pub nom: String,
    pub prenom: String,
    pub role: String,
}

/// One history entry, in the stored wire shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntryView {
    pub statut: String,
    pub description: String,
    /// ISO 8601 UTC.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilisateur: Option<ActorView>,
}

impl From<&HistoryActor> for ActorView {
    fn from(actor: &HistoryActor) -> Self {
        ActorView {
            id: actor.id.clone(),
            nom: actor.last_name.clone(),
            prenom: actor.first_name.clone(),
            role: actor.role.to_string(),
        }
    }
}

/// History of a tracked record, oldest first.
pub fn history_view<S: Lifecycle>(tracked: &Tracked<S>) -> Vec<HistoryEntryView> {
    tracked
        .history()
        .into_iter()
        .map(|entry| HistoryEntryView {
            statut: entry.status.as_str().to_string(),
            description: entry.description.clone(),
            date: entry.date.to_iso8601(),
            utilisateur: entry.actor.as_ref().map(ActorView::from),
        })
        .collect()
}

/// Request a status change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// Target status tag. Legacy tags are accepted.
    pub to: String,
    /// Text shown in the history; a default is written when absent.
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for TransitionRequest {
    fn validate(&self) -> Result<(), String> {
        if self.to.trim().is_empty() {
            return Err("to must not be empty".to_string());
        }
        Ok(())
    }
}

/// Assign a courier.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignCourierRequest {
    /// A registered user with the `livreur` role.
    pub courier_id: Uuid,
}

/// Optional status filter for list endpoints.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Only records in this status.
    pub status: Option<String>,
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Parse an optional status filter.
pub(crate) fn status_filter<S: Lifecycle>(raw: Option<&str>) -> Result<Option<S>, AppError> {
    raw.map(|tag| tag.parse::<S>().map_err(AppError::from))
        .transpose()
}

/// Parse an optional payment tag, defaulting to cash.
pub(crate) fn payment_method(raw: Option<&str>) -> Result<PaymentMethod, AppError> {
    match raw {
        Some(tag) => Ok(tag.parse()?),
        None => Ok(PaymentMethod::default()),
    }
}

/// Resolve an optional agency reference against the directory.
pub(crate) fn known_agency(state: &AppState, id: Option<Uuid>) -> Result<Option<AgencyId>, AppError> {
    match id.map(AgencyId::from_uuid) {
        Some(agency) if !state.agencies.contains(&agency) => {
            Err(AppError::Validation(format!("unknown agency {agency}")))
        }
        other => Ok(other),
    }
}

/// Resolve a courier id: it must be a registered `livreur`.
pub(crate) fn registered_courier(state: &AppState, id: Uuid) -> Result<UserId, AppError> {
    let user_id = UserId::from_uuid(id);
    match state.users.get(&user_id) {
        Some(user) if user.role == Role::Livreur => Ok(user_id),
        Some(user) => Err(AppError::Validation(format!(
            "user {user_id} is a {}, not a livreur",
            user.role
        ))),
        None => Err(AppError::Validation(format!("unknown user {user_id}"))),
    }
}

/// Apply a requested transition to a tracked record, with logging and metrics.
///
/// Runs inside the store's write lock; on any error nothing was written.
pub(crate) fn apply_transition<S: Lifecycle>(
    tracked: &mut Tracked<S>,
    to: S,
    caller: &CallerIdentity,
    description: Option<String>,
    actor: Option<HistoryActor>,
) -> Result<S, AppError> {
    let description = description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Statut changé en {to}"));

    match tracked.transition(to, caller.role, &description, actor) {
        Ok(from) => {
            record_transition(S::KIND, to.as_str());
            tracing::info!(
                reference = %tracked.reference(),
                from = %from,
                to = %to,
                role = %caller.role,
                "status changed"
            );
            Ok(from)
        }
        Err(err) => {
            if let TrackedError::Illegal(ref illegal) = err {
                record_rejection(S::KIND, illegal.reason);
            }
            tracing::warn!(
                reference = %tracked.reference(),
                from = %tracked.status(),
                to = %to,
                role = %caller.role,
                error = %err,
                "transition rejected"
            );
            Err(err.into())
        }
    }
}
