//! # Tracking API
//!
//! - `GET /v1/track/{code}` — look up any code typed by a customer
//! - `GET /v1/lifecycles/{kind}` — the transition table of `parcel` or `mandate`
//!
//! Tracking is open to every authenticated caller: knowing the code is
//! what entitles someone to follow a shipment.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use navette_core::{EntityKind, Role};
use navette_state::{describe_kind, Lifecycle, MandateStatus, ParcelStatus, Tracked};

use super::{history_view, HistoryEntryView};
use crate::error::AppError;
use crate::extractors::normalize_code;
use crate::state::AppState;

/// Public tracking view.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingView {
    pub reference: String,
    /// `parcel` or `mandate`.
    pub kind: String,
    pub status: String,
    pub terminal: bool,
    pub history: Vec<HistoryEntryView>,
}

impl TrackingView {
    fn new<S: Lifecycle>(tracked: &Tracked<S>) -> Self {
        Self {
            reference: tracked.reference().to_string(),
            kind: S::KIND.to_string(),
            status: tracked.status().as_str().to_string(),
            terminal: tracked.is_closed(),
            history: history_view(tracked),
        }
    }
}

/// One status of a lifecycle.
#[derive(Debug, Serialize, ToSchema)]
pub struct LifecycleRowView {
    pub status: String,
    pub terminal: bool,
    pub next: Vec<String>,
    pub roles: Vec<String>,
}

/// A lifecycle's full transition table.
#[derive(Debug, Serialize, ToSchema)]
pub struct LifecycleView {
    pub kind: String,
    pub initial: String,
    pub statuses: Vec<LifecycleRowView>,
}

/// Build the tracking router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/track/{code}", get(track))
        .route("/v1/lifecycles/{kind}", get(lifecycle))
}

/// GET /v1/track/{code} — Track a parcel or mandate.
#[utoipa::path(
    get,
    path = "/v1/track/{code}",
    params(("code" = String, Path, description = "Code as typed, e.g. `cls-42` or `SHP-2025-000123`")),
    responses(
        (status = 200, description = "Record found", body = TrackingView),
        (status = 404, description = "No record with this code", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed code; `details.kind` names the failure", body = crate::error::ErrorBody),
    ),
    tag = "tracking"
)]
pub async fn track(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<TrackingView>, AppError> {
    let reference = normalize_code(&code)?;
    let view = match reference.kind() {
        EntityKind::Parcel => state
            .parcels
            .get(&reference)
            .map(|p| TrackingView::new(&p.tracking)),
        EntityKind::Mandate => state
            .mandates
            .get(&reference)
            .map(|m| TrackingView::new(&m.tracking)),
    };
    view.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no record with code {reference}")))
}

/// GET /v1/lifecycles/{kind} — Transition table.
#[utoipa::path(
    get,
    path = "/v1/lifecycles/{kind}",
    params(("kind" = String, Path, description = "`parcel` or `mandate`")),
    responses(
        (status = 200, description = "Transition table", body = LifecycleView),
        (status = 422, description = "Unknown kind", body = crate::error::ErrorBody),
    ),
    tag = "tracking"
)]
pub async fn lifecycle(Path(kind): Path<String>) -> Result<Json<LifecycleView>, AppError> {
    let kind: EntityKind = kind.parse()?;
    let initial = match kind {
        EntityKind::Parcel => ParcelStatus::INITIAL.as_str(),
        EntityKind::Mandate => MandateStatus::INITIAL.as_str(),
    };
    let statuses = describe_kind(kind)
        .into_iter()
        .map(|row| LifecycleRowView {
            status: row.status.to_string(),
            terminal: row.terminal,
            next: row.next.iter().map(|s| s.to_string()).collect(),
            roles: row.roles.iter().map(Role::to_string).collect(),
        })
        .collect();
    Ok(Json(LifecycleView {
        kind: kind.to_string(),
        initial: initial.to_string(),
        statuses,
    }))
}
