//! # Parcels API
//!
//! ## Endpoints
//!
//! - `POST /v1/parcels` — register a parcel
//! - `GET /v1/parcels` — list visible parcels
//! - `GET /v1/parcels/{code}` — get a parcel
//! - `POST /v1/parcels/{code}/transitions` — request a status change
//! - `POST /v1/parcels/{code}/courier` — assign a courier

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use navette_core::{EntityKind, Role};
use navette_state::{Lifecycle, Parcel, ParcelDetails, ParcelStatus};

use super::{
    apply_transition, history_view, known_agency, payment_method, registered_courier,
    status_filter, AssignCourierRequest, HistoryEntryView, ListQuery, PartyBody,
    TransitionRequest,
};
use crate::auth::{require_role, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, normalize_code, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to register a parcel.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateParcelRequest {
    pub sender: PartyBody,
    pub recipient: PartyBody,
    /// Description of the contents.
    pub contents: String,
    pub weight_grams: Option<u32>,
    /// Tariff in CFA francs.
    pub tariff_fcfa: u64,
    /// `especes`, `orange_money`, `wave`, `mtn_momo` or `moov_money`. Defaults to `especes`.
    pub payment_method: Option<String>,
    pub origin_agency: Option<Uuid>,
    pub destination_agency: Option<Uuid>,
}

impl Validate for CreateParcelRequest {
    fn validate(&self) -> Result<(), String> {
        if self.contents.trim().is_empty() {
            return Err("contents must not be empty".to_string());
        }
        if self.tariff_fcfa == 0 {
            return Err("tariff_fcfa must be positive".to_string());
        }
        if self.weight_grams == Some(0) {
            return Err("weight_grams must be positive when given".to_string());
        }
        Ok(())
    }
}

/// A parcel as seen by the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParcelView {
    /// Canonical `CLS-YYYY-NNNNNN` code.
    pub reference: String,
    pub status: String,
    pub terminal: bool,
    /// Statuses the caller may move the parcel to.
    pub allowed_actions: Vec<String>,
    pub sender: PartyBody,
    pub recipient: PartyBody,
    pub contents: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<u32>,
    pub tariff_fcfa: u64,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_agency: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_agency: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Uuid>,
    pub history: Vec<HistoryEntryView>,
    pub created_at: String,
    pub updated_at: String,
}

impl ParcelView {
    fn new(parcel: &Parcel, caller: &CallerIdentity) -> Self {
        let tracking = &parcel.tracking;
        Self {
            reference: parcel.reference().to_string(),
            status: parcel.status().as_str().to_string(),
            terminal: parcel.status().is_terminal(),
            allowed_actions: tracking
                .allowed_actions(caller.role)
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            sender: PartyBody::from(&parcel.sender),
            recipient: PartyBody::from(&parcel.recipient),
            contents: parcel.contents.clone(),
            weight_grams: parcel.weight_grams,
            tariff_fcfa: parcel.tariff_fcfa,
            payment_method: parcel.payment_method.to_string(),
            origin_agency: parcel.origin_agency.map(|a| *a.as_uuid()),
            destination_agency: parcel.destination_agency.map(|a| *a.as_uuid()),
            courier: parcel.courier().map(|u| *u.as_uuid()),
            owner: parcel.owner.map(|u| *u.as_uuid()),
            history: history_view(tracking),
            created_at: tracking.created_at().to_iso8601(),
            updated_at: tracking.updated_at().to_iso8601(),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the parcels router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/parcels", get(list_parcels).post(create_parcel))
        .route("/v1/parcels/{code}", get(get_parcel))
        .route("/v1/parcels/{code}/transitions", post(transition_parcel))
        .route("/v1/parcels/{code}/courier", post(assign_parcel_courier))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/parcels — Register a parcel in `en_attente`.
#[utoipa::path(
    post,
    path = "/v1/parcels",
    request_body = CreateParcelRequest,
    responses(
        (status = 201, description = "Parcel registered", body = ParcelView),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "parcels"
)]
pub async fn create_parcel(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateParcelRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ParcelView>), AppError> {
    let req = extract_validated_json(body)?;
    let details = ParcelDetails {
        sender: req.sender.into(),
        recipient: req.recipient.into(),
        contents: req.contents,
        weight_grams: req.weight_grams,
        tariff_fcfa: req.tariff_fcfa,
        payment_method: payment_method(req.payment_method.as_deref())?,
        origin_agency: known_agency(&state, req.origin_agency)?,
        destination_agency: known_agency(&state, req.destination_agency)?,
    };
    details.sender.validate()?;
    details.recipient.validate()?;

    let reference = state.issuer.issue(EntityKind::Parcel)?;
    let actor = state.actor_for(&caller)?;
    let parcel = Parcel::register(reference.clone(), details, caller.user_id, actor)?;

    tracing::info!(reference = %reference, role = %caller.role, "parcel registered");
    let view = ParcelView::new(&parcel, &caller);
    state.parcels.insert(reference, parcel);
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /v1/parcels — List the parcels visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/parcels",
    params(ListQuery),
    responses(
        (status = 200, description = "Visible parcels, oldest first", body = Vec<ParcelView>),
        (status = 422, description = "Unknown status filter", body = crate::error::ErrorBody),
    ),
    tag = "parcels"
)]
pub async fn list_parcels(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ParcelView>>, AppError> {
    let filter = status_filter::<ParcelStatus>(query.status.as_deref())?;
    let mut parcels: Vec<Parcel> = state
        .parcels
        .list()
        .into_iter()
        .filter(|p| caller.can_see(p))
        .filter(|p| filter.map_or(true, |s| p.status() == s))
        .collect();
    parcels.sort_by(|a, b| a.reference().cmp(b.reference()));
    Ok(Json(
        parcels.iter().map(|p| ParcelView::new(p, &caller)).collect(),
    ))
}

/// GET /v1/parcels/{code} — Get a parcel.
#[utoipa::path(
    get,
    path = "/v1/parcels/{code}",
    params(("code" = String, Path, description = "Parcel code, full or short form")),
    responses(
        (status = 200, description = "Parcel found", body = ParcelView),
        (status = 403, description = "Not visible to the caller", body = crate::error::ErrorBody),
        (status = 404, description = "Parcel not found", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed code", body = crate::error::ErrorBody),
    ),
    tag = "parcels"
)]
pub async fn get_parcel(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
) -> Result<Json<ParcelView>, AppError> {
    let reference = normalize_code(&code)?;
    let parcel = state
        .parcels
        .get(&reference)
        .ok_or_else(|| AppError::NotFound(format!("parcel {reference} not found")))?;
    if !caller.can_see(&parcel) {
        return Err(AppError::Forbidden(format!("parcel {reference} is not visible to caller")));
    }
    Ok(Json(ParcelView::new(&parcel, &caller)))
}

/// POST /v1/parcels/{code}/transitions — Request a status change.
#[utoipa::path(
    post,
    path = "/v1/parcels/{code}/transitions",
    params(("code" = String, Path, description = "Parcel code")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Status changed", body = ParcelView),
        (status = 403, description = "Role may not perform this transition", body = crate::error::ErrorBody),
        (status = 404, description = "Parcel not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed from current status", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown status or malformed code", body = crate::error::ErrorBody),
    ),
    tag = "parcels"
)]
pub async fn transition_parcel(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
    body: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<Json<ParcelView>, AppError> {
    let reference = normalize_code(&code)?;
    let req = extract_validated_json(body)?;
    let to: ParcelStatus = req.to.parse()?;
    let actor = state.actor_for(&caller)?;

    let parcel = state
        .parcels
        .try_update(&reference, |parcel| {
            if !caller.can_see(parcel) {
                return Err(AppError::Forbidden(format!(
                    "parcel {reference} is not visible to caller"
                )));
            }
            apply_transition(&mut parcel.tracking, to, &caller, req.description, actor)?;
            Ok(parcel.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("parcel {reference} not found")))??;

    Ok(Json(ParcelView::new(&parcel, &caller)))
}

/// POST /v1/parcels/{code}/courier — Assign a courier.
#[utoipa::path(
    post,
    path = "/v1/parcels/{code}/courier",
    params(("code" = String, Path, description = "Parcel code")),
    request_body = AssignCourierRequest,
    responses(
        (status = 200, description = "Courier assigned", body = ParcelView),
        (status = 403, description = "Manager role required", body = crate::error::ErrorBody),
        (status = 404, description = "Parcel not found", body = crate::error::ErrorBody),
        (status = 409, description = "Parcel is closed", body = crate::error::ErrorBody),
        (status = 422, description = "Courier is not a registered livreur", body = crate::error::ErrorBody),
    ),
    tag = "parcels"
)]
pub async fn assign_parcel_courier(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
    body: Result<Json<AssignCourierRequest>, JsonRejection>,
) -> Result<Json<ParcelView>, AppError> {
    require_role(&caller, Role::Gerant)?;
    let reference = normalize_code(&code)?;
    let req = extract_json(body)?;
    let courier = registered_courier(&state, req.courier_id)?;

    let parcel = state
        .parcels
        .try_update(&reference, |parcel| {
            parcel.assign_courier(courier)?;
            Ok::<_, AppError>(parcel.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("parcel {reference} not found")))??;

    tracing::info!(reference = %reference, courier = %courier, "courier assigned");
    Ok(Json(ParcelView::new(&parcel, &caller)))
}
