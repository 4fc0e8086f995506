//! # Mandates API
//!
//! Administrative-document errands. Same surface as parcels:
//!
//! - `POST /v1/mandates` — open a mandate
//! - `GET /v1/mandates` — list visible mandates
//! - `GET /v1/mandates/{code}` — get a mandate
//! - `POST /v1/mandates/{code}/transitions` — request a status change
//! - `POST /v1/mandates/{code}/courier` — assign a courier

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use navette_core::{EntityKind, Role};
use navette_state::{Lifecycle, Mandate, MandateDetails, MandateStatus};

use super::{
    apply_transition, history_view, known_agency, payment_method, registered_courier,
    status_filter, AssignCourierRequest, HistoryEntryView, ListQuery, PartyBody,
    TransitionRequest,
};
use crate::auth::{require_role, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, normalize_code, Validate};
use crate::state::AppState;

/// Request to open a mandate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMandateRequest {
    pub requester: PartyBody,
    /// e.g. "Extrait d'acte de naissance".
    pub document_type: String,
    /// e.g. "Mairie de Cocody".
    pub administration: String,
    pub tariff_fcfa: u64,
    pub payment_method: Option<String>,
    pub agency: Option<Uuid>,
}

impl Validate for CreateMandateRequest {
    fn validate(&self) -> Result<(), String> {
        if self.document_type.trim().is_empty() {
            return Err("document_type must not be empty".to_string());
        }
        if self.administration.trim().is_empty() {
            return Err("administration must not be empty".to_string());
        }
        if self.tariff_fcfa == 0 {
            return Err("tariff_fcfa must be positive".to_string());
        }
        Ok(())
    }
}

/// A mandate as seen by the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct MandateView {
    /// Canonical `MND-YYYY-NNNNNN` code.
    pub reference: String,
    pub status: String,
    pub terminal: bool,
    pub allowed_actions: Vec<String>,
    pub requester: PartyBody,
    pub document_type: String,
    pub administration: String,
    pub tariff_fcfa: u64,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Uuid>,
    pub history: Vec<HistoryEntryView>,
    pub created_at: String,
    pub updated_at: String,
}

impl MandateView {
    fn new(mandate: &Mandate, caller: &CallerIdentity) -> Self {
        let tracking = &mandate.tracking;
        Self {
            reference: mandate.reference().to_string(),
            status: mandate.status().as_str().to_string(),
            terminal: mandate.status().is_terminal(),
            allowed_actions: tracking
                .allowed_actions(caller.role)
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            requester: PartyBody::from(&mandate.requester),
            document_type: mandate.document_type.clone(),
            administration: mandate.administration.clone(),
            tariff_fcfa: mandate.tariff_fcfa,
            payment_method: mandate.payment_method.to_string(),
            agency: mandate.agency.map(|a| *a.as_uuid()),
            courier: mandate.courier().map(|u| *u.as_uuid()),
            owner: mandate.owner.map(|u| *u.as_uuid()),
            history: history_view(tracking),
            created_at: tracking.created_at().to_iso8601(),
            updated_at: tracking.updated_at().to_iso8601(),
        }
    }
}

/// Build the mandates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/mandates", get(list_mandates).post(create_mandate))
        .route("/v1/mandates/{code}", get(get_mandate))
        .route("/v1/mandates/{code}/transitions", post(transition_mandate))
        .route("/v1/mandates/{code}/courier", post(assign_mandate_courier))
}

/// POST /v1/mandates — Open a mandate in `en_attente`.
#[utoipa::path(
    post,
    path = "/v1/mandates",
    request_body = CreateMandateRequest,
    responses(
        (status = 201, description = "Mandate opened", body = MandateView),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn create_mandate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateMandateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MandateView>), AppError> {
    let req = extract_validated_json(body)?;
    let details = MandateDetails {
        requester: req.requester.into(),
        document_type: req.document_type,
        administration: req.administration,
        tariff_fcfa: req.tariff_fcfa,
        payment_method: payment_method(req.payment_method.as_deref())?,
        agency: known_agency(&state, req.agency)?,
    };
    details.requester.validate()?;

    let reference = state.issuer.issue(EntityKind::Mandate)?;
    let actor = state.actor_for(&caller)?;
    let mandate = Mandate::open(reference.clone(), details, caller.user_id, actor)?;

    tracing::info!(reference = %reference, role = %caller.role, "mandate opened");
    let view = MandateView::new(&mandate, &caller);
    state.mandates.insert(reference, mandate);
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /v1/mandates — List the mandates visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/mandates",
    params(ListQuery),
    responses(
        (status = 200, description = "Visible mandates", body = Vec<MandateView>),
        (status = 422, description = "Unknown status filter", body = crate::error::ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn list_mandates(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MandateView>>, AppError> {
    let filter = status_filter::<MandateStatus>(query.status.as_deref())?;
    let mut mandates: Vec<Mandate> = state
        .mandates
        .list()
        .into_iter()
        .filter(|m| caller.can_see(m) && filter.map_or(true, |s| m.status() == s))
        .collect();
    mandates.sort_by(|a, b| a.reference().cmp(b.reference()));
    Ok(Json(
        mandates.iter().map(|m| MandateView::new(m, &caller)).collect(),
    ))
}

/// GET /v1/mandates/{code} — Get a mandate.
#[utoipa::path(
    get,
    path = "/v1/mandates/{code}",
    params(("code" = String, Path, description = "Mandate code, full or short form")),
    responses(
        (status = 200, description = "Mandate found", body = MandateView),
        (status = 403, description = "Not visible to the caller", body = crate::error::ErrorBody),
        (status = 404, description = "Mandate not found", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed code", body = crate::error::ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn get_mandate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
) -> Result<Json<MandateView>, AppError> {
    let reference = normalize_code(&code)?;
    let mandate = state
        .mandates
        .get(&reference)
        .ok_or_else(|| AppError::NotFound(format!("mandate {reference} not found")))?;
    if !caller.can_see(&mandate) {
        return Err(AppError::Forbidden(format!("mandate {reference} is not visible to caller")));
    }
    Ok(Json(MandateView::new(&mandate, &caller)))
}

/// POST /v1/mandates/{code}/transitions — Request a status change.
#[utoipa::path(
    post,
    path = "/v1/mandates/{code}/transitions",
    params(("code" = String, Path, description = "Mandate code")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Status changed", body = MandateView),
        (status = 403, description = "Role may not perform this transition", body = crate::error::ErrorBody),
        (status = 404, description = "Mandate not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed from current status", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown status or malformed code", body = crate::error::ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn transition_mandate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
    body: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<Json<MandateView>, AppError> {
    let reference = normalize_code(&code)?;
    let req = extract_validated_json(body)?;
    let to: MandateStatus = req.to.parse()?;
    let actor = state.actor_for(&caller)?;

    let mandate = state
        .mandates
        .try_update(&reference, |mandate| {
            if !caller.can_see(mandate) {
                return Err(AppError::Forbidden(format!(
                    "mandate {reference} is not visible to caller"
                )));
            }
            apply_transition(&mut mandate.tracking, to, &caller, req.description, actor)?;
            Ok(mandate.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("mandate {reference} not found")))??;

    Ok(Json(MandateView::new(&mandate, &caller)))
}

/// POST /v1/mandates/{code}/courier — Assign a courier.
#[utoipa::path(
    post,
    path = "/v1/mandates/{code}/courier",
    params(("code" = String, Path, description = "Mandate code")),
    request_body = AssignCourierRequest,
    responses(
        (status = 200, description = "Courier assigned", body = MandateView),
        (status = 403, description = "Manager role required", body = crate::error::ErrorBody),
        (status = 404, description = "Mandate not found", body = crate::error::ErrorBody),
        (status = 409, description = "Mandate is closed", body = crate::error::ErrorBody),
        (status = 422, description = "Courier is not a registered livreur", body = crate::error::ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn assign_mandate_courier(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
    body: Result<Json<AssignCourierRequest>, JsonRejection>,
) -> Result<Json<MandateView>, AppError> {
    require_role(&caller, Role::Gerant)?;
    let reference = normalize_code(&code)?;
    let req = extract_json(body)?;
    let courier = registered_courier(&state, req.courier_id)?;

    let mandate = state
        .mandates
        .try_update(&reference, |mandate| {
            mandate.assign_courier(courier)?;
            Ok::<_, AppError>(mandate.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("mandate {reference} not found")))??;

    tracing::info!(reference = %reference, courier = %courier, "courier assigned");
    Ok(Json(MandateView::new(&mandate, &caller)))
}
