//! # Agencies API
//!
//! - `POST /v1/agencies` — register an agency (admin)
//! - `GET /v1/agencies` — list agencies

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use navette_core::{AgencyId, Role, UserId};

use crate::auth::{require_role, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AgencyRecord, AppState};

/// Request to register an agency.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAgencyRequest {
    pub name: String,
    pub city: String,
    pub address: Option<String>,
    /// A registered user with the `gerant` role.
    pub manager_id: Option<Uuid>,
}

impl Validate for CreateAgencyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.city.trim().is_empty() {
            return Err("city must not be empty".to_string());
        }
        Ok(())
    }
}

/// Build the agencies router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/agencies", get(list_agencies).post(create_agency))
}

/// POST /v1/agencies — Register an agency.
#[utoipa::path(
    post,
    path = "/v1/agencies",
    request_body = CreateAgencyRequest,
    responses(
        (status = 201, description = "Agency registered", body = AgencyRecord),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "agencies"
)]
pub async fn create_agency(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateAgencyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AgencyRecord>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;

    let manager = match req.manager_id.map(UserId::from_uuid) {
        Some(id) => match state.users.get(&id) {
            Some(user) if user.role == Role::Gerant => Some(id),
            Some(_) => return Err(AppError::Validation(format!("user {id} is not a gerant"))),
            None => return Err(AppError::Validation(format!("unknown user {id}"))),
        },
        None => None,
    };

    let record = AgencyRecord {
        id: AgencyId::new(),
        name: req.name.trim().to_string(),
        city: req.city.trim().to_string(),
        address: req.address,
        manager,
    };
    state.agencies.insert(record.id, record.clone());
    tracing::info!(agency = %record.id, city = %record.city, "agency registered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/agencies — List agencies by city then name.
#[utoipa::path(
    get,
    path = "/v1/agencies",
    responses(
        (status = 200, description = "Agencies", body = Vec<AgencyRecord>),
    ),
    tag = "agencies"
)]
pub async fn list_agencies(State(state): State<AppState>) -> Json<Vec<AgencyRecord>> {
    let mut agencies = state.agencies.list();
    agencies.sort_by(|a, b| (&a.city, &a.name).cmp(&(&b.city, &b.name)));
    Json(agencies)
}
