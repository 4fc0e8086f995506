//! # Users API
//!
//! - `POST /v1/users` — register a user (admin)
//! - `GET /v1/users` — list users (gerant and above), optionally by role
//!
//! The returned id is the `{user_id}` part of the caller's bearer token.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use navette_core::{AgencyId, Role, UserId};

use super::known_agency;
use crate::auth::{require_role, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, UserRecord};

/// Request to register a user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub nom: String,
    pub prenom: String,
    /// `client`, `livreur`, `gerant` or `admin`.
    pub role: String,
    pub phone: Option<String>,
    pub agency_id: Option<Uuid>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        if self.nom.trim().is_empty() || self.prenom.trim().is_empty() {
            return Err("nom and prenom must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Only users with this role.
    pub role: Option<String>,
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/users", get(list_users).post(create_user))
}

/// POST /v1/users — Register a user.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserRecord),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;
    let role: Role = req.role.parse()?;
    let agency: Option<AgencyId> = known_agency(&state, req.agency_id)?;

    let record = UserRecord {
        id: UserId::new(),
        nom: req.nom.trim().to_string(),
        prenom: req.prenom.trim().to_string(),
        role,
        phone: req.phone,
        agency,
    };
    state.users.insert(record.id, record.clone());
    tracing::info!(user = %record.id, role = %role, "user registered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/users — List users.
#[utoipa::path(
    get,
    path = "/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Users", body = Vec<UserRecord>),
        (status = 403, description = "Manager role required", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    require_role(&caller, Role::Gerant)?;
    let role = query.role.as_deref().map(str::parse::<Role>).transpose()?;
    let mut users: Vec<UserRecord> = state
        .users
        .list()
        .into_iter()
        .filter(|u| role.map_or(true, |r| u.role == r))
        .collect();
    users.sort_by(|a, b| (&a.nom, &a.prenom).cmp(&(&b.nom, &b.prenom)));
    Ok(Json(users))
}
