//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Navette API",
        version = "0.1.0",
        description = "Parcel and administrative-mandate tracking for a network of agencies: reference codes, role-gated status changes, agency and user directories.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Tracking
        crate::routes::tracking::track,
        crate::routes::tracking::lifecycle,
        // Parcels
        crate::routes::parcels::create_parcel,
        crate::routes::parcels::list_parcels,
        crate::routes::parcels::get_parcel,
        crate::routes::parcels::transition_parcel,
        crate::routes::parcels::assign_parcel_courier,
        // Mandates
        crate::routes::mandates::create_mandate,
        crate::routes::mandates::list_mandates,
        crate::routes::mandates::get_mandate,
        crate::routes::mandates::transition_mandate,
        crate::routes::mandates::assign_mandate_courier,
        // Directories
        crate::routes::agencies::create_agency,
        crate::routes::agencies::list_agencies,
        crate::routes::users::create_user,
        crate::routes::users::list_users,
        // Reports
        crate::routes::reports::summary,
    ),
    components(schemas(
        crate::state::UserRecord,
        crate::state::AgencyRecord,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::PartyBody,
        crate::routes::ActorView,
        crate::routes::HistoryEntryView,
        crate::routes::TransitionRequest,
        crate::routes::AssignCourierRequest,
        crate::routes::tracking::TrackingView,
        crate::routes::tracking::LifecycleView,
        crate::routes::tracking::LifecycleRowView,
        crate::routes::parcels::CreateParcelRequest,
        crate::routes::parcels::ParcelView,
        crate::routes::mandates::CreateMandateRequest,
        crate::routes::mandates::MandateView,
        crate::routes::agencies::CreateAgencyRequest,
        crate::routes::users::CreateUserRequest,
        crate::routes::reports::KindSummary,
        crate::routes::reports::SummaryReport,
    )),
    tags(
        (name = "tracking", description = "Code lookup and lifecycle tables"),
        (name = "parcels", description = "Parcels (CLS codes)"),
        (name = "mandates", description = "Administrative-document mandates (MND codes)"),
        (name = "agencies", description = "Agency directory"),
        (name = "users", description = "User directory"),
        (name = "reports", description = "Activity reports"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/v1/track/{code}",
            "/v1/lifecycles/{kind}",
            "/v1/parcels",
            "/v1/parcels/{code}",
            "/v1/parcels/{code}/transitions",
            "/v1/parcels/{code}/courier",
            "/v1/mandates",
            "/v1/mandates/{code}",
            "/v1/mandates/{code}/transitions",
            "/v1/mandates/{code}/courier",
            "/v1/agencies",
            "/v1/users",
            "/v1/reports/summary",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
