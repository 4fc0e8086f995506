//! # navette-api — Axum API Service for Navette
//!
//! HTTP surface over the reference codec and the status lifecycles:
//! agencies register parcels and mandates, staff move them through their
//! lifecycle, and customers follow them with the code on their receipt.
//!
//! ## API Surface
//!
//! | Prefix                | Module                 | Domain                      |
//! |-----------------------|------------------------|-----------------------------|
//! | `/v1/track/*`         | [`routes::tracking`]   | Code lookup                 |
//! | `/v1/lifecycles/*`    | [`routes::tracking`]   | Transition tables           |
//! | `/v1/parcels/*`       | [`routes::parcels`]    | Parcels (`CLS-`)            |
//! | `/v1/mandates/*`      | [`routes::mandates`]   | Mandates (`MND-`)           |
//! | `/v1/agencies`        | [`routes::agencies`]   | Agency directory            |
//! | `/v1/users`           | [`routes::users`]      | User directory              |
//! | `/v1/reports/*`       | [`routes::reports`]    | Manager reports             |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! Cors → Trace → Metrics → Auth → Handler
//! ```
//!
//! Health probes and `/metrics` sit outside the auth layer.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod issuer;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::tracking::router())
        .merge(routes::parcels::router())
        .merge(routes::mandates::router())
        .merge(routes::agencies::router())
        .merge(routes::users::router())
        .merge(routes::reports::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    // Unauthenticated probes.
    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::render));

    Router::new()
        .merge(probes)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
