//! # Reports API
//!
//! `GET /v1/reports/summary` — record counts per status and the share of
//! mobile-money payments, for managers.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use navette_core::{PaymentMethod, Role};
use navette_state::{Lifecycle, MandateStatus, ParcelStatus};

use crate::auth::{require_role, CallerIdentity};
use crate::error::AppError;
use crate::state::AppState;

/// Counts for one entity kind.
#[derive(Debug, Serialize, ToSchema)]
pub struct KindSummary {
    pub total: usize,
    /// Every status of the lifecycle, including those with no records.
    pub by_status: BTreeMap<String, usize>,
    /// Records not yet in a terminal status.
    pub open: usize,
    /// Fraction of records paid through a mobile-money wallet, 0.0 when empty.
    pub mobile_money_share: f64,
}

impl KindSummary {
    fn tally<S: Lifecycle>(records: impl Iterator<Item = (S, PaymentMethod)>) -> Self {
        let mut by_status: BTreeMap<String, usize> =
            S::all().iter().map(|s| (s.as_str().to_string(), 0)).collect();
        let (mut total, mut open, mut mobile) = (0usize, 0usize, 0usize);
        for (status, payment) in records {
            total += 1;
            *by_status.entry(status.as_str().to_string()).or_default() += 1;
            if !status.is_terminal() {
                open += 1;
            }
            if payment.is_mobile_money() {
                mobile += 1;
            }
        }
        let mobile_money_share = if total == 0 {
            0.0
        } else {
            mobile as f64 / total as f64
        };
        Self {
            total,
            by_status,
            open,
            mobile_money_share,
        }
    }
}

/// Activity summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryReport {
    pub parcels: KindSummary,
    pub mandates: KindSummary,
    /// ISO 8601 UTC.
    pub generated_at: String,
}

/// Build the reports router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/reports/summary", get(summary))
}

/// GET /v1/reports/summary — Counts per status.
#[utoipa::path(
    get,
    path = "/v1/reports/summary",
    responses(
        (status = 200, description = "Summary", body = SummaryReport),
        (status = 403, description = "Manager role required", body = crate::error::ErrorBody),
    ),
    tag = "reports"
)]
pub async fn summary(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<SummaryReport>, AppError> {
    require_role(&caller, Role::Gerant)?;
    let parcels = state.parcels.list();
    let mandates = state.mandates.list();
    Ok(Json(SummaryReport {
        parcels: KindSummary::tally::<ParcelStatus>(
            parcels.iter().map(|p| (p.status(), p.payment_method)),
        ),
        mandates: KindSummary::tally::<MandateStatus>(
            mandates.iter().map(|m| (m.status(), m.payment_method)),
        ),
        generated_at: navette_core::Timestamp::now().to_iso8601(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_every_status() {
        let summary = KindSummary::tally::<ParcelStatus>(
            [
                (ParcelStatus::EnAttente, PaymentMethod::Wave),
                (ParcelStatus::Livre, PaymentMethod::Especes),
                (ParcelStatus::Livre, PaymentMethod::OrangeMoney),
                (ParcelStatus::Annule, PaymentMethod::Especes),
            ]
            .into_iter(),
        );
        assert_eq!(summary.total, 4);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.by_status["livre"], 2);
        assert_eq!(summary.by_status["en_transit"], 0);
        assert_eq!(summary.by_status.len(), ParcelStatus::all().len());
        assert!((summary.mobile_money_share - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_tally() {
        let summary = KindSummary::tally::<MandateStatus>(std::iter::empty());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mobile_money_share, 0.0);
    }
}
