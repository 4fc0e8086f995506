//! Integration tests for the navette-api HTTP surface.
//!
//! Each test builds a fresh in-memory application and drives it with
//! `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use navette_api::state::{AppConfig, AppState};

const SECRET: &str = "test-secret";

fn test_app() -> Router {
    navette_api::app(AppState::new())
}

fn test_app_with_auth(token: &str) -> Router {
    let config = AppConfig {
        auth_token: Some(token.to_string()),
        ..AppConfig::default()
    };
    navette_api::app(AppState::with_config(config))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn bearer(role: &str, user: Option<Uuid>) -> String {
    let user = user.map(|u| u.to_string()).unwrap_or_default();
    format!("Bearer {role}:{user}:{SECRET}")
}

async fn send(app: &Router, method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

fn parcel_body() -> Value {
    json!({
        "sender": { "name": "Aminata Koné", "phone": "+225 07 08 09 10 11" },
        "recipient": { "name": "Moussa Traoré", "phone": "0102030405", "address": "Yopougon, près du marché" },
        "contents": "Pagnes wax",
        "weight_grams": 1200,
        "tariff_fcfa": 2500,
        "payment_method": "wave"
    })
}

fn mandate_body() -> Value {
    json!({
        "requester": { "name": "Fatou Diallo", "phone": "+221 77 123 45 67" },
        "document_type": "Extrait d'acte de naissance",
        "administration": "Mairie de Cocody",
        "tariff_fcfa": 5000
    })
}

async fn register_user(app: &Router, auth: Option<&str>, role: &str) -> Uuid {
    let response = send(
        app,
        "POST",
        "/v1/users",
        auth,
        Some(json!({ "nom": "Bamba", "prenom": "Yao", "role": role })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["id"].as_str().unwrap().parse().unwrap()
}

// -- Health probes -------------------------------------------------------------

#[tokio::test]
async fn health_probes_answer_without_credentials() {
    let app = test_app_with_auth(SECRET);
    let live = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(body_string(live).await, "ok");

    let ready = send(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(body_string(ready).await, "ready");
}

#[tokio::test]
async fn metrics_without_recorder_is_not_found() {
    let response = send(&test_app(), "GET", "/metrics", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Parcels -------------------------------------------------------------------

#[tokio::test]
async fn parcel_counter_to_door() {
    let app = test_app();
    let courier = register_user(&app, None, "livreur").await;

    let response = send(&app, "POST", "/v1/parcels", None, Some(parcel_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let parcel = body_json(response).await;
    let code = parcel["reference"].as_str().unwrap().to_string();
    assert!(code.starts_with("CLS-"));
    assert!(code.ends_with("-000001"));
    assert_eq!(parcel["status"], "en_attente");
    assert_eq!(parcel["payment_method"], "wave");
    assert_eq!(parcel["history"].as_array().unwrap().len(), 1);
    assert_eq!(parcel["history"][0]["statut"], "en_attente");

    let assigned = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/courier"),
        None,
        Some(json!({ "courier_id": courier })),
    )
    .await;
    assert_eq!(assigned.status(), StatusCode::OK);

    for to in ["pris_en_charge", "en_livraison", "livre"] {
        let response = send(
            &app,
            "POST",
            &format!("/v1/parcels/{code}/transitions"),
            None,
            Some(json!({ "to": to })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "transition to {to}");
    }

    // The short form the customer types resolves to the same record.
    let serial = code.rsplit('-').next().unwrap().trim_start_matches('0');
    let tracked = send(&app, "GET", &format!("/v1/track/cls-{serial}"), None, None).await;
    assert_eq!(tracked.status(), StatusCode::OK);
    let tracked = body_json(tracked).await;
    assert_eq!(tracked["reference"], code.as_str());
    assert_eq!(tracked["kind"], "parcel");
    assert_eq!(tracked["status"], "livre");
    assert_eq!(tracked["terminal"], true);
    let history = tracked["history"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2]["description"], "Statut changé en en_livraison");
}

#[tokio::test]
async fn delivered_parcel_is_locked() {
    let app = test_app();
    let response = send(&app, "POST", "/v1/parcels", None, Some(parcel_body())).await;
    let code = body_json(response).await["reference"].as_str().unwrap().to_string();

    let cancel = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/transitions"),
        None,
        Some(json!({ "to": "annule", "description": "Client injoignable" })),
    )
    .await;
    assert_eq!(cancel.status(), StatusCode::OK);
    let body = body_json(cancel).await;
    assert_eq!(body["terminal"], true);
    assert_eq!(body["allowed_actions"], json!([]));

    let again = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/transitions"),
        None,
        Some(json!({ "to": "pris_en_charge" })),
    )
    .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    let body = body_json(again).await;
    assert_eq!(body["error"]["code"], "ILLEGAL_TRANSITION");
    assert_eq!(body["error"]["details"]["reason"], "terminal");
}

#[tokio::test]
async fn skipping_a_step_is_a_conflict() {
    let app = test_app();
    let response = send(&app, "POST", "/v1/parcels", None, Some(parcel_body())).await;
    let code = body_json(response).await["reference"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/transitions"),
        None,
        Some(json!({ "to": "livre" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["details"]["from"], "en_attente");
    assert_eq!(body["error"]["details"]["to"], "livre");
    assert_eq!(body["error"]["details"]["reason"], "not_allowed");
}

#[tokio::test]
async fn legacy_status_tag_is_accepted() {
    let app = test_app();
    let response = send(&app, "POST", "/v1/parcels", None, Some(parcel_body())).await;
    let code = body_json(response).await["reference"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/transitions"),
        None,
        Some(json!({ "to": "en_preparation" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "pris_en_charge");
}

#[tokio::test]
async fn unknown_status_is_unprocessable() {
    let app = test_app();
    let response = send(&app, "POST", "/v1/parcels", None, Some(parcel_body())).await;
    let code = body_json(response).await["reference"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/transitions"),
        None,
        Some(json!({ "to": "perdu" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_party_is_rejected() {
    let mut body = parcel_body();
    body["recipient"]["phone"] = json!("12");
    let response = send(&test_app(), "POST", "/v1/parcels", None, Some(body)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/parcels")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn courier_must_be_a_livreur() {
    let app = test_app();
    let manager = register_user(&app, None, "gerant").await;
    let response = send(&app, "POST", "/v1/parcels", None, Some(parcel_body())).await;
    let code = body_json(response).await["reference"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/courier"),
        None,
        Some(json!({ "courier_id": manager })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Tracking ------------------------------------------------------------------

#[tokio::test]
async fn malformed_code_reports_its_kind() {
    let app = test_app();
    for (code, kind) in [
        ("XYZ-2025-000001", "InvalidPrefix"),
        ("CLS-1999-000001", "InvalidYear"),
        ("colis", "InvalidFormat"),
    ] {
        let response = send(&app, "GET", &format!("/v1/track/{code}"), None, None).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{code}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_REFERENCE");
        assert_eq!(body["error"]["details"]["kind"], kind, "{code}");
    }
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let response = send(&test_app(), "GET", "/v1/track/MND-42", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shipment_alias_finds_the_parcel() {
    let app = test_app();
    let response = send(&app, "POST", "/v1/parcels", None, Some(parcel_body())).await;
    let code = body_json(response).await["reference"].as_str().unwrap().to_string();
    let shp = code.replacen("CLS", "SHP", 1);

    let response = send(&app, "GET", &format!("/v1/parcels/{shp}"), None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["reference"], code.as_str());
}

#[tokio::test]
async fn lifecycle_tables() {
    let app = test_app();
    let response = send(&app, "GET", "/v1/lifecycles/parcel", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "parcel");
    assert_eq!(body["initial"], "en_attente");
    let waiting = body["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["status"] == "en_attente")
        .unwrap();
    assert_eq!(waiting["next"], json!(["pris_en_charge", "annule"]));
    assert_eq!(waiting["terminal"], false);

    let response = send(&app, "GET", "/v1/lifecycles/mandate", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/v1/lifecycles/camion", None, None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Mandates ------------------------------------------------------------------

#[tokio::test]
async fn mandate_errand_and_kind_separation() {
    let app = test_app();
    let response = send(&app, "POST", "/v1/mandates", None, Some(mandate_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let mandate = body_json(response).await;
    let code = mandate["reference"].as_str().unwrap().to_string();
    assert!(code.starts_with("MND-"));
    assert_eq!(mandate["payment_method"], "especes");

    let response = send(
        &app,
        "POST",
        &format!("/v1/mandates/{code}/transitions"),
        None,
        Some(json!({ "to": "documents_verifies" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A parcel code never resolves to a mandate record.
    let parcel_code = code.replacen("MND", "CLS", 1);
    let response = send(&app, "GET", &format!("/v1/mandates/{parcel_code}"), None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Authentication and roles --------------------------------------------------

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = test_app_with_auth(SECRET);
    let response = send(&app, "GET", "/v1/parcels", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, "GET", "/v1/parcels", Some("Bearer wrong"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn openapi_requires_auth() {
    let app = test_app_with_auth(SECRET);
    let response = send(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let auth = format!("Bearer {SECRET}");
    let response = send(&app, "GET", "/openapi.json", Some(&auth), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/v1/parcels/{code}/transitions"].is_object());
}

#[tokio::test]
async fn token_role_must_match_registered_role() {
    let app = test_app_with_auth(SECRET);
    let admin = format!("Bearer {SECRET}");
    let courier = register_user(&app, Some(&admin), "livreur").await;
    let manager = register_user(&app, Some(&admin), "gerant").await;

    let response = send(&app, "POST", "/v1/parcels", Some(&admin), Some(parcel_body())).await;
    let code = body_json(response).await["reference"].as_str().unwrap().to_string();
    let uri = format!("/v1/parcels/{code}/transitions");

    // A registered livreur presenting a gerant token.
    let response = send(
        &app,
        "POST",
        &uri,
        Some(&bearer("gerant", Some(courier))),
        Some(json!({ "to": "pris_en_charge" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, "GET", &format!("/v1/parcels/{code}"), Some(&admin), None).await;
    let parcel = body_json(response).await;
    assert_eq!(parcel["status"], "en_attente");
    assert_eq!(parcel["history"].as_array().unwrap().len(), 1);

    let response = send(
        &app,
        "POST",
        &uri,
        Some(&bearer("gerant", Some(manager))),
        Some(json!({ "to": "pris_en_charge" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let parcel = body_json(response).await;
    let last = parcel["history"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["statut"], "pris_en_charge");
    assert_eq!(last["utilisateur"]["role"], "gerant");
    assert_eq!(last["utilisateur"]["id"], manager.to_string());
}

#[tokio::test]
async fn roles_gate_transitions() {
    let app = test_app_with_auth(SECRET);
    let admin = format!("Bearer {SECRET}");
    let courier = register_user(&app, Some(&admin), "livreur").await;
    let client = register_user(&app, Some(&admin), "client").await;
    let courier_auth = bearer("livreur", Some(courier));
    let manager_auth = bearer("gerant", None);
    let client_auth = bearer("client", Some(client));

    let response = send(&app, "POST", "/v1/parcels", Some(&client_auth), Some(parcel_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let parcel = body_json(response).await;
    let code = parcel["reference"].as_str().unwrap().to_string();
    assert_eq!(parcel["owner"], client.to_string());
    assert_eq!(parcel["allowed_actions"], json!([]));

    // A client cannot move the parcel.
    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/transitions"),
        Some(&client_auth),
        Some(json!({ "to": "annule" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "TRANSITION_FORBIDDEN");
    assert_eq!(body["error"]["details"]["reason"], "role_not_permitted");

    // An unassigned courier does not see it.
    let response = send(&app, "GET", &format!("/v1/parcels/{code}"), Some(&courier_auth), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Only managers assign couriers.
    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/courier"),
        Some(&courier_auth),
        Some(json!({ "courier_id": courier })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/courier"),
        Some(&manager_auth),
        Some(json!({ "courier_id": courier })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The courier may not take it in while it waits at the counter.
    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/transitions"),
        Some(&courier_auth),
        Some(json!({ "to": "pris_en_charge" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        "POST",
        &format!("/v1/parcels/{code}/transitions"),
        Some(&manager_auth),
        Some(json!({ "to": "pris_en_charge" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    for to in ["en_livraison", "livre"] {
        let response = send(
            &app,
            "POST",
            &format!("/v1/parcels/{code}/transitions"),
            Some(&courier_auth),
            Some(json!({ "to": to })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "courier to {to}");
    }

    // The history names the registered courier.
    let response = send(&app, "GET", &format!("/v1/parcels/{code}"), Some(&client_auth), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let last = body["history"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["statut"], "livre");
    assert_eq!(last["utilisateur"]["role"], "livreur");
    assert_eq!(last["utilisateur"]["id"], courier.to_string());
}

#[tokio::test]
async fn lists_are_scoped_to_the_caller() {
    let app = test_app_with_auth(SECRET);
    let admin = format!("Bearer {SECRET}");
    let alice = register_user(&app, Some(&admin), "client").await;
    let bob = register_user(&app, Some(&admin), "client").await;

    for owner in [alice, alice, bob] {
        let auth = bearer("client", Some(owner));
        let response = send(&app, "POST", "/v1/parcels", Some(&auth), Some(parcel_body())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let alice_list = body_json(send(&app, "GET", "/v1/parcels", Some(&bearer("client", Some(alice))), None).await).await;
    assert_eq!(alice_list.as_array().unwrap().len(), 2);

    let manager_list = body_json(send(&app, "GET", "/v1/parcels", Some(&bearer("gerant", None)), None).await).await;
    assert_eq!(manager_list.as_array().unwrap().len(), 3);

    let waiting = body_json(
        send(&app, "GET", "/v1/parcels?status=en_attente", Some(&admin), None).await,
    )
    .await;
    assert_eq!(waiting.as_array().unwrap().len(), 3);
    let delivered = body_json(send(&app, "GET", "/v1/parcels?status=livre", Some(&admin), None).await).await;
    assert!(delivered.as_array().unwrap().is_empty());
}

// -- Directories and reports ---------------------------------------------------

#[tokio::test]
async fn directories_require_the_right_role() {
    let app = test_app_with_auth(SECRET);
    let admin = format!("Bearer {SECRET}");
    let manager = register_user(&app, Some(&admin), "gerant").await;

    let body = json!({ "name": "Agence Plateau", "city": "Abidjan", "manager_id": manager });
    let response = send(&app, "POST", "/v1/agencies", Some(&bearer("gerant", Some(manager))), Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = send(&app, "POST", "/v1/agencies", Some(&admin), Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let agencies = body_json(send(&app, "GET", "/v1/agencies", Some(&bearer("client", None)), None).await).await;
    assert_eq!(agencies.as_array().unwrap().len(), 1);
    assert_eq!(agencies[0]["manager"], manager.to_string());

    let response = send(&app, "GET", "/v1/users", Some(&bearer("livreur", None)), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let users = body_json(send(&app, "GET", "/v1/users?role=gerant", Some(&bearer("gerant", None)), None).await).await;
    assert_eq!(users.as_array().unwrap().len(), 1);

    let response = send(
        &app,
        "POST",
        "/v1/users",
        Some(&admin),
        Some(json!({ "nom": "Sow", "prenom": "Awa", "role": "pilote" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn summary_report_counts_by_status() {
    let app = test_app();
    send(&app, "POST", "/v1/parcels", None, Some(parcel_body())).await;
    let mut cash = parcel_body();
    cash["payment_method"] = json!("especes");
    send(&app, "POST", "/v1/parcels", None, Some(cash)).await;
    send(&app, "POST", "/v1/mandates", None, Some(mandate_body())).await;

    let response = send(&app, "GET", "/v1/reports/summary", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["parcels"]["total"], 2);
    assert_eq!(body["parcels"]["by_status"]["en_attente"], 2);
    assert_eq!(body["parcels"]["mobile_money_share"], 0.5);
    assert_eq!(body["mandates"]["total"], 1);
    assert_eq!(body["mandates"]["open"], 1);
}
