mod common;

use actix_web::{test, web, App};
use chrono::Utc;
use meteo_server::billing::signature::sign_payload;
use meteo_server::{billing, Settings};
use serde_json::json;

fn webhook_config() -> Settings {
    let mut config = Settings::new().unwrap();
    config.billing.webhook_secret = "whsec_test".to_string();
    config
}

macro_rules! webhook_app {
    ($config:expr) => {{
        let state = web::Data::new(common::test_state($config));
        test::init_service(
            App::new()
                .app_data(state)
                .route("/api/billing/webhook", web::post().to(billing::handlers::webhook)),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_missing_signature_header_is_rejected() {
    let app = webhook_app!(webhook_config());

    let resp = test::TestRequest::post()
        .uri("/api/billing/webhook")
        .set_payload(r#"{"type":"checkout.session.completed"}"#)
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_invalid_signature_is_rejected() {
    let app = webhook_app!(webhook_config());

    let payload = json!({
        "type": "checkout.session.completed",
        "data": {"object": {"metadata": {"userId": "11111111-1111-1111-1111-111111111111"}}}
    })
    .to_string();
    let header = sign_payload("whsec_wrong", Utc::now().timestamp(), payload.as_bytes());

    let resp = test::TestRequest::post()
        .uri("/api/billing/webhook")
        .insert_header(("Stripe-Signature", header))
        .set_payload(payload)
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_stale_signature_is_rejected() {
    let app = webhook_app!(webhook_config());

    let payload = r#"{"type":"invoice.paid","data":{"object":{}}}"#.to_string();
    let stale = Utc::now().timestamp() - 3600;
    let header = sign_payload("whsec_test", stale, payload.as_bytes());

    let resp = test::TestRequest::post()
        .uri("/api/billing/webhook")
        .insert_header(("Stripe-Signature", header))
        .set_payload(payload)
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_unconfigured_secret_rejects_all_deliveries() {
    let mut config = Settings::new().unwrap();
    config.billing.webhook_secret = String::new();
    let app = webhook_app!(config);

    // Signed with the same (empty) secret the server holds; the delivery
    // must still be refused instead of granting premium to a forger.
    let payload = json!({
        "type": "checkout.session.completed",
        "data": {"object": {
            "customer": "cus_forged",
            "metadata": {"userId": "11111111-1111-1111-1111-111111111111"}
        }}
    })
    .to_string();
    let header = sign_payload("", Utc::now().timestamp(), payload.as_bytes());

    let resp = test::TestRequest::post()
        .uri("/api/billing/webhook")
        .insert_header(("Stripe-Signature", header))
        .set_payload(payload)
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 500);
}

#[actix_web::test]
async fn test_unrecognized_event_is_acknowledged() {
    let app = webhook_app!(webhook_config());

    let payload = json!({
        "type": "invoice.paid",
        "data": {"object": {"customer": "cus_123"}}
    })
    .to_string();
    let header = sign_payload("whsec_test", Utc::now().timestamp(), payload.as_bytes());

    let resp = test::TestRequest::post()
        .uri("/api/billing/webhook")
        .insert_header(("Stripe-Signature", header))
        .set_payload(payload)
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["received"], true);
}

#[actix_web::test]
async fn test_valid_signature_with_malformed_body_is_rejected() {
    let app = webhook_app!(webhook_config());

    let payload = "not json".to_string();
    let header = sign_payload("whsec_test", Utc::now().timestamp(), payload.as_bytes());

    let resp = test::TestRequest::post()
        .uri("/api/billing/webhook")
        .insert_header(("Stripe-Signature", header))
        .set_payload(payload)
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}
