// tests/api_payments.rs
//
// Subscription lifecycle against the sandbox gateway: create, verify the
// charge signature, cancel with refund-window behavior.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{build_app, request, seed_admin, seed_user, TestApp};
use coursedeck::models::Role;
use coursedeck::payments::sign_charge;

async fn subscribed_user(t: &TestApp) -> (String, String) {
    let (_, token) = seed_user(t, "Ada", "ada@example.com", Role::User);
    let (status, v) = request(&t.app, "POST", "/api/v1/subscribe", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let sub_id = v["subscription"]["id"].as_str().unwrap().to_string();
    (token, sub_id)
}

#[tokio::test]
async fn payment_key_is_public() {
    let t = build_app();
    let (status, v) = request(&t.app, "GET", "/api/v1/paymentkey", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["key"], json!("key_test"));
}

#[tokio::test]
async fn subscribe_stores_gateway_subscription() {
    let t = build_app();
    let (user, token) = seed_user(&t, "Ada", "ada@example.com", Role::User);

    let (status, v) = request(&t.app, "POST", "/api/v1/subscribe", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["subscription"]["status"], json!("created"));

    let stored = t.store.user_by_id(user.id).unwrap().unwrap();
    assert!(stored.subscription.id.is_some());
    assert_eq!(stored.subscription.status.as_deref(), Some("created"));
    // "created" is not "active": the stats metric must not count it yet
    assert!(!stored.subscription.is_active());
}

#[tokio::test]
async fn admins_cannot_subscribe() {
    let t = build_app();
    let (_, token) = seed_admin(&t);
    let (status, v) = request(&t.app, "POST", "/api/v1/subscribe", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], json!("Admin can't buy subscription"));
}

#[tokio::test]
async fn verification_rejects_bad_signatures() {
    let t = build_app();
    let (token, _sub_id) = subscribed_user(&t).await;

    let (status, _) = request(
        &t.app,
        "POST",
        "/api/v1/paymentverification",
        Some(&token),
        Some(json!({ "paymentId": "pay_1", "signature": "deadbeef" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verification_activates_the_subscription() {
    let t = build_app();
    let (token, sub_id) = subscribed_user(&t).await;

    let signature = sign_charge(&t.config.gateway_secret, "pay_1", &sub_id);
    let (status, v) = request(
        &t.app,
        "POST",
        "/api/v1/paymentverification",
        Some(&token),
        Some(json!({ "paymentId": "pay_1", "signature": signature })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["reference"], json!("pay_1"));

    let stored = t.store.user_by_email("ada@example.com").unwrap().unwrap();
    assert!(stored.subscription.is_active());
    assert!(t.store.payment_by_subscription(&sub_id).unwrap().is_some());
}

#[tokio::test]
async fn verification_without_pending_subscription_fails() {
    let t = build_app();
    let (_, token) = seed_user(&t, "Ada", "ada@example.com", Role::User);

    let (status, _) = request(
        &t.app,
        "POST",
        "/api/v1/paymentverification",
        Some(&token),
        Some(json!({ "paymentId": "pay_1", "signature": "00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancel_refunds_inside_the_window() {
    let t = build_app();
    let (token, sub_id) = subscribed_user(&t).await;
    let signature = sign_charge(&t.config.gateway_secret, "pay_1", &sub_id);
    request(
        &t.app,
        "POST",
        "/api/v1/paymentverification",
        Some(&token),
        Some(json!({ "paymentId": "pay_1", "signature": signature })),
    )
    .await;

    let (status, v) = request(&t.app, "DELETE", "/api/v1/subscribe/cancel", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        v["message"].as_str().unwrap().contains("full refund"),
        "payment just happened, inside the refund window"
    );

    let stored = t.store.user_by_email("ada@example.com").unwrap().unwrap();
    assert!(stored.subscription.id.is_none());
    assert!(stored.subscription.status.is_none());
    assert!(t.store.payment_by_subscription(&sub_id).unwrap().is_none());
}

#[tokio::test]
async fn cancel_without_subscription_fails() {
    let t = build_app();
    let (_, token) = seed_user(&t, "Ada", "ada@example.com", Role::User);
    let (status, _) = request(&t.app, "DELETE", "/api/v1/subscribe/cancel", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contact_form_validates_and_reports_smtp_state() {
    let t = build_app();

    let (status, _) = request(
        &t.app,
        "POST",
        "/api/v1/contact",
        None,
        Some(json!({ "name": "Ada", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Valid payload, but the test mailer is disabled.
    let (status, _) = request(
        &t.app,
        "POST",
        "/api/v1/contact",
        None,
        Some(json!({
            "name": "Ada", "email": "ada@example.com",
            "phone": "5550100", "message": "hello",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = request(
        &t.app,
        "POST",
        "/api/v1/courserequest",
        None,
        Some(json!({
            "name": "Ada", "email": "ada@example.com",
            "phone": "5550100", "course": "More Rust",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
