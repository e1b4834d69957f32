// Shared helpers for the in-process router tests. The router is exercised
// directly via tower::ServiceExt::oneshot, no sockets involved.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt as _; // for `oneshot`

use coursedeck::auth;
use coursedeck::models::{Role, User};
use coursedeck::notify::Mailer;
use coursedeck::payments::SandboxGateway;
use coursedeck::{api, AppState, Config, MemoryStore};

pub const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

pub fn test_config() -> Config {
    Config {
        port: 0,
        jwt_secret: "test-secret".to_string(),
        jwt_ttl_days: 1,
        gateway_base_url: "http://gateway.invalid".to_string(),
        gateway_key: "key_test".to_string(),
        gateway_secret: "gateway-test-secret".to_string(),
        gateway_plan_id: "plan_test".to_string(),
        refund_days: 7,
        stats_period_secs: 86_400,
        frontend_url: "http://localhost:3000".to_string(),
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub config: Arc<Config>,
}

/// Build the same Router the binary uses, with a sandbox gateway and the
/// mailer disabled.
pub fn build_app() -> TestApp {
    let config = Arc::new(test_config());
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        config.clone(),
        store.clone(),
        Arc::new(SandboxGateway),
        Arc::new(Mailer::disabled()),
    );
    TestApp {
        app: api::router(state),
        store,
        config,
    }
}

/// Insert a user directly into the store and mint a token for it.
pub fn seed_user(t: &TestApp, name: &str, email: &str, role: Role) -> (User, String) {
    let mut user = User::new(
        name.to_string(),
        email.to_string(),
        "5550100".to_string(),
        "not-a-real-hash".to_string(),
    );
    user.role = role;
    let token =
        auth::issue_token(&t.config.jwt_secret, t.config.jwt_ttl_days, &user).expect("issue token");
    t.store.insert_user(user.clone()).expect("seed user");
    (user, token)
}

pub fn seed_admin(t: &TestApp) -> (User, String) {
    seed_user(t, "Admin", "admin@example.com", Role::Admin)
}

/// Fire one request at the router and decode the JSON response.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
