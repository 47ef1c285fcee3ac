//! Shared helpers for handler tests: a router over the in-memory store and a
//! request helper returning status plus parsed JSON body.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::accounts::manager::{create_superuser, ExtraFields};
use crate::accounts::tokens::TokenIssuer;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, Store};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
}

impl TestApp {
    pub fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let config = Config::for_tests();
        let tokens = TokenIssuer::from_config(&config);
        let state = AppState {
            store: store.clone(),
            tokens: tokens.clone(),
            config,
        };
        TestApp {
            router: build_router(state),
            store,
            tokens,
        }
    }
}

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn register(app: &TestApp, email: &str, password: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/register/",
        Some(json!({"email": email, "password": password})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body
}

/// Registers a student account and returns its access token.
pub async fn login(app: &TestApp, email: &str, password: &str) -> String {
    register(app, email, password).await;
    let (status, body) = send(
        app,
        Method::POST,
        "/api/token/",
        Some(json!({"email": email, "password": password})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access"].as_str().unwrap().to_string()
}

/// Creates a superuser directly and returns an access token for it.
pub async fn staff_token(app: &TestApp, email: &str) -> String {
    let admin = create_superuser(
        app.store.as_ref(),
        email,
        Some("admin-pw"),
        ExtraFields::default(),
    )
    .await
    .unwrap();
    app.tokens
        .issue(admin.id, crate::accounts::tokens::TokenType::Access)
        .unwrap()
}
