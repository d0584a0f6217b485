use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};
use tower::ServiceExt;

use server::startup::build_app;
use service::auth::hasher::HashCost;
use service::auth::repository::mock::{FailPoint, MockAccountStore};
use service::auth::token::Claims;
use service::auth::AuthConfig;

const SECRET: &str = "router-test-secret";

fn cfg() -> AuthConfig {
    AuthConfig {
        jwt_secret: SECRET.into(),
        token_ttl: Duration::days(30),
        hash_cost: HashCost { memory_kib: 1024, iterations: 1, parallelism: 1 },
    }
}

fn app() -> (Router, MockAccountStore) {
    let store = MockAccountStore::default();
    let app = build_app(Arc::new(store.clone()), cfg()).expect("app");
    (app, store)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn jane() -> Value {
    json!({"email": "jane@example.com", "password": "S3curePass!", "first_name": "Jane", "last_name": "Doe"})
}

async fn signup_and_login(app: &Router) -> String {
    let (status, _) = send(app, post_json("/auth/signup", jane())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) =
        send(app, post_json("/auth/login", json!({"email": "jane@example.com", "password": "S3curePass!"}))).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn signup_returns_names_and_email_only() {
    let (app, store) = app();
    let (status, body) = send(&app, post_json("/auth/signup", jane())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"first_name": "Jane", "last_name": "Doe", "email": "jane@example.com"}));

    let user = store.user_by_email("jane@example.com").expect("user");
    assert_ne!(user.password_hash, "S3curePass!");
    assert_eq!(user.token, None);
    assert_eq!(store.customers().len(), 1);
    assert_eq!(store.customers()[0].user_id, user.id);
}

#[tokio::test]
async fn signup_rejects_unreadable_body() {
    let (app, store) = app();
    let (status, body) = send(&app, post_json("/auth/signup", json!({"email": "x@example.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to read request body");

    let req = Request::builder()
        .method("POST")
        .uri("/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to read request body");
    assert!(store.users().is_empty());
}

#[tokio::test]
async fn duplicate_signup_is_generic_failure_and_leaves_one_pair() {
    let (app, store) = app();
    assert_eq!(send(&app, post_json("/auth/signup", jane())).await.0, StatusCode::OK);
    let (status, body) = send(&app, post_json("/auth/signup", jane())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to create User and Customer");
    assert_eq!(store.users().len(), 1);
    assert_eq!(store.customers().len(), 1);
}

#[tokio::test]
async fn signup_failure_mid_unit_rolls_back_both_rows() {
    let (app, store) = app();
    store.fail_at(Some(FailPoint::InsertCustomer));
    let (status, body) = send(&app, post_json("/auth/signup", jane())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to create User and Customer");
    assert!(store.users().is_empty());
    assert!(store.customers().is_empty());
}

#[tokio::test]
async fn login_issues_token_naming_the_user() {
    let (app, store) = app();
    let token = signup_and_login(&app).await;
    let user = store.user_by_email("jane@example.com").expect("user");

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(&token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation).expect("claims");
    assert_eq!(data.claims.sub, user.id.to_string());
    let ttl = data.claims.exp - data.claims.iat;
    assert!((ttl - 30 * 24 * 3600).abs() <= 5);

    assert_eq!(user.token.as_deref(), Some(token.as_str()));
    let history = store.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].activity, "User logged in");
    assert_eq!(history[0].customer_id, store.customers()[0].id);
}

#[tokio::test]
async fn login_unknown_email_is_401() {
    let (app, store) = app();
    let (status, body) =
        send(&app, post_json("/auth/login", json!({"email": "ghost@example.com", "password": "x"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not found");
    assert_eq!(store.begins(), 0);
}

#[tokio::test]
async fn login_wrong_password_is_400_without_side_effects() {
    let (app, store) = app();
    send(&app, post_json("/auth/signup", jane())).await;
    let begins = store.begins();
    let (status, body) =
        send(&app, post_json("/auth/login", json!({"email": "jane@example.com", "password": "wrong"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Incorrect password");
    assert_eq!(store.begins(), begins);
    assert!(store.history().is_empty());
    assert_eq!(store.user_by_email("jane@example.com").unwrap().token, None);
}

#[tokio::test]
async fn login_without_customer_fails_generically_and_writes_nothing() {
    let (app, store) = app();
    send(&app, post_json("/auth/signup", jane())).await;
    let user = store.user_by_email("jane@example.com").unwrap();
    store.remove_customer_of(user.id);

    let (status, body) =
        send(&app, post_json("/auth/login", json!({"email": "jane@example.com", "password": "S3curePass!"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to create token and update user");
    assert_eq!(store.user_by_email("jane@example.com").unwrap().token, None);
    assert!(store.history().is_empty());
}

#[tokio::test]
async fn login_history_failure_rolls_back_token() {
    let (app, store) = app();
    send(&app, post_json("/auth/signup", jane())).await;
    store.fail_at(Some(FailPoint::InsertHistory));
    let (status, body) =
        send(&app, post_json("/auth/login", json!({"email": "jane@example.com", "password": "S3curePass!"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to create token and update user");
    assert_eq!(store.user_by_email("jane@example.com").unwrap().token, None);
}

#[tokio::test]
async fn logout_clears_token_and_revokes_it() {
    let (app, store) = app();
    let token = signup_and_login(&app).await;

    let (status, body) = send(&app, with_bearer("POST", "/auth/logout", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "User successfully logged out"}));
    assert_eq!(store.user_by_email("jane@example.com").unwrap().token, None);

    let (status, body) = send(&app, with_bearer("POST", "/auth/logout", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn logout_failure_is_400_and_keeps_token() {
    let (app, store) = app();
    let token = signup_and_login(&app).await;
    store.fail_at(Some(FailPoint::SetToken));
    let (status, body) = send(&app, with_bearer("POST", "/auth/logout", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to log out User");
    assert_eq!(store.user_by_email("jane@example.com").unwrap().token.as_deref(), Some(token.as_str()));
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let (app, _) = app();
    for uri in ["/auth/me", "/auth/history"] {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }
    let (status, _) = send(&app, with_bearer("POST", "/auth/logout", "not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let (app, store) = app();
    signup_and_login(&app).await;
    let user = store.user_by_email("jane@example.com").unwrap();

    let now = chrono::Utc::now().timestamp();
    let claims = Claims { sub: user.id.to_string(), iat: now, exp: now + 3600 };
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();
    let (status, _) = send(&app, with_bearer("GET", "/auth/me", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_and_history_resolve_the_caller() {
    let (app, store) = app();
    let token = signup_and_login(&app).await;
    let user = store.user_by_email("jane@example.com").unwrap();

    let (status, body) = send(&app, with_bearer("GET", "/auth/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": user.id, "email": "jane@example.com", "first_name": "Jane", "last_name": "Doe"})
    );

    let (status, body) = send(&app, with_bearer("GET", "/auth/history", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["activity"], "User logged in");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _) = app();
    let req = Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/auth/login"].is_object());
}

#[tokio::test]
async fn earlier_tokens_stay_valid_until_logout() {
    let (app, _) = app();
    let first = signup_and_login(&app).await;
    // token timestamps have second resolution
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let (status, body) =
        send(&app, post_json("/auth/login", json!({"email": "jane@example.com", "password": "S3curePass!"}))).await;
    assert_eq!(status, StatusCode::OK);
    let second = body["token"].as_str().expect("token").to_string();
    assert_ne!(first, second);

    for token in [&first, &second] {
        assert_eq!(send(&app, with_bearer("GET", "/auth/me", token)).await.0, StatusCode::OK);
    }

    assert_eq!(send(&app, with_bearer("POST", "/auth/logout", &first)).await.0, StatusCode::OK);
    for token in [&first, &second] {
        assert_eq!(send(&app, with_bearer("GET", "/auth/me", token)).await.0, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn corrupted_stored_digest_answers_incorrect_password() {
    let (app, store) = app();
    send(&app, post_json("/auth/signup", jane())).await;
    let user = store.user_by_email("jane@example.com").unwrap();
    store.replace_password_hash(user.id, "not-a-phc-string");

    let (status, body) =
        send(&app, post_json("/auth/login", json!({"email": "jane@example.com", "password": "S3curePass!"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Incorrect password");
    assert_eq!(store.user_by_email("jane@example.com").unwrap().token, None);
}
