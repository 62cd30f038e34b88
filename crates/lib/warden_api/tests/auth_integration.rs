//! Integration tests — build the router over an in-memory identity store and a
//! fixed clock, then drive the auth endpoints end to end.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use warden_api::AppState;
use warden_api::middleware::rate_limit::RateLimitConfig;
use warden_core::auth::config::AuthConfig;
use warden_core::auth::password::MIN_BCRYPT_COST;
use warden_core::auth::session::SessionService;
use warden_core::clock::FixedClock;
use warden_core::models::auth::Role;
use warden_core::store::MemoryIdentityStore;

struct TestApp {
    app: Router,
    store: Arc<MemoryIdentityStore>,
    clock: Arc<FixedClock>,
}

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn test_app() -> TestApp {
    test_app_with(RateLimitConfig::default())
}

fn test_app_with(rate_limit: RateLimitConfig) -> TestApp {
    let store = Arc::new(MemoryIdentityStore::new());
    let clock = Arc::new(FixedClock::new(start()));
    let config = AuthConfig {
        secret: "integration-secret".into(),
        hash_cost: MIN_BCRYPT_COST,
        ..AuthConfig::default()
    };
    let sessions = SessionService::new(&config, store.clone(), clock.clone());
    TestApp {
        app: warden_api::router(AppState::with_rate_limit(sessions, rate_limit)),
        store,
        clock,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_auth(method: &str, uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap()
}

fn bearer(token: &Value) -> String {
    format!("Bearer {}", token.as_str().expect("token is string"))
}

async fn register(app: &Router, email: &str, password: &str, name: &str) -> Value {
    let (status, json) = send(
        app,
        post_json(
            "/api/auth/register",
            json!({"email": email, "password": password, "name": name}),
        ),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status, "register body: {json}");
    json
}

#[tokio::test]
async fn register_then_verify_returns_registered_identity() {
    let t = test_app();
    let registered = register(&t.app, "a@b.com", "pw123456", "A").await;

    let expires_at: DateTime<Utc> = registered["expires_at"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(start() + Duration::hours(24), expires_at);
    assert_eq!("A", registered["user"]["name"]);
    assert_eq!("user", registered["user"]["role"]);
    assert!(registered["user"].get("password_hash").is_none());

    let (status, verified) = send(
        &t.app,
        with_auth("GET", "/api/auth/verify", &bearer(&registered["token"])),
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(true, verified["valid"]);
    assert_eq!(registered["user"]["id"], verified["user_id"]);
    assert_eq!("a@b.com", verified["email"]);
    assert_eq!("user", verified["role"]);
}

#[tokio::test]
async fn duplicate_registration_is_conflict() {
    let t = test_app();
    register(&t.app, "a@b.com", "pw123456", "A").await;

    let (status, json) = send(
        &t.app,
        post_json(
            "/api/auth/register",
            json!({"email": "a@b.com", "password": "other", "name": "B"}),
        ),
    )
    .await;
    assert_eq!(StatusCode::CONFLICT, status);
    assert_eq!("conflict", json["error"]);
}

#[tokio::test]
async fn registration_requires_all_fields() {
    let t = test_app();
    let (status, json) = send(
        &t.app,
        post_json(
            "/api/auth/register",
            json!({"email": "a@b.com", "password": "pw123456"}),
        ),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert_eq!("bad_request", json["error"]);
    assert!(t.store.is_empty());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let t = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&t.app, req).await;
    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert_eq!("invalid request body", json["message"]);
}

#[tokio::test]
async fn login_succeeds_with_correct_password() {
    let t = test_app();
    let registered = register(&t.app, "a@b.com", "pw123456", "A").await;

    let (status, json) = send(
        &t.app,
        post_json(
            "/api/auth/login",
            json!({"email": "a@b.com", "password": "pw123456"}),
        ),
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(registered["user"]["id"], json["user"]["id"]);
    assert!(json["token"].is_string());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_identical() {
    let t = test_app();
    register(&t.app, "a@b.com", "pw123456", "A").await;

    let wrong = send(
        &t.app,
        post_json(
            "/api/auth/login",
            json!({"email": "a@b.com", "password": "wrong"}),
        ),
    )
    .await;
    let unknown = send(
        &t.app,
        post_json(
            "/api/auth/login",
            json!({"email": "nobody@b.com", "password": "pw123456"}),
        ),
    )
    .await;

    assert_eq!(StatusCode::UNAUTHORIZED, wrong.0);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn login_with_missing_fields_looks_like_wrong_password() {
    let t = test_app();
    register(&t.app, "a@b.com", "pw123456", "A").await;

    let wrong = send(
        &t.app,
        post_json(
            "/api/auth/login",
            json!({"email": "a@b.com", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(StatusCode::UNAUTHORIZED, wrong.0);

    for body in [json!({}), json!({"email": "a@b.com"}), json!({"password": "pw123456"})] {
        let resp = send(&t.app, post_json("/api/auth/login", body.clone())).await;
        assert_eq!(wrong, resp, "body {body}");
    }
}

#[tokio::test]
async fn verify_rejects_missing_and_malformed_headers() {
    let t = test_app();

    let req = Request::builder()
        .uri("/api/auth/verify")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&t.app, req).await;
    assert_eq!(StatusCode::UNAUTHORIZED, status);

    for auth in ["", "Token abc", "Bearer "] {
        let (status, json) = send(&t.app, with_auth("GET", "/api/auth/verify", auth)).await;
        assert_eq!(StatusCode::UNAUTHORIZED, status, "header {auth:?}");
        assert_eq!("unauthorized", json["error"]);
    }
}

#[tokio::test]
async fn expired_and_tampered_tokens_get_the_same_response() {
    let t = test_app();
    let registered = register(&t.app, "a@b.com", "pw123456", "A").await;
    let token = registered["token"].as_str().unwrap().to_string();

    // Flip one character of the payload segment.
    let payload_start = token.find('.').unwrap() + 1;
    let mut tampered = token.clone();
    let replacement = if &token[payload_start..payload_start + 1] == "A" { "B" } else { "A" };
    tampered.replace_range(payload_start..payload_start + 1, replacement);

    let tampered_resp = send(
        &t.app,
        with_auth("GET", "/api/auth/verify", &format!("Bearer {tampered}")),
    )
    .await;

    t.clock.advance(Duration::hours(24));
    let expired_resp = send(
        &t.app,
        with_auth("GET", "/api/auth/verify", &format!("Bearer {token}")),
    )
    .await;

    assert_eq!(StatusCode::UNAUTHORIZED, expired_resp.0);
    assert_eq!(expired_resp, tampered_resp);
}

#[tokio::test]
async fn refresh_reflects_role_change() {
    let t = test_app();
    let registered = register(&t.app, "a@b.com", "pw123456", "A").await;
    let id = registered["user"]["id"].as_i64().unwrap();
    assert!(t.store.update_role(id, Role::Admin));

    t.clock.advance(Duration::minutes(30));
    let (status, refreshed) = send(
        &t.app,
        with_auth("POST", "/api/auth/refresh", &bearer(&registered["token"])),
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("admin", refreshed["user"]["role"]);

    let (_, verified) = send(
        &t.app,
        with_auth("GET", "/api/auth/verify", &bearer(&refreshed["token"])),
    )
    .await;
    assert_eq!("admin", verified["role"]);
}

#[tokio::test]
async fn refresh_for_removed_identity_is_unauthorized() {
    let t = test_app();
    let registered = register(&t.app, "a@b.com", "pw123456", "A").await;
    let id = registered["user"]["id"].as_i64().unwrap();
    assert!(t.store.remove(id));

    let (status, json) = send(
        &t.app,
        with_auth("POST", "/api/auth/refresh", &bearer(&registered["token"])),
    )
    .await;
    assert_eq!(StatusCode::UNAUTHORIZED, status);
    assert_eq!("User not found", json["message"]);
}

#[tokio::test]
async fn me_requires_auth() {
    let t = test_app();
    let registered = register(&t.app, "a@b.com", "pw123456", "A").await;

    let req = Request::builder()
        .uri("/api/auth/me")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&t.app, req).await;
    assert_eq!(StatusCode::UNAUTHORIZED, status);

    let (status, claims) = send(
        &t.app,
        with_auth("GET", "/api/auth/me", &bearer(&registered["token"])),
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(registered["user"]["id"], claims["user_id"]);
    assert_eq!("warden-auth", claims["iss"]);
}

#[tokio::test]
async fn user_lookup_is_owner_or_admin() {
    let t = test_app();
    let alice = register(&t.app, "alice@b.com", "pw123456", "Alice").await;
    let bob = register(&t.app, "bob@b.com", "pw123456", "Bob").await;
    let alice_id = alice["user"]["id"].as_i64().unwrap();
    let bob_id = bob["user"]["id"].as_i64().unwrap();

    let (status, own) = send(
        &t.app,
        with_auth("GET", &format!("/api/users/{alice_id}"), &bearer(&alice["token"])),
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("Alice", own["name"]);

    let (status, json) = send(
        &t.app,
        with_auth("GET", &format!("/api/users/{bob_id}"), &bearer(&alice["token"])),
    )
    .await;
    assert_eq!(StatusCode::FORBIDDEN, status);
    assert_eq!("forbidden", json["error"]);

    // Promote Alice and pick the new role up through refresh.
    assert!(t.store.update_role(alice_id, Role::Admin));
    let (_, refreshed) = send(
        &t.app,
        with_auth("POST", "/api/auth/refresh", &bearer(&alice["token"])),
    )
    .await;

    let (status, other) = send(
        &t.app,
        with_auth("GET", &format!("/api/users/{bob_id}"), &bearer(&refreshed["token"])),
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("Bob", other["name"]);

    let (status, _) = send(
        &t.app,
        with_auth("GET", "/api/users/9999", &bearer(&refreshed["token"])),
    )
    .await;
    assert_eq!(StatusCode::NOT_FOUND, status);
}

#[tokio::test]
async fn health_reports_store_reachable() {
    let t = test_app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(&t.app, req).await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("healthy", json["status"]);
    assert_eq!("warden-auth", json["service"]);
}

#[tokio::test]
async fn non_numeric_user_id_is_json_bad_request() {
    let t = test_app();
    let registered = register(&t.app, "a@b.com", "pw123456", "A").await;

    let (status, json) = send(
        &t.app,
        with_auth("GET", "/api/users/abc", &bearer(&registered["token"])),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert_eq!("bad_request", json["error"]);
    assert_eq!("invalid user id", json["message"]);
}

fn login_from(peer: &str) -> Request<Body> {
    let mut req = post_json(
        "/api/auth/login",
        json!({"email": "a@b.com", "password": "wrong"}),
    );
    let addr: SocketAddr = peer.parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

#[tokio::test]
async fn credential_endpoints_are_rate_limited_per_client() {
    let t = test_app_with(RateLimitConfig {
        max_requests: 3,
        window: StdDuration::from_secs(15 * 60),
    });

    for _ in 0..3 {
        let (status, _) = send(&t.app, login_from("10.0.0.1:4000")).await;
        assert_eq!(StatusCode::UNAUTHORIZED, status);
    }

    let (status, json) = send(&t.app, login_from("10.0.0.1:4001")).await;
    assert_eq!(StatusCode::TOO_MANY_REQUESTS, status);
    assert_eq!("too_many_requests", json["error"]);

    // Verify shares the client's budget.
    let mut verify = with_auth("GET", "/api/auth/verify", "Bearer x.y.z");
    verify
        .extensions_mut()
        .insert(ConnectInfo("10.0.0.1:4002".parse::<SocketAddr>().unwrap()));
    let (status, _) = send(&t.app, verify).await;
    assert_eq!(StatusCode::TOO_MANY_REQUESTS, status);

    // Other clients and unlimited routes are unaffected.
    let (status, _) = send(&t.app, login_from("10.0.0.2:4000")).await;
    assert_eq!(StatusCode::UNAUTHORIZED, status);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = send(&t.app, req).await;
    assert_eq!(StatusCode::OK, status);
}
