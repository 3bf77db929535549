//! End-to-end tests driving the full router over in-memory requests.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use homebase::auth::{Role, TokenCodec};
use homebase::config::Config;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const TEST_SECRET: &str = "integration-test-secret";

fn test_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.path = tmp.path().join("test.db");
    config.auth.jwt_secret = Some(TEST_SECRET.into());
    // Keep hashing cheap; cost is not under test here.
    config.auth.pbkdf2_rounds = 1_000;
    config.auth.admin_password = Some("rootpw1".into());
    config
}

fn test_app() -> (TempDir, Router) {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let app = homebase::gateway::app(&config).unwrap();
    (tmp, app)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": password })),
    )
    .await
}

/// Login and return the issued token.
async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn health_is_open() {
    let (_tmp, app) = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_me_round_trip() {
    let (_tmp, app) = test_app();

    let (status, body) = register(&app, "alice", "alice@example.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"]["password_hash"].is_null());

    let token = login(&app, "alice", "secret1").await;
    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"]["last_login"].is_i64());
}

#[tokio::test]
async fn login_accepts_email_as_identifier() {
    let (_tmp, app) = test_app();
    register(&app, "alice", "alice@example.com", "secret1").await;
    let token = login(&app, "alice@example.com", "secret1").await;
    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_rejects_weak_and_duplicate() {
    let (_tmp, app) = test_app();

    let (status, body) = register(&app, "alice", "alice@example.com", "abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 6 characters");

    register(&app, "alice", "alice@example.com", "secret1").await;
    let (status, body) = register(&app, "alice", "other@example.com", "secret1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username or email is already taken");

    let (status, body) = register(&app, "other", "alice@example.com", "secret1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username or email is already taken");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (_tmp, app) = test_app();
    register(&app, "alice", "alice@example.com", "secret1").await;

    let (status_a, body_a) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong-1" })),
    )
    .await;
    let (status_b, body_b) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "secret1" })),
    )
    .await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_b, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (_tmp, app) = test_app();
    for uri in ["/api/auth/me", "/api/data", "/api/finance", "/api/market/forex"] {
        let (status, _) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} was open");
    }
}

#[tokio::test]
async fn expired_and_forged_tokens_are_rejected() {
    let (_tmp, app) = test_app();

    let expired = TokenCodec::new(TEST_SECRET.as_bytes())
        .issue(1, "alice", Role::User, -10)
        .unwrap();
    let (status, body) = send(&app, Method::GET, "/api/data", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token expired");

    let forged = TokenCodec::new(b"some-other-secret")
        .issue(1, "alice", Role::Admin, 3600)
        .unwrap();
    let (status, body) = send(&app, Method::GET, "/api/data", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn cookie_transport_works() {
    let (_tmp, app) = test_app();
    register(&app, "alice", "alice@example.com", "secret1").await;
    let token = login(&app, "alice", "secret1").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_sets_cookie_and_logout_clears_it() {
    let (_tmp, app) = test_app();
    register(&app, "alice", "alice@example.com", "secret1").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "username": "alice", "password": "secret1" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.starts_with("token="));
    assert!(cleared.contains("Max-Age=0") || cleared.contains("Expires="));
}

#[tokio::test]
async fn notes_are_private_and_foreign_ids_read_as_missing() {
    let (_tmp, app) = test_app();
    register(&app, "alice", "alice@example.com", "secret1").await;
    register(&app, "bob", "bob@example.com", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;
    let bob = login(&app, "bob", "secret1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/data",
        Some(&alice),
        Some(json!({ "title": "groceries", "content": "milk", "category": "home" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let note_id = body["data"]["id"].as_i64().unwrap();

    // Bob sees an empty list, and Alice's note answers exactly like a
    // nonexistent one.
    let (_, body) = send(&app, Method::GET, "/api/data", Some(&bob), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let update = json!({ "title": "hijack", "content": "", "category": "general" });
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/data/{note_id}"),
        Some(&bob),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status_missing, body_missing) = send(
        &app,
        Method::PUT,
        "/api/data/999999",
        Some(&bob),
        Some(update),
    )
    .await;
    assert_eq!(status_missing, StatusCode::NOT_FOUND);
    assert_eq!(body, body_missing);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/data/{note_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner still can.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/data/{note_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn finance_summary_tracks_the_ledger() {
    let (_tmp, app) = test_app();
    register(&app, "alice", "alice@example.com", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;

    for (kind, category, amount) in [
        ("income", "salary", 3000.0),
        ("expense", "rent", 900.0),
        ("expense", "food", 100.0),
    ] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/finance",
            Some(&alice),
            Some(json!({
                "type": kind, "category": category, "amount": amount,
                "date": "2026-08-15"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, Method::GET, "/api/finance", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 3);
    assert_eq!(body["summary"]["totalIncome"], 3000.0);
    assert_eq!(body["summary"]["totalExpense"], 1000.0);
    assert_eq!(body["summary"]["balance"], 2000.0);

    let (status, body) = send(&app, Method::GET, "/api/finance/summary", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["balance"], 2000.0);

    let (status, body) = send(&app, Method::GET, "/api/finance/charts", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let categories = body["expensesByCategory"].as_array().unwrap();
    assert_eq!(categories[0]["category"], "rent");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/finance",
        Some(&alice),
        Some(json!({ "type": "expense", "category": "food", "amount": -5.0, "date": "2026-08-15" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn football_writes_are_admin_only() {
    let (_tmp, app) = test_app();
    register(&app, "alice", "alice@example.com", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;
    let admin = login(&app, "admin", "rootpw1").await;

    let new_match = json!({
        "league_name": "EPL", "home_team": "Arsenal", "away_team": "Spurs",
        "match_date": "2026-09-01", "match_time": "18:00"
    });
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/football/matches",
        Some(&alice),
        Some(new_match.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/football/matches",
        Some(&admin),
        Some(new_match),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let match_id = body["match"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/football/matches/{match_id}"),
        Some(&admin),
        Some(json!({ "home_score": 2, "away_score": 1, "status": "finished" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Everyone authenticated can read the results and standings.
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/football/standings?league=EPL",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let standings = body["standings"].as_array().unwrap();
    assert_eq!(standings[0]["team"], "Arsenal");
    assert_eq!(standings[0]["points"], 3);
    assert_eq!(standings[1]["team"], "Spurs");
    assert_eq!(standings[1]["points"], 0);

    let (status, _) = send(&app, Method::GET, "/api/football/standings", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_surface_and_self_delete_guard() {
    let (_tmp, app) = test_app();
    register(&app, "bob", "bob@example.com", "secret1").await;
    let bob = login(&app, "bob", "secret1").await;
    let admin = login(&app, "admin", "rootpw1").await;

    // Non-admins are shut out.
    let (status, _) = send(&app, Method::GET, "/api/admin/users", Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    let bob_id = users
        .iter()
        .find(|u| u["username"] == "bob")
        .unwrap()["id"]
        .as_i64()
        .unwrap();
    let admin_id = users
        .iter()
        .find(|u| u["username"] == "admin")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    // Bob owns a note that must disappear with him.
    send(
        &app,
        Method::POST,
        "/api/data",
        Some(&bob),
        Some(json!({ "title": "bob's", "content": "" })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/user/{admin_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot perform this action on your own account");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/user/{bob_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Second delete is a 404, and the cascade removed Bob's data.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/user/{bob_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/admin/user/{bob_id}/data"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob's login history is still in the logs.
    let (status, body) = send(&app, Method::GET, "/api/admin/logs", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l["username"] == "bob"));

    let (status, body) = send(&app, Method::GET, "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["userCount"], 1);
    assert_eq!(body["stats"]["registrationsToday"], 1);
}

#[tokio::test]
async fn auth_endpoints_are_rate_limited_per_client() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.gateway.auth_attempts_per_window = 3;
    let app = homebase::gateway::app(&config).unwrap();

    let attempt = |ip: &'static str| {
        let app = app.clone();
        async move {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header("X-Forwarded-For", ip)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "ghost", "password": "wrong-1" }).to_string(),
                ))
                .unwrap();
            app.oneshot(request).await.unwrap().status()
        }
    };

    for _ in 0..3 {
        assert_eq!(attempt("198.51.100.1").await, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(attempt("198.51.100.1").await, StatusCode::TOO_MANY_REQUESTS);
    // A different source address is not affected.
    assert_eq!(attempt("198.51.100.2").await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn market_endpoints_answer_authenticated_callers() {
    let (_tmp, app) = test_app();
    register(&app, "alice", "alice@example.com", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;

    // Forex is simulated locally, so this works offline.
    let (status, body) = send(&app, Method::GET, "/api/market/forex", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["market"]["source"], "simulated");
    assert!(body["market"]["data"]["USD/KRW"]["rate"].is_number());
}
