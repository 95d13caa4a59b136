use std::sync::{Arc, Mutex};

use alumni_connect::api::{self, AppState};
use alumni_connect::config::Config;
use alumni_connect::services::{Notifier, NotifyError};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Default admin credential seeded by migration (must match m20240101_initial.rs)
const ADMIN_USER: &str = "admin";
const ADMIN_PASS: &str = "adminpass";

/// Captures outbound mail instead of delivering it.
#[derive(Default)]
struct MockNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl MockNotifier {
    fn messages(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Always reports a transport error, as an unreachable SMTP relay would.
struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("connection refused".to_string()))
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // Keep the KDF cheap for tests.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> (Router, Arc<AppState>, Arc<MockNotifier>) {
    let notifier = Arc::new(MockNotifier::default());
    let state = api::create_app_state_with_notifier(test_config(), notifier.clone())
        .await
        .expect("Failed to create app state");
    let app = api::router(state.clone()).await;

    (app, state, notifier)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

fn session_cookie(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Missing session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_json(response: axum::http::Response<axum::body::Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

#[tokio::test]
async fn test_login_and_generic_failure() {
    let (app, _, _) = spawn_app().await;

    // Seeded admin works.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": ADMIN_USER, "password": ADMIN_PASS }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["must_change_password"], true);

    // Wrong password and unknown user both return the same generic error.
    let wrong_pass = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": ADMIN_USER, "password": "nope-nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_pass.status(), StatusCode::UNAUTHORIZED);
    let wrong_pass_body = body_json(wrong_pass).await;

    let unknown_user = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": "ghost", "password": "nope-nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_user_body = body_json(unknown_user).await;

    assert_eq!(wrong_pass_body["error"], unknown_user_body["error"]);
}

#[tokio::test]
async fn test_unauthenticated_request_carries_next() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/alumni")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["next"], "/api/alumni");
}

#[tokio::test]
async fn test_register_login_and_duplicate_username() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "username": "priya",
                "password": "correct-horse",
                "email": "priya@example.com"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["role"], "user");

    // Same username again conflicts.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "username": "priya",
                "password": "other-password",
                "email": "priya2@example.com"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The new account can log in and see itself.
    let cookie = login(&app, "priya", "correct-horse").await;
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "priya");
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_user_role() {
    let (app, _, _) = spawn_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "username": "sam",
                "password": "correct-horse",
                "email": "sam@example.com"
            }),
        ))
        .await
        .unwrap();

    let cookie = login(&app, "sam", "correct-horse").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/admin/mentor-applications")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/admin/mentor-applications")
                .body(Body::empty())
                .unwrap(),
            &admin_cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let (app, _, _) = spawn_app().await;

    let cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_alumni_crud() {
    let (app, _, _) = spawn_app().await;
    let cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "POST",
                "/api/alumni",
                serde_json::json!({
                    "name": "Asha Rao",
                    "batch": "2019",
                    "email": "asha@example.com",
                    "company": "Initech"
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                &format!("/api/alumni/{id}"),
                serde_json::json!({
                    "name": "Asha Rao",
                    "batch": "2019",
                    "email": "asha@example.com",
                    "company": "Globex"
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["company"], "Globex");

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/alumni/{id}"))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri(format!("/api/alumni/{id}"))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_application_approval_is_terminal() {
    let (app, _, _) = spawn_app().await;

    // Public submission, no session required.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/mentor-applications",
            serde_json::json!({
                "name": "Vikram",
                "email": "vikram@example.com",
                "field": "Databases",
                "note": "Ten years at a storage vendor"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "pending");

    let cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;

    let approve_uri = format!("/api/admin/mentor-applications/{id}/approve");

    let first = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("POST")
                .uri(approve_uri.as_str())
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Second approval, and rejection after approval, both conflict.
    let second = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("POST")
                .uri(approve_uri.as_str())
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let reject = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/mentor-applications/{id}/reject"))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(reject.status(), StatusCode::CONFLICT);

    // Exactly one mentorship was materialized.
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/mentorships")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Mentor: Vikram");

    // Unknown application id is a plain 404.
    let missing = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("POST")
                .uri("/api/admin/mentor-applications/9999/approve")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

fn token_from_mail(body: &str) -> String {
    body.rsplit('/').next().unwrap().trim().to_string()
}

#[tokio::test]
async fn test_password_reset_round_trip() {
    let (app, _, notifier) = spawn_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "username": "lena",
                "password": "original-pass",
                "email": "lena@example.com"
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/forgot-password",
            serde_json::json!({ "email": "lena@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "lena@example.com");
    let token = token_from_mail(&messages[0].2);
    assert_eq!(token.len(), 64);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/reset-password",
            serde_json::json!({ "token": token, "password": "brand-new-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password is dead, new one works.
    let old = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": "lena", "password": "original-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    login(&app, "lena", "brand-new-pass").await;

    // The token is single-use.
    let replay = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/reset-password",
            serde_json::json!({ "token": token, "password": "yet-another-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let (app, _, notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/forgot-password",
            serde_json::json!({ "email": "nobody@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_forgot_password_delivery_failure_keeps_token() {
    let state = api::create_app_state_with_notifier(test_config(), Arc::new(FailingNotifier))
        .await
        .expect("Failed to create app state");
    let app = api::router(state.clone()).await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "username": "ivy",
                "password": "original-pass",
                "email": "ivy@example.com"
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/forgot-password",
            serde_json::json!({ "email": "ivy@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // The token survives the failed delivery, so a later retry can send it.
    let user = state
        .store()
        .get_user_by_username("ivy")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.store().count_reset_tokens(user.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_expired_reset_token_rejected() {
    let (app, state, _) = spawn_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "username": "omar",
                "password": "original-pass",
                "email": "omar@example.com"
            }),
        ))
        .await
        .unwrap();

    let user = state
        .store()
        .get_user_by_username("omar")
        .await
        .unwrap()
        .unwrap();

    let expired = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    state
        .store()
        .insert_reset_token(user.id, &"a".repeat(64), &expired)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/reset-password",
            serde_json::json!({ "token": "a".repeat(64), "password": "brand-new-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The stale password still works.
    login(&app, "omar", "original-pass").await;
}

#[tokio::test]
async fn test_change_password_requires_current() {
    let (app, _, _) = spawn_app().await;
    let cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                "/api/auth/password",
                serde_json::json!({
                    "current_password": "wrong-current",
                    "new_password": "fresh-password"
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                "/api/auth/password",
                serde_json::json!({
                    "current_password": ADMIN_PASS,
                    "new_password": "fresh-password"
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Rotating the seeded password clears the nag flag.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": ADMIN_USER, "password": "fresh-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["must_change_password"], false);
}

#[tokio::test]
async fn test_csv_import_and_insights() {
    let (app, _, _) = spawn_app().await;
    let cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;

    let csv = "name,batch,email,phone,company,bio\n\
               Asha,2019,asha@example.com,,Initech,\n\
               Ben,2019,ben@example.com,,Globex,\n\
               Cleo,2021,cleo@example.com,,,\n";

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("POST")
                .uri("/api/alumni/import-csv")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(csv))
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/insights")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["by_batch"][0]["batch"], "2019");
    assert_eq!(body["data"]["by_batch"][0]["count"], 2);
}

#[tokio::test]
async fn test_json_export_import_is_admin_gated() {
    let (app, _, _) = spawn_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "username": "nora",
                "password": "correct-horse",
                "email": "nora@example.com"
            }),
        ))
        .await
        .unwrap();
    let user_cookie = login(&app, "nora", "correct-horse").await;

    let dump = serde_json::json!({
        "alumni": [
            { "name": "Dev", "batch": "2020", "email": "dev@example.com" }
        ],
        "events": [
            { "title": "Reunion", "date": "2026-09-01", "venue": "Main hall" }
        ],
        "mentorships": []
    });

    // Destructive import is admin-only.
    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request("POST", "/api/import/json", dump.clone()),
            &user_cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;
    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request("POST", "/api/import/json", dump),
            &admin_cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["alumni"], 1);
    assert_eq!(body["data"]["events"], 1);

    // Export is visible to any authenticated session.
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/export/json")
                .body(Body::empty())
                .unwrap(),
            &user_cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["alumni"][0]["email"], "dev@example.com");
    assert_eq!(body["data"]["events"][0]["title"], "Reunion");
}

#[tokio::test]
async fn test_events_crud() {
    let (app, _, _) = spawn_app().await;
    let cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "POST",
                "/api/events",
                serde_json::json!({
                    "title": "Tech talk",
                    "date": "2026-10-05",
                    "venue": "Auditorium"
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();

    // Missing title is rejected before touching storage.
    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                &format!("/api/events/{id}"),
                serde_json::json!({ "title": "", "date": "2026-10-05" }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/events/{id}"))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_can_create_admin_user() {
    let (app, _, _) = spawn_app().await;
    let cookie = login(&app, ADMIN_USER, ADMIN_PASS).await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "POST",
                "/api/admin/users",
                serde_json::json!({
                    "username": "coadmin",
                    "password": "strong-enough",
                    "role": "admin",
                    "email": "coadmin@example.com"
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["role"], "admin");

    let coadmin_cookie = login(&app, "coadmin", "strong-enough").await;
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/admin/mentor-applications")
                .body(Body::empty())
                .unwrap(),
            &coadmin_cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
