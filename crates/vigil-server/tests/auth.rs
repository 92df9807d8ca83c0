mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn health_reports_database() {
    let app = test_app();
    let res = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "healthy");
    assert_eq!(res.body["service"], "Healthcare Risk Platform API");
    assert_eq!(res.body["database"], "connected");
    assert!(res.body["version"].is_string());
}

#[tokio::test]
async fn api_index_is_public() {
    let app = test_app();
    let res = send(&app, Method::GET, "/api", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["environment"], "testing");
    assert_eq!(res.body["data_retention_days"], 2555);
    assert_eq!(res.body["features"]["data_export"], true);
}

#[tokio::test]
async fn security_headers_on_every_response() {
    let app = test_app();
    for uri in ["/api/health", "/api/nowhere"] {
        let res = send(&app, Method::GET, uri, None, None).await;
        let h = &res.headers;
        assert_eq!(h["x-content-type-options"], "nosniff");
        assert_eq!(h["x-frame-options"], "DENY");
        assert_eq!(h["x-xss-protection"], "1; mode=block");
        assert_eq!(
            h["strict-transport-security"],
            "max-age=31536000; includeSubDomains"
        );
        assert_eq!(h["content-security-policy"], "default-src 'self'");
    }
}

#[tokio::test]
async fn unknown_route_is_enveloped_404() {
    let app = test_app();
    let res = send(&app, Method::GET, "/api/nowhere", None, None).await;
    assert_envelope(&res, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn first_user_becomes_admin() {
    let app = test_app();
    let res = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("first", Some("viewer"))),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["role"], "admin");
    assert_eq!(res.body["is_verified"], true);
    assert!(res.body.get("password_hash").is_none());
}

#[tokio::test]
async fn later_registration_needs_an_admin() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;

    let anonymous = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("intruder", Some("admin"))),
    )
    .await;
    assert_envelope(&anonymous, StatusCode::UNAUTHORIZED);

    let created = post(&app, "/api/auth/register", &admin, registration("rn.kim", Some("clinician"))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["role"], "clinician");
    assert_eq!(created.body["is_verified"], false);

    let clinician = access_token(&app, "rn.kim").await;
    let denied = post(&app, "/api/auth/register", &clinician, registration("other", None)).await;
    assert_envelope(&denied, StatusCode::FORBIDDEN);

    let duplicate = post(&app, "/api/auth/register", &admin, registration("rn.kim", None)).await;
    assert_envelope(&duplicate, StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_is_validated() {
    let app = test_app();
    let mut body = registration("shorty", None);
    body["password"] = json!("short");
    let res = send(&app, Method::POST, "/api/auth/register", None, Some(body)).await;
    assert_envelope(&res, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_me_and_refresh() {
    let app = test_app();
    bootstrap_admin(&app).await;

    let tokens = login(&app, "admin").await;
    assert_eq!(tokens["token_type"], "Bearer");
    assert_eq!(tokens["expires_in"], 3600);
    assert!(tokens["user"]["last_login"].is_string());
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let me = get(&app, "/api/auth/me", access).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "admin");

    let refreshed = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let new_access = refreshed.body["access_token"].as_str().unwrap();
    assert_eq!(get(&app, "/api/auth/me", new_access).await.status, StatusCode::OK);

    let misuse = get(&app, "/api/auth/me", refresh).await;
    assert_envelope(&misuse, StatusCode::UNAUTHORIZED);

    let backwards = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": access })),
    )
    .await;
    assert_envelope(&backwards, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_credentials() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;

    let mut messages = Vec::new();
    for (username, password) in [("admin", "wrong-password"), ("ghost", PASSWORD)] {
        let res = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_envelope(&res, StatusCode::UNAUTHORIZED);
        messages.push(res.body["message"].clone());
    }
    // An unknown username is indistinguishable from a wrong password.
    assert_eq!(messages[0], messages[1]);

    let failed = get(&app, "/api/audit-logs?resource_type=user", &admin).await;
    let count = failed.body["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["action"] == "login_failed")
        .count();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn missing_and_garbage_tokens() {
    let app = test_app();
    let res = send(&app, Method::GET, "/api/patients", None, None).await;
    assert_envelope(&res, StatusCode::UNAUTHORIZED);

    let res = get(&app, "/api/patients", "not-a-token").await;
    assert_envelope(&res, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_in_query_string() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let uri = format!("/api/auth/me?access_token={admin}");
    let res = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["role"], "admin");
}

#[tokio::test]
async fn deactivated_user_is_locked_out() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let viewer = user_with_role(&app, &admin, "temp", "viewer").await;
    let viewer_id = get(&app, "/api/auth/me", &viewer).await.body["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = put(
        &app,
        &format!("/api/users/{viewer_id}/active"),
        &admin,
        json!({ "is_active": false }),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["is_active"], false);

    assert_envelope(&get(&app, "/api/auth/me", &viewer).await, StatusCode::UNAUTHORIZED);
    let relogin = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "temp", "password": PASSWORD })),
    )
    .await;
    assert_envelope(&relogin, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let viewer = user_with_role(&app, &admin, "watcher", "viewer").await;

    assert_envelope(&get(&app, "/api/users", &viewer).await, StatusCode::FORBIDDEN);

    let users = get(&app, "/api/users", &admin).await;
    assert_eq!(users.status, StatusCode::OK);
    assert_eq!(users.body["total"], 2);

    let viewer_id = get(&app, "/api/auth/me", &viewer).await.body["id"]
        .as_str()
        .unwrap()
        .to_string();
    let promoted = put(
        &app,
        &format!("/api/users/{viewer_id}/role"),
        &admin,
        json!({ "role": "clinician" }),
    )
    .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["role"], "clinician");

    let bogus = put(
        &app,
        &format!("/api/users/{viewer_id}/role"),
        &admin,
        json!({ "role": "superuser" }),
    )
    .await;
    assert_envelope(&bogus, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn admin_cannot_lock_themselves_out() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let me = get(&app, "/api/auth/me", &admin).await.body["id"]
        .as_str()
        .unwrap()
        .to_string();

    let demote = put(&app, &format!("/api/users/{me}/role"), &admin, json!({ "role": "viewer" })).await;
    assert_envelope(&demote, StatusCode::CONFLICT);

    let disable = put(&app, &format!("/api/users/{me}/active"), &admin, json!({ "is_active": false })).await;
    assert_envelope(&disable, StatusCode::CONFLICT);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = test_app_with(&[("MAX_CONTENT_LENGTH", "64")]);
    let mut body = registration("bulky", None);
    body["first_name"] = json!("x".repeat(500));
    let res = send(&app, Method::POST, "/api/auth/register", None, Some(body)).await;
    assert_envelope(&res, StatusCode::PAYLOAD_TOO_LARGE);
}
