#![allow(dead_code)]

use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use vigil_server::{AppState, Config, build_router};
use vigil_storage::Database;

pub const PASSWORD: &str = "correct-horse-1";

pub fn test_app() -> Router {
    test_app_with(&[])
}

pub fn test_app_with(vars: &[(&str, &str)]) -> Router {
    let mut map: HashMap<String, String> = HashMap::from([
        ("VIGIL_ENV".to_string(), "testing".to_string()),
        ("JWT_SECRET_KEY".to_string(), "integration-secret".to_string()),
    ]);
    for (k, v) in vars {
        map.insert(k.to_string(), v.to_string());
    }
    let config = Config::from_lookup(|k| map.get(k).cloned()).unwrap();
    let db = Database::open_in_memory().unwrap();
    build_router(AppState::new(config, db))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&bytes).to_string();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
        text,
    }
}

pub async fn get(app: &Router, uri: &str, token: &str) -> TestResponse {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> TestResponse {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put(app: &Router, uri: &str, token: &str, body: Value) -> TestResponse {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub fn registration(username: &str, role: Option<&str>) -> Value {
    let mut body = json!({
        "username": username,
        "email": format!("{username}@example.org"),
        "password": PASSWORD,
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    body
}

pub async fn login(app: &Router, username: &str) -> Value {
    let res = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": PASSWORD })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text);
    res.body
}

pub async fn access_token(app: &Router, username: &str) -> String {
    login(app, username).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Register the first account (an admin) and return its access token.
pub async fn bootstrap_admin(app: &Router) -> String {
    let res = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("admin", None)),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    access_token(app, "admin").await
}

/// Have the admin create a user with `role` and return that user's token.
pub async fn user_with_role(app: &Router, admin: &str, username: &str, role: &str) -> String {
    let res = post(app, "/api/auth/register", admin, registration(username, Some(role))).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    access_token(app, username).await
}

pub fn patient_body(mrn: &str, first: &str, last: &str) -> Value {
    json!({
        "mrn": mrn,
        "first_name": first,
        "last_name": last,
        "date_of_birth": "1948-07-21",
        "gender": "M",
        "comorbidities": ["COPD", "type 2 diabetes"],
        "allergies": ["sulfa"],
        "current_medications": { "metformin": "500mg BID" },
    })
}

pub async fn create_patient(app: &Router, token: &str, mrn: &str) -> Value {
    let res = post(app, "/api/patients", token, patient_body(mrn, "Walter", "Reyes")).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    res.body
}

pub fn assert_envelope(res: &TestResponse, status: StatusCode) {
    assert_eq!(res.status, status, "{}", res.text);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["status_code"], status.as_u16());
    assert_eq!(res.body["error"], status.canonical_reason().unwrap());
    assert!(res.body["message"].is_string());
}
