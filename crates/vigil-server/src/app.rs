use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::middleware as axum_mw;
use axum::routing::{get, post, put};

use crate::error::ApiError;
use crate::middleware::auth::require_auth;
use crate::middleware::request_log::request_log;
use crate::middleware::security::{cors_layer, with_security_headers};
use crate::routes;
use crate::state::AppState;

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api", get(routes::health::api_info))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/refresh", post(routes::auth::refresh));

    let protected = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        // Users
        .route("/api/users", get(routes::users::list_users))
        .route("/api/users/{id}/role", put(routes::users::update_role))
        .route("/api/users/{id}/active", put(routes::users::set_active))
        // Patients
        .route(
            "/api/patients",
            get(routes::patients::list_patients).post(routes::patients::create_patient),
        )
        .route(
            "/api/patients/{id}",
            get(routes::patients::get_patient)
                .put(routes::patients::update_patient)
                .delete(routes::patients::delete_patient),
        )
        // Clinical records
        .route(
            "/api/patients/{id}/vitals",
            get(routes::vitals::list_vitals).post(routes::vitals::create_vital),
        )
        .route(
            "/api/patients/{id}/labs",
            get(routes::labs::list_labs).post(routes::labs::create_lab),
        )
        .route(
            "/api/patients/{id}/risk-assessments",
            get(routes::assessments::list_assessments)
                .post(routes::assessments::create_assessment),
        )
        .route(
            "/api/risk/assessments/{id}",
            get(routes::assessments::get_assessment),
        )
        .route(
            "/api/patients/{id}/alerts",
            get(routes::alerts::list_patient_alerts).post(routes::alerts::create_alert),
        )
        .route(
            "/api/patients/{id}/interventions",
            get(routes::interventions::list_interventions)
                .post(routes::interventions::create_intervention),
        )
        // Alerts
        .route("/api/alerts", get(routes::alerts::list_alerts))
        .route(
            "/api/alerts/{id}/acknowledge",
            post(routes::alerts::acknowledge_alert),
        )
        .route("/api/alerts/{id}/resolve", post(routes::alerts::resolve_alert))
        // Reports
        .route(
            "/api/reports/patients/{id}/summary",
            get(routes::reports::patient_summary),
        )
        .route(
            "/api/reports/patients/export",
            get(routes::reports::export_patients),
        )
        // Audit
        .route("/api/audit-logs", get(routes::audit_logs::list_audit_logs))
        .route_layer(axum_mw::from_fn_with_state(state.clone(), require_auth));

    let router = public
        .merge(protected)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_content_length))
        .layer(axum_mw::from_fn(request_log))
        .layer(cors_layer(&state.config));

    with_security_headers(router).with_state(state)
}
