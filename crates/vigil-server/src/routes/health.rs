use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use vigil_storage::db;

use crate::config::SERVICE_NAME;
use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.db.call(|conn| db::ping(conn)).await {
        Ok(()) => Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "database": "connected",
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": SERVICE_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                    "database": "disconnected",
                })),
            )
                .into_response()
        }
    }
}

/// Service description and endpoint index.
pub async fn api_info(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment.as_str(),
        "data_retention_days": config.data_retention_days,
        "features": {
            "data_export": config.feature_data_export,
        },
        "endpoints": {
            "health": "/api/health",
            "auth": "/api/auth",
            "users": "/api/users",
            "patients": "/api/patients",
            "risk": "/api/risk/assessments",
            "alerts": "/api/alerts",
            "reports": "/api/reports",
            "audit_logs": "/api/audit-logs",
        },
    }))
}
