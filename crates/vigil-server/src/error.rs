use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use vigil_auth::AuthError;
use vigil_core::error::CoreError;
use vigil_export::ExportError;
use vigil_storage::StorageError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    Validation(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    status_code: u16,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                "An unexpected error occurred".to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Validation(msg) => msg,
        };

        let body = ErrorBody {
            success: false,
            error: status.canonical_reason().unwrap_or("Error"),
            message,
            status_code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation { .. } | CoreError::UnknownVariant { .. } => {
                ApiError::Validation(e.to_string())
            }
            CoreError::InvalidTransition { .. } => ApiError::Conflict(e.to_string()),
            CoreError::Serialization(_) => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} {id} not found"))
            }
            StorageError::Conflict(msg) => ApiError::Conflict(msg),
            StorageError::Constraint(msg) => ApiError::Validation(msg),
            StorageError::Core(core) => core.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::from(e).into()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials
            | AuthError::AccountDisabled
            | AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::WrongTokenKind { .. } => ApiError::Unauthorized(e.to_string()),
            AuthError::MalformedHash | AuthError::InvalidIterations | AuthError::Jwt(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
            StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(rejection.body_text()),
            _ => ApiError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn envelope_shape() {
        let (status, body) = body_json(ApiError::NotFound("patient 1 not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": "Not Found",
                "message": "patient 1 not found",
                "status_code": 404,
            })
        );
    }

    #[tokio::test]
    async fn internal_detail_is_hidden() {
        let (status, body) = body_json(ApiError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert!(!body["message"].as_str().unwrap().contains("disk"));
    }

    #[test]
    fn core_errors_map_to_statuses() {
        let validation: ApiError = CoreError::validation("mrn", "must not be empty").into();
        assert_eq!(validation.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let transition: ApiError = CoreError::InvalidTransition {
            entity: "alert",
            from: "resolved".into(),
            to: "acknowledged".into(),
        }
        .into();
        assert_eq!(transition.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_errors_map_to_statuses() {
        let missing: ApiError = StorageError::not_found("patient", "42").into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let dup: ApiError = StorageError::Conflict("mrn taken".into()).into();
        assert_eq!(dup.status(), StatusCode::CONFLICT);
        let poisoned: ApiError = StorageError::LockPoisoned.into();
        assert_eq!(poisoned.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        let expired: ApiError = AuthError::TokenExpired.into();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        let bad_hash: ApiError = AuthError::MalformedHash.into();
        assert_eq!(bad_hash.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
