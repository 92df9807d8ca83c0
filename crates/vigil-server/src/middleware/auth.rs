use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, Uri, header};
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;

use vigil_auth::{AuthError, TokenKind};
use vigil_core::models::user::User;
use vigil_storage::{StorageError, users};

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Pull a bearer token from the `Authorization` header, falling back to the
/// `access_token` query parameter.
pub fn bearer_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_string());
    }
    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.access_token)
        .filter(|t| !t.is_empty())
}

/// Validate an access token and load its user. Unknown or deactivated users
/// are rejected.
pub async fn authenticate(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = state.jwt.validate(token, TokenKind::Access)?;
    load_active_user(state, claims.sub).await
}

pub async fn load_active_user(state: &AppState, id: uuid::Uuid) -> Result<User, ApiError> {
    let user = state
        .db
        .call(move |conn| users::get(conn, id))
        .await
        .map_err(|e| match e {
            StorageError::NotFound { .. } => ApiError::from(AuthError::InvalidToken(
                "user no longer exists".to_string(),
            )),
            other => other.into(),
        })?;
    if !user.is_active {
        return Err(AuthError::AccountDisabled.into());
    }
    Ok(user)
}

/// JWT validation middleware.
///
/// On success, inserts [`CurrentUser`] into request extensions for handlers
/// to use.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers(), req.uri())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let user = authenticate(&state, &token).await?;
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
