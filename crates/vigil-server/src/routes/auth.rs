use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use serde_json::json;

use vigil_audit::AuditEvent;
use vigil_auth::password::{hash_password, verify_password};
use vigil_auth::{AuthError, Permission, TokenKind};
use vigil_core::enums::Role;
use vigil_core::models::user::{NewUser, User};
use vigil_core::validate::Validate;
use vigil_storage::users;

use crate::error::ApiError;
use crate::extract::{ApiJson, CurrentUser};
use crate::middleware::auth::{authenticate, bearer_token, load_active_user};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: &'static str,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Create a user. The very first account becomes a verified admin; after
/// that an admin token is required.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    ApiJson(input): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let actor = match bearer_token(&headers, &uri) {
        Some(token) => Some(authenticate(&state, &token).await?),
        None => None,
    };
    if actor.is_none() && state.db.call(|conn| users::count(conn)).await? > 0 {
        return Err(ApiError::Unauthorized(
            "registration requires an admin token".to_string(),
        ));
    }
    input.validate()?;

    let iterations = state.config.password_hash_iterations;
    let password = input.password.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, iterations)).await??;

    let user = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let (role, verified) = if users::count(&tx)? == 0 {
                (Role::Admin, true)
            } else {
                let actor = actor.as_ref().ok_or_else(|| {
                    ApiError::Unauthorized("registration requires an admin token".to_string())
                })?;
                CurrentUser(actor.clone()).require(Permission::ManageUsers)?;
                (input.role.unwrap_or_default(), false)
            };
            if users::get_by_username(&tx, input.username.trim())?.is_some() {
                return Err(ApiError::Conflict("username already exists".to_string()));
            }

            let user = input.into_user(password_hash, role, verified, vigil_core::clock::now());
            users::insert(&tx, &user)?;
            AuditEvent::new(
                "register",
                "user",
                user.id,
                Some(actor.map_or(user.id, |a| a.id)),
            )
            .with_details(json!({ "username": user.username, "role": role }))
            .commit(&tx);
            tx.commit()?;
            Ok(user)
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn record_failed_login(state: &AppState, username: String) {
    let event = AuditEvent::collection("login_failed", "user", None)
        .with_details(json!({ "username": username }));
    let result = state
        .db
        .call(move |conn| {
            event.commit(conn);
            Ok::<_, vigil_storage::StorageError>(())
        })
        .await;
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed login not audited");
    }
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = req.username.trim().to_string();
    let lookup = username.clone();
    let found = state
        .db
        .call(move |conn| users::get_by_username(conn, &lookup))
        .await?;

    let stored = match &found {
        Some(user) => user.password_hash.clone(),
        None => state.decoy_hash.to_string(),
    };
    let password = req.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?;
    let Some(mut user) = found.filter(|_| matches) else {
        record_failed_login(&state, username).await;
        return Err(AuthError::InvalidCredentials.into());
    };
    if !user.is_active {
        return Err(AuthError::AccountDisabled.into());
    }

    let now = vigil_core::clock::now();
    let id = user.id;
    state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            users::touch_last_login(&tx, id, now)?;
            AuditEvent::new("login", "user", id, Some(id)).commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(())
        })
        .await?;
    user.last_login = Some(now);

    let config = &state.config;
    let access_token = state
        .jwt
        .issue(&user, TokenKind::Access, config.jwt_expiration_secs)?;
    let refresh_token = state
        .jwt
        .issue(&user, TokenKind::Refresh, config.jwt_refresh_expiration_secs)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: Some(refresh_token),
        token_type: "Bearer",
        expires_in: config.jwt_expiration_secs,
        user: Some(user),
    }))
}

/// Trade a refresh token for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = state.jwt.validate(&req.refresh_token, TokenKind::Refresh)?;
    let user = load_active_user(&state, claims.sub).await?;
    let access_token = state
        .jwt
        .issue(&user, TokenKind::Access, state.config.jwt_expiration_secs)?;
    Ok(Json(TokenResponse {
        access_token,
        refresh_token: None,
        token_type: "Bearer",
        expires_in: state.config.jwt_expiration_secs,
        user: None,
    }))
}

pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.0)
}
