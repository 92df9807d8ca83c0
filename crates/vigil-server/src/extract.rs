//! Request extractors that reject with the JSON error envelope.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;

use vigil_auth::{Permission, RoleExt};
use vigil_core::models::user::User;

use crate::error::ApiError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// The authenticated caller, placed in request extensions by
/// [`crate::middleware::auth::require_auth`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.0.role.allows(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.0.id,
                role = %self.0.role,
                permission = %permission,
                "permission denied"
            );
            Err(ApiError::Forbidden(format!(
                "{} role lacks {permission} permission",
                self.0.role
            )))
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
    }
}
