use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_auth::Permission;
use vigil_core::enums::Role;
use vigil_core::models::user::User;
use vigil_core::pagination::{Page, PageParams};
use vigil_storage::users;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Deserialize)]
pub struct ActiveUpdate {
    pub is_active: bool,
}

pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Page<User>>, ApiError> {
    current.require(Permission::ManageUsers)?;
    let page = state.db.call(move |conn| users::list(conn, &page)).await?;
    Ok(Json(page))
}

pub async fn update_role(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RoleUpdate>,
) -> Result<Json<User>, ApiError> {
    current.require(Permission::ManageUsers)?;
    if id == current.id() && body.role != Role::Admin {
        return Err(ApiError::Conflict(
            "admins cannot change their own role".to_string(),
        ));
    }

    let actor = current.id();
    let user = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let user = users::update_role(&tx, id, body.role, vigil_core::clock::now())?;
            AuditEvent::new("update_role", "user", id, Some(actor))
                .with_details(json!({ "role": body.role }))
                .commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(user)
        })
        .await?;
    Ok(Json(user))
}

pub async fn set_active(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ActiveUpdate>,
) -> Result<Json<User>, ApiError> {
    current.require(Permission::ManageUsers)?;
    if id == current.id() && !body.is_active {
        return Err(ApiError::Conflict(
            "admins cannot deactivate themselves".to_string(),
        ));
    }

    let actor = current.id();
    let user = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let user = users::set_active(&tx, id, body.is_active, vigil_core::clock::now())?;
            let action = if body.is_active { "activate" } else { "deactivate" };
            AuditEvent::new(action, "user", id, Some(actor)).commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(user)
        })
        .await?;
    Ok(Json(user))
}
