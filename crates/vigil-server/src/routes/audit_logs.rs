use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use vigil_auth::Permission;
use vigil_core::models::audit::AuditLogEntry;
use vigil_core::pagination::{Page, PageParams};
use vigil_storage::audit::{self, AuditFilter};

use crate::error::ApiError;
use crate::extract::{ApiQuery, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub user_id: Option<Uuid>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> Result<Json<Page<AuditLogEntry>>, ApiError> {
    current.require(Permission::ReadAudit)?;
    let filter = AuditFilter {
        user_id: query.user_id,
        resource_type: query.resource_type,
        resource_id: query.resource_id,
    };
    let page = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    let page = state
        .db
        .call(move |conn| audit::list(conn, &filter, &page))
        .await?;
    Ok(Json(page))
}
