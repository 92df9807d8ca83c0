use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_auth::Permission;
use vigil_core::enums::AlertStatus;
use vigil_core::models::alert::{Alert, NewAlert};
use vigil_core::pagination::{Page, PageParams};
use vigil_core::validate::Validate;
use vigil_storage::alerts::{self, AlertFilter};
use vigil_storage::patients;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::routes::create_for_patient;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    pub status: Option<AlertStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AlertQuery {
    fn page(&self) -> PageParams {
        PageParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

pub async fn list_alerts(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<AlertQuery>,
) -> Result<Json<Page<Alert>>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let filter = AlertFilter {
        patient_id: None,
        status: query.status,
    };
    let page = query.page();
    let page = state
        .db
        .call(move |conn| alerts::list(conn, &filter, &page))
        .await?;
    Ok(Json(page))
}

pub async fn list_patient_alerts(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<AlertQuery>,
) -> Result<Json<Page<Alert>>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let filter = AlertFilter {
        patient_id: Some(patient_id),
        status: query.status,
    };
    let page = query.page();
    let page = state
        .db
        .call(move |conn| {
            patients::get(conn, patient_id)?;
            alerts::list(conn, &filter, &page)
        })
        .await?;
    Ok(Json(page))
}

pub async fn create_alert(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<NewAlert>,
) -> Result<(StatusCode, Json<Alert>), ApiError> {
    current.require(Permission::WriteClinical)?;
    input.validate()?;

    let alert = input.into_alert(patient_id, vigil_core::clock::now());
    let audit = AuditEvent::new("create", "alert", alert.id, Some(current.id()))
        .with_details(json!({ "patient_id": patient_id, "alert_type": alert.alert_type }));
    let alert = create_for_patient(&state, patient_id, alert, audit, alerts::insert).await?;
    tracing::info!(alert_id = %alert.id, alert_type = %alert.alert_type, "alert raised");
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn acknowledge_alert(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Alert>, ApiError> {
    current.require(Permission::WriteClinical)?;
    let actor = current.id();
    let alert = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let alert = alerts::acknowledge(&tx, id, actor, vigil_core::clock::now())?;
            AuditEvent::new("acknowledge", "alert", id, Some(actor)).commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(alert)
        })
        .await?;
    Ok(Json(alert))
}

pub async fn resolve_alert(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Alert>, ApiError> {
    current.require(Permission::WriteClinical)?;
    let actor = current.id();
    let alert = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let alert = alerts::resolve(&tx, id, vigil_core::clock::now())?;
            AuditEvent::new("resolve", "alert", id, Some(actor)).commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(alert)
        })
        .await?;
    Ok(Json(alert))
}
