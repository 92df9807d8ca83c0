use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_auth::Permission;
use vigil_core::models::vital::{NewVitalSign, VitalSign};
use vigil_core::pagination::{Page, PageParams};
use vigil_core::validate::Validate;
use vigil_storage::vitals;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::routes::{create_for_patient, list_for_patient};
use crate::state::AppState;

pub async fn list_vitals(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Page<VitalSign>>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let page = list_for_patient(&state, patient_id, page, vitals::list_for_patient).await?;
    Ok(Json(page))
}

pub async fn create_vital(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<NewVitalSign>,
) -> Result<(StatusCode, Json<VitalSign>), ApiError> {
    current.require(Permission::WriteClinical)?;
    input.validate()?;

    let vital = input.into_vital(patient_id, vigil_core::clock::now());
    let audit = AuditEvent::new("create", "vital_sign", vital.id, Some(current.id()))
        .with_details(json!({ "patient_id": patient_id }));
    let vital = create_for_patient(&state, patient_id, vital, audit, vitals::insert).await?;
    Ok((StatusCode::CREATED, Json(vital)))
}
