use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_auth::Permission;
use vigil_core::models::lab::{LabResult, NewLabResult};
use vigil_core::pagination::{Page, PageParams};
use vigil_core::validate::Validate;
use vigil_storage::labs;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::routes::{create_for_patient, list_for_patient};
use crate::state::AppState;

pub async fn list_labs(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Page<LabResult>>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let page = list_for_patient(&state, patient_id, page, labs::list_for_patient).await?;
    Ok(Json(page))
}

pub async fn create_lab(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<NewLabResult>,
) -> Result<(StatusCode, Json<LabResult>), ApiError> {
    current.require(Permission::WriteClinical)?;
    input.validate()?;

    let lab = input.into_lab_result(patient_id, vigil_core::clock::now());
    let audit = AuditEvent::new("create", "lab_result", lab.id, Some(current.id()))
        .with_details(json!({ "patient_id": patient_id, "test_name": lab.test_name }));
    let lab = create_for_patient(&state, patient_id, lab, audit, labs::insert).await?;
    if lab.out_of_range == Some(true) {
        tracing::info!(lab_id = %lab.id, patient_id = %patient_id, "lab result outside reference range");
    }
    Ok((StatusCode::CREATED, Json(lab)))
}
