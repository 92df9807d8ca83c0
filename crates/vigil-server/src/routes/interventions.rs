use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_auth::Permission;
use vigil_core::models::intervention::{Intervention, NewIntervention};
use vigil_core::pagination::{Page, PageParams};
use vigil_core::validate::Validate;
use vigil_storage::interventions;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::routes::{create_for_patient, list_for_patient};
use crate::state::AppState;

pub async fn list_interventions(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Page<Intervention>>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let page =
        list_for_patient(&state, patient_id, page, interventions::list_for_patient).await?;
    Ok(Json(page))
}

pub async fn create_intervention(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<NewIntervention>,
) -> Result<(StatusCode, Json<Intervention>), ApiError> {
    current.require(Permission::WriteClinical)?;
    input.validate()?;

    let intervention =
        input.into_intervention(patient_id, current.id(), vigil_core::clock::now());
    let audit = AuditEvent::new("create", "intervention", intervention.id, Some(current.id()))
        .with_details(json!({ "patient_id": patient_id }));
    let intervention =
        create_for_patient(&state, patient_id, intervention, audit, interventions::insert).await?;
    Ok((StatusCode::CREATED, Json(intervention)))
}
