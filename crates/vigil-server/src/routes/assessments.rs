use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_auth::Permission;
use vigil_core::models::assessment::{NewRiskAssessment, RiskAssessment};
use vigil_core::pagination::{Page, PageParams};
use vigil_core::validate::Validate;
use vigil_storage::assessments;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::routes::{create_for_patient, list_for_patient};
use crate::state::AppState;

pub async fn list_assessments(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Page<RiskAssessment>>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let page =
        list_for_patient(&state, patient_id, page, assessments::list_for_patient).await?;
    Ok(Json(page))
}

pub async fn create_assessment(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<NewRiskAssessment>,
) -> Result<(StatusCode, Json<RiskAssessment>), ApiError> {
    current.require(Permission::WriteClinical)?;
    input.validate()?;

    let assessment =
        input.into_assessment(patient_id, Some(current.id()), vigil_core::clock::now());
    let audit = AuditEvent::new("create", "risk_assessment", assessment.id, Some(current.id()))
        .with_details(json!({
            "patient_id": patient_id,
            "risk_score": assessment.risk_score,
        }));
    let assessment =
        create_for_patient(&state, patient_id, assessment, audit, assessments::insert).await?;
    Ok((StatusCode::CREATED, Json(assessment)))
}

pub async fn get_assessment(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<RiskAssessment>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let assessment = state
        .db
        .call(move |conn| assessments::get(conn, id))
        .await?;
    Ok(Json(assessment))
}
