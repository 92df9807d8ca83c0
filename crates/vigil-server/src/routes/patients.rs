use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_auth::Permission;
use vigil_core::models::patient::{NewPatient, Patient, PatientUpdate};
use vigil_core::pagination::{Page, PageParams};
use vigil_core::validate::Validate;
use vigil_storage::patients::{self, PatientFilter};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

impl PatientQuery {
    pub fn filter(&self) -> PatientFilter {
        PatientFilter {
            active: self.active,
            search: self.search.clone(),
        }
    }

    pub fn page(&self) -> PageParams {
        PageParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

pub async fn list_patients(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<PatientQuery>,
) -> Result<Json<Page<Patient>>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let (filter, page) = (query.filter(), query.page());
    let page = state
        .db
        .call(move |conn| patients::list(conn, &filter, &page))
        .await?;
    Ok(Json(page))
}

pub async fn create_patient(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(input): ApiJson<NewPatient>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    current.require(Permission::WriteClinical)?;
    input.validate()?;

    let patient = input.into_patient(vigil_core::clock::now());
    let actor = current.id();
    let patient = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            patients::insert(&tx, &patient)?;
            AuditEvent::new("create", "patient", patient.id, Some(actor)).commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(patient)
        })
        .await?;

    tracing::info!(patient_id = %patient.id, "patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn get_patient(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    current.require(Permission::ReadClinical)?;
    let patient = state.db.call(move |conn| patients::get(conn, id)).await?;
    Ok(Json(patient))
}

/// Partial update. Absent fields keep their stored values; the merged record
/// is validated as a whole.
pub async fn update_patient(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<PatientUpdate>,
) -> Result<Json<Patient>, ApiError> {
    current.require(Permission::WriteClinical)?;
    let actor = current.id();
    let patient = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut patient = patients::get(&tx, id)?;
            patient.apply(update);
            patient.validate()?;
            patient.updated_at = vigil_core::clock::now();
            patients::update(&tx, &patient)?;
            AuditEvent::new("update", "patient", id, Some(actor)).commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(patient)
        })
        .await?;
    Ok(Json(patient))
}

/// Soft delete. The patient and their history remain readable.
pub async fn delete_patient(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    current.require(Permission::WriteClinical)?;
    let actor = current.id();
    let patient = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let patient = patients::deactivate(&tx, id, vigil_core::clock::now())?;
            AuditEvent::new("deactivate", "patient", id, Some(actor)).commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(patient)
        })
        .await?;
    tracing::info!(patient_id = %id, "patient deactivated");
    Ok(Json(patient))
}
