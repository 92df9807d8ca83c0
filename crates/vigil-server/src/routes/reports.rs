use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_auth::Permission;
use vigil_core::enums::AlertStatus;
use vigil_core::pagination::PageParams;
use vigil_export::PatientSummary;
use vigil_export::report::{ALERT_LIMIT, RECENT_LIMIT};
use vigil_storage::alerts::{self, AlertFilter};
use vigil_storage::{assessments, interventions, labs, patients, vitals};

use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery, CurrentUser};
use crate::routes::patients::PatientQuery;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Markdown,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

pub async fn patient_summary(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<Response, ApiError> {
    current.require(Permission::ReadClinical)?;
    let actor = current.id();

    let summary = state
        .db
        .call(move |conn| {
            let recent = PageParams::new(1, RECENT_LIMIT);
            let patient = patients::get(conn, patient_id)?;
            let active = AlertFilter {
                patient_id: Some(patient_id),
                status: Some(AlertStatus::Active),
            };
            let alert_page = alerts::list(conn, &active, &PageParams::new(1, ALERT_LIMIT))?;
            let summary = PatientSummary::new(patient, vigil_core::clock::now())
                .with_vitals(vitals::latest_for_patient(conn, patient_id)?)
                .with_labs(labs::list_for_patient(conn, patient_id, &recent)?.items)
                .with_assessment(assessments::latest_for_patient(conn, patient_id)?)
                .with_alerts(alert_page.items, alert_page.total)
                .with_interventions(
                    interventions::list_for_patient(conn, patient_id, &recent)?.items,
                );
            AuditEvent::new("view_summary", "patient", patient_id, Some(actor)).commit(conn);
            Ok::<_, ApiError>(summary)
        })
        .await?;

    match query.format {
        ReportFormat::Json => Ok(Json(summary).into_response()),
        ReportFormat::Markdown => {
            let markdown = vigil_export::render::render_summary(&summary, None)?;
            Ok((
                [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
                markdown,
            )
                .into_response())
        }
    }
}

/// CSV of every patient matching the list filters.
pub async fn export_patients(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<PatientQuery>,
) -> Result<Response, ApiError> {
    current.require(Permission::ExportData)?;
    if !state.config.feature_data_export {
        return Err(ApiError::Forbidden("data export is disabled".to_string()));
    }

    let filter = query.filter();
    let actor = current.id();
    let rows = state
        .db
        .call(move |conn| {
            let rows = patients::list_all(conn, &filter)?;
            AuditEvent::collection("export", "patient", Some(actor))
                .with_details(json!({ "count": rows.len(), "format": "csv" }))
                .commit(conn);
            Ok::<_, ApiError>(rows)
        })
        .await?;

    let csv = vigil_export::csv::patients_to_csv(&rows)?;
    tracing::info!(count = rows.len(), "patients exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"patients.csv\""),
        ],
        csv,
    )
        .into_response())
}
