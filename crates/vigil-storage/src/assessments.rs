use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vigil_core::models::assessment::RiskAssessment;
use vigil_core::pagination::{Page, PageParams};

use crate::codec;
use crate::error::StorageError;

const COLUMNS: &str = "id, patient_id, assessment_date, risk_score, risk_category, \
                       clinical_factors, alert_triggered, alert_message, assessment_type, \
                       created_by, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<RiskAssessment> {
    Ok(RiskAssessment {
        id: codec::uuid(row, "id")?,
        patient_id: codec::uuid(row, "patient_id")?,
        assessment_date: codec::ts(row, "assessment_date")?,
        risk_score: row.get("risk_score")?,
        risk_category: codec::opt_text_enum(row, "risk_category")?,
        clinical_factors: codec::json(row, "clinical_factors")?,
        alert_triggered: row.get("alert_triggered")?,
        alert_message: row.get("alert_message")?,
        assessment_type: row.get("assessment_type")?,
        created_by: codec::opt_uuid(row, "created_by")?,
        created_at: codec::ts(row, "created_at")?,
    })
}

pub fn insert(conn: &Connection, assessment: &RiskAssessment) -> Result<(), StorageError> {
    let factors = serde_json::to_string(&assessment.clinical_factors)
        .map_err(vigil_core::error::CoreError::from)?;
    conn.execute(
        &format!(
            "INSERT INTO risk_assessments ({COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            assessment.id.to_string(),
            assessment.patient_id.to_string(),
            codec::ts_to_sql(assessment.assessment_date),
            assessment.risk_score,
            assessment.risk_category.map(|c| c.as_str()),
            factors,
            assessment.alert_triggered,
            assessment.alert_message,
            assessment.assessment_type,
            assessment.created_by.map(|id| id.to_string()),
            codec::ts_to_sql(assessment.created_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<RiskAssessment, StorageError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM risk_assessments WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("risk assessment", id))
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: Uuid,
    page: &PageParams,
) -> Result<Page<RiskAssessment>, StorageError> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM risk_assessments WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM risk_assessments WHERE patient_id = ?1
         ORDER BY assessment_date DESC, created_at DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let items = stmt
        .query_map(
            params![patient_id.to_string(), page.limit(), page.offset()],
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total as u64))
}

pub fn latest_for_patient(
    conn: &Connection,
    patient_id: Uuid,
) -> Result<Option<RiskAssessment>, StorageError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {COLUMNS} FROM risk_assessments WHERE patient_id = ?1
                 ORDER BY assessment_date DESC, created_at DESC LIMIT 1"
            ),
            params![patient_id.to_string()],
            from_row,
        )
        .optional()?)
}
