use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vigil_core::enums::AlertStatus;
use vigil_core::models::alert::Alert;
use vigil_core::pagination::{Page, PageParams};

use crate::codec;
use crate::error::StorageError;

const COLUMNS: &str = "id, patient_id, alert_type, title, message, severity, status, \
                       acknowledged_by, acknowledged_at, resolved_at, created_at";

#[derive(Debug, Clone, Copy, Default)]
pub struct AlertFilter {
    pub patient_id: Option<Uuid>,
    pub status: Option<AlertStatus>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: codec::uuid(row, "id")?,
        patient_id: codec::uuid(row, "patient_id")?,
        alert_type: codec::text_enum(row, "alert_type")?,
        title: row.get("title")?,
        message: row.get("message")?,
        severity: codec::opt_text_enum(row, "severity")?,
        status: codec::text_enum(row, "status")?,
        acknowledged_by: codec::opt_uuid(row, "acknowledged_by")?,
        acknowledged_at: codec::opt_ts(row, "acknowledged_at")?,
        resolved_at: codec::opt_ts(row, "resolved_at")?,
        created_at: codec::ts(row, "created_at")?,
    })
}

pub fn insert(conn: &Connection, alert: &Alert) -> Result<(), StorageError> {
    conn.execute(
        &format!(
            "INSERT INTO alerts ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            alert.id.to_string(),
            alert.patient_id.to_string(),
            alert.alert_type.as_str(),
            alert.title,
            alert.message,
            alert.severity.map(|s| s.as_str()),
            alert.status.as_str(),
            alert.acknowledged_by.map(|id| id.to_string()),
            codec::opt_ts_to_sql(alert.acknowledged_at),
            codec::opt_ts_to_sql(alert.resolved_at),
            codec::ts_to_sql(alert.created_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Alert, StorageError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM alerts WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("alert", id))
}

/// Newest first.
pub fn list(conn: &Connection, filter: &AlertFilter, page: &PageParams) -> Result<Page<Alert>, StorageError> {
    let patient = filter.patient_id.map(|id| id.to_string());
    let status = filter.status.map(|s| s.as_str());

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM alerts
         WHERE (?1 IS NULL OR patient_id = ?1) AND (?2 IS NULL OR status = ?2)",
        params![patient, status],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM alerts
         WHERE (?1 IS NULL OR patient_id = ?1) AND (?2 IS NULL OR status = ?2)
         ORDER BY created_at DESC LIMIT ?3 OFFSET ?4"
    ))?;
    let items = stmt
        .query_map(params![patient, status, page.limit(), page.offset()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total as u64))
}

fn store_status(conn: &Connection, alert: &Alert) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE alerts SET status = ?2, acknowledged_by = ?3, acknowledged_at = ?4, resolved_at = ?5
         WHERE id = ?1",
        params![
            alert.id.to_string(),
            alert.status.as_str(),
            alert.acknowledged_by.map(|id| id.to_string()),
            codec::opt_ts_to_sql(alert.acknowledged_at),
            codec::opt_ts_to_sql(alert.resolved_at),
        ],
    )?;
    Ok(())
}

/// Move an alert to `acknowledged`. Run inside a transaction so the status
/// check and the write see the same row.
pub fn acknowledge(
    conn: &Connection,
    id: Uuid,
    by: Uuid,
    at: jiff::Timestamp,
) -> Result<Alert, StorageError> {
    let mut alert = get(conn, id)?;
    alert.acknowledge(by, at)?;
    store_status(conn, &alert)?;
    Ok(alert)
}

pub fn resolve(conn: &Connection, id: Uuid, at: jiff::Timestamp) -> Result<Alert, StorageError> {
    let mut alert = get(conn, id)?;
    alert.resolve(at)?;
    store_status(conn, &alert)?;
    Ok(alert)
}
