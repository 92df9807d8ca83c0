use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vigil_core::models::lab::{LabResult, reference_flag};
use vigil_core::pagination::{Page, PageParams};

use crate::codec;
use crate::error::StorageError;

const COLUMNS: &str = "id, patient_id, test_name, test_value, unit, reference_low, reference_high, \
                       test_date, lab_name, status, notes, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<LabResult> {
    let test_value: Option<f64> = row.get("test_value")?;
    let reference_low: Option<f64> = row.get("reference_low")?;
    let reference_high: Option<f64> = row.get("reference_high")?;
    Ok(LabResult {
        id: codec::uuid(row, "id")?,
        patient_id: codec::uuid(row, "patient_id")?,
        test_name: row.get("test_name")?,
        test_value,
        unit: row.get("unit")?,
        reference_low,
        reference_high,
        test_date: codec::ts(row, "test_date")?,
        lab_name: row.get("lab_name")?,
        status: codec::text_enum(row, "status")?,
        notes: row.get("notes")?,
        out_of_range: reference_flag(test_value, reference_low, reference_high),
        created_at: codec::ts(row, "created_at")?,
    })
}

pub fn insert(conn: &Connection, lab: &LabResult) -> Result<(), StorageError> {
    conn.execute(
        &format!(
            "INSERT INTO lab_results ({COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            lab.id.to_string(),
            lab.patient_id.to_string(),
            lab.test_name,
            lab.test_value,
            lab.unit,
            lab.reference_low,
            lab.reference_high,
            codec::ts_to_sql(lab.test_date),
            lab.lab_name,
            lab.status.as_str(),
            lab.notes,
            codec::ts_to_sql(lab.created_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<LabResult, StorageError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM lab_results WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("lab result", id))
}

/// Most recent test first.
pub fn list_for_patient(
    conn: &Connection,
    patient_id: Uuid,
    page: &PageParams,
) -> Result<Page<LabResult>, StorageError> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM lab_results WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM lab_results WHERE patient_id = ?1
         ORDER BY test_date DESC, created_at DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let items = stmt
        .query_map(
            params![patient_id.to_string(), page.limit(), page.offset()],
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total as u64))
}
