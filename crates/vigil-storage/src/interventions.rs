use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vigil_core::models::intervention::Intervention;
use vigil_core::pagination::{Page, PageParams};

use crate::codec;
use crate::error::StorageError;

const COLUMNS: &str = "id, patient_id, intervention_type, description, intervention_date, \
                       outcome, clinician_id, notes, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Intervention> {
    Ok(Intervention {
        id: codec::uuid(row, "id")?,
        patient_id: codec::uuid(row, "patient_id")?,
        intervention_type: row.get("intervention_type")?,
        description: row.get("description")?,
        intervention_date: codec::ts(row, "intervention_date")?,
        outcome: codec::opt_text_enum(row, "outcome")?,
        clinician_id: codec::opt_uuid(row, "clinician_id")?,
        notes: row.get("notes")?,
        created_at: codec::ts(row, "created_at")?,
    })
}

pub fn insert(conn: &Connection, intervention: &Intervention) -> Result<(), StorageError> {
    conn.execute(
        &format!("INSERT INTO interventions ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            intervention.id.to_string(),
            intervention.patient_id.to_string(),
            intervention.intervention_type,
            intervention.description,
            codec::ts_to_sql(intervention.intervention_date),
            intervention.outcome.map(|o| o.as_str()),
            intervention.clinician_id.map(|id| id.to_string()),
            intervention.notes,
            codec::ts_to_sql(intervention.created_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Intervention, StorageError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM interventions WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("intervention", id))
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: Uuid,
    page: &PageParams,
) -> Result<Page<Intervention>, StorageError> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM interventions WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM interventions WHERE patient_id = ?1
         ORDER BY intervention_date DESC, created_at DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let items = stmt
        .query_map(
            params![patient_id.to_string(), page.limit(), page.offset()],
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total as u64))
}
