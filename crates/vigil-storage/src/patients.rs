use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vigil_core::models::patient::Patient;
use vigil_core::pagination::{Page, PageParams};

use crate::codec;
use crate::error::StorageError;

const COLUMNS: &str = "id, mrn, first_name, last_name, date_of_birth, gender, phone, email, \
                       address, city, state, zip_code, emergency_contact, emergency_phone, \
                       insurance_id, comorbidities, allergies, current_medications, \
                       admission_date, discharge_date, is_active, created_at, updated_at";

/// Matches when every present criterion holds.
#[derive(Debug, Clone, Default)]
pub struct PatientFilter {
    pub active: Option<bool>,
    /// Case-insensitive substring of MRN, first name or last name.
    pub search: Option<String>,
}

const FILTER_CLAUSE: &str = "(?1 IS NULL OR is_active = ?1)
     AND (?2 IS NULL
          OR lower(mrn) LIKE ?2 ESCAPE '\\'
          OR lower(first_name) LIKE ?2 ESCAPE '\\'
          OR lower(last_name) LIKE ?2 ESCAPE '\\')";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: codec::uuid(row, "id")?,
        mrn: row.get("mrn")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        date_of_birth: codec::date(row, "date_of_birth")?,
        gender: codec::text_enum(row, "gender")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        address: row.get("address")?,
        city: row.get("city")?,
        state: row.get("state")?,
        zip_code: row.get("zip_code")?,
        emergency_contact: row.get("emergency_contact")?,
        emergency_phone: row.get("emergency_phone")?,
        insurance_id: row.get("insurance_id")?,
        comorbidities: codec::json(row, "comorbidities")?,
        allergies: codec::json(row, "allergies")?,
        current_medications: codec::json(row, "current_medications")?,
        admission_date: codec::opt_ts(row, "admission_date")?,
        discharge_date: codec::opt_ts(row, "discharge_date")?,
        is_active: row.get("is_active")?,
        created_at: codec::ts(row, "created_at")?,
        updated_at: codec::ts(row, "updated_at")?,
    })
}

pub fn insert(conn: &Connection, patient: &Patient) -> Result<(), StorageError> {
    conn.execute(
        &format!(
            "INSERT INTO patients ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
             ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
        ),
        params![
            patient.id.to_string(),
            patient.mrn,
            patient.first_name,
            patient.last_name,
            patient.date_of_birth.to_string(),
            patient.gender.as_str(),
            patient.phone,
            patient.email,
            patient.address,
            patient.city,
            patient.state,
            patient.zip_code,
            patient.emergency_contact,
            patient.emergency_phone,
            patient.insurance_id,
            serde_json::to_string(&patient.comorbidities).map_err(vigil_core::error::CoreError::from)?,
            serde_json::to_string(&patient.allergies).map_err(vigil_core::error::CoreError::from)?,
            serde_json::to_string(&patient.current_medications)
                .map_err(vigil_core::error::CoreError::from)?,
            codec::opt_ts_to_sql(patient.admission_date),
            codec::opt_ts_to_sql(patient.discharge_date),
            patient.is_active,
            codec::ts_to_sql(patient.created_at),
            codec::ts_to_sql(patient.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Patient, StorageError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM patients WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("patient", id))
}

/// Fail with `NotFound` unless the patient exists and is active.
///
/// New clinical records may only be attached to active patients.
pub fn ensure_active(conn: &Connection, id: Uuid) -> Result<(), StorageError> {
    let active: Option<bool> = conn
        .query_row(
            "SELECT is_active FROM patients WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match active {
        Some(true) => Ok(()),
        _ => Err(StorageError::not_found("patient", id)),
    }
}

pub fn list(
    conn: &Connection,
    filter: &PatientFilter,
    page: &PageParams,
) -> Result<Page<Patient>, StorageError> {
    let pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(codec::like_pattern);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM patients WHERE {FILTER_CLAUSE}"),
        params![filter.active, pattern],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM patients WHERE {FILTER_CLAUSE}
         ORDER BY last_name, first_name, mrn LIMIT ?3 OFFSET ?4"
    ))?;
    let patients = stmt
        .query_map(
            params![filter.active, pattern, page.limit(), page.offset()],
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(patients, page, total as u64))
}

/// Every patient matching `filter`, unpaged. Used by bulk export.
pub fn list_all(conn: &Connection, filter: &PatientFilter) -> Result<Vec<Patient>, StorageError> {
    let pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(codec::like_pattern);
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM patients WHERE {FILTER_CLAUSE} ORDER BY last_name, first_name, mrn"
    ))?;
    let patients = stmt
        .query_map(params![filter.active, pattern], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(patients)
}

/// Overwrite every mutable column with the values in `patient`.
pub fn update(conn: &Connection, patient: &Patient) -> Result<(), StorageError> {
    let changed = conn.execute(
        "UPDATE patients SET mrn = ?2, first_name = ?3, last_name = ?4, date_of_birth = ?5,
             gender = ?6, phone = ?7, email = ?8, address = ?9, city = ?10, state = ?11,
             zip_code = ?12, emergency_contact = ?13, emergency_phone = ?14, insurance_id = ?15,
             comorbidities = ?16, allergies = ?17, current_medications = ?18,
             admission_date = ?19, discharge_date = ?20, is_active = ?21, updated_at = ?22
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.mrn,
            patient.first_name,
            patient.last_name,
            patient.date_of_birth.to_string(),
            patient.gender.as_str(),
            patient.phone,
            patient.email,
            patient.address,
            patient.city,
            patient.state,
            patient.zip_code,
            patient.emergency_contact,
            patient.emergency_phone,
            patient.insurance_id,
            serde_json::to_string(&patient.comorbidities).map_err(vigil_core::error::CoreError::from)?,
            serde_json::to_string(&patient.allergies).map_err(vigil_core::error::CoreError::from)?,
            serde_json::to_string(&patient.current_medications)
                .map_err(vigil_core::error::CoreError::from)?,
            codec::opt_ts_to_sql(patient.admission_date),
            codec::opt_ts_to_sql(patient.discharge_date),
            patient.is_active,
            codec::ts_to_sql(patient.updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(StorageError::not_found("patient", patient.id));
    }
    Ok(())
}

/// Soft delete: the record and its history stay readable.
pub fn deactivate(conn: &Connection, id: Uuid, now: jiff::Timestamp) -> Result<Patient, StorageError> {
    let changed = conn.execute(
        "UPDATE patients SET is_active = 0, updated_at = ?1 WHERE id = ?2",
        params![codec::ts_to_sql(now), id.to_string()],
    )?;
    if changed == 0 {
        return Err(StorageError::not_found("patient", id));
    }
    get(conn, id)
}
