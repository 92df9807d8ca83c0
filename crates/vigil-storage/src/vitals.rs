use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vigil_core::models::vital::VitalSign;
use vigil_core::pagination::{Page, PageParams};

use crate::codec;
use crate::error::StorageError;

const COLUMNS: &str = "id, patient_id, measurement_time, heart_rate, systolic_bp, diastolic_bp, \
                       respiratory_rate, temperature, oxygen_saturation, blood_glucose, weight, \
                       created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<VitalSign> {
    Ok(VitalSign {
        id: codec::uuid(row, "id")?,
        patient_id: codec::uuid(row, "patient_id")?,
        measurement_time: codec::ts(row, "measurement_time")?,
        heart_rate: row.get("heart_rate")?,
        systolic_bp: row.get("systolic_bp")?,
        diastolic_bp: row.get("diastolic_bp")?,
        respiratory_rate: row.get("respiratory_rate")?,
        temperature: row.get("temperature")?,
        oxygen_saturation: row.get("oxygen_saturation")?,
        blood_glucose: row.get("blood_glucose")?,
        weight: row.get("weight")?,
        created_at: codec::ts(row, "created_at")?,
    })
}

pub fn insert(conn: &Connection, vital: &VitalSign) -> Result<(), StorageError> {
    conn.execute(
        &format!(
            "INSERT INTO vital_signs ({COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            vital.id.to_string(),
            vital.patient_id.to_string(),
            codec::ts_to_sql(vital.measurement_time),
            vital.heart_rate,
            vital.systolic_bp,
            vital.diastolic_bp,
            vital.respiratory_rate,
            vital.temperature,
            vital.oxygen_saturation,
            vital.blood_glucose,
            vital.weight,
            codec::ts_to_sql(vital.created_at),
        ],
    )?;
    Ok(())
}

/// Newest measurement first.
pub fn list_for_patient(
    conn: &Connection,
    patient_id: Uuid,
    page: &PageParams,
) -> Result<Page<VitalSign>, StorageError> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM vital_signs WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM vital_signs WHERE patient_id = ?1
         ORDER BY measurement_time DESC, created_at DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let items = stmt
        .query_map(
            params![patient_id.to_string(), page.limit(), page.offset()],
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total as u64))
}

pub fn latest_for_patient(conn: &Connection, patient_id: Uuid) -> Result<Option<VitalSign>, StorageError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {COLUMNS} FROM vital_signs WHERE patient_id = ?1
                 ORDER BY measurement_time DESC, created_at DESC LIMIT 1"
            ),
            params![patient_id.to_string()],
            from_row,
        )
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_connection;
    use crate::patients;
    use vigil_core::models::vital::NewVitalSign;

    fn reading(at: &str, heart_rate: i32) -> NewVitalSign {
        NewVitalSign {
            measurement_time: Some(at.parse().unwrap()),
            heart_rate: Some(heart_rate),
            ..Default::default()
        }
    }

    #[test]
    fn newest_first() {
        let conn = open_memory_connection().unwrap();
        let patient = patients::tests::sample_patient("MRN-1", "Sam", "Okafor");
        patients::insert(&conn, &patient).unwrap();

        let now = vigil_core::clock::now();
        for (at, hr) in [
            ("2024-05-01T08:00:00Z", 70),
            ("2024-05-01T12:00:00Z", 95),
            ("2024-05-01T10:00:00Z", 80),
        ] {
            insert(&conn, &reading(at, hr).into_vital(patient.id, now)).unwrap();
        }

        let page = list_for_patient(&conn, patient.id, &PageParams::default()).unwrap();
        let rates: Vec<_> = page.items.iter().map(|v| v.heart_rate.unwrap()).collect();
        assert_eq!(rates, [95, 80, 70]);

        let latest = latest_for_patient(&conn, patient.id).unwrap().unwrap();
        assert_eq!(latest.heart_rate, Some(95));
    }

    #[test]
    fn schema_enforces_check_constraints() {
        let conn = open_memory_connection().unwrap();
        let patient = patients::tests::sample_patient("MRN-1", "Sam", "Okafor");
        patients::insert(&conn, &patient).unwrap();

        let mut vital = reading("2024-05-01T08:00:00Z", 70).into_vital(patient.id, vigil_core::clock::now());
        vital.systolic_bp = Some(20);
        let err = insert(&conn, &vital).unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)), "{err:?}");
    }

    #[test]
    fn unknown_patient_rejected_by_foreign_key() {
        let conn = open_memory_connection().unwrap();
        let vital = reading("2024-05-01T08:00:00Z", 70).into_vital(Uuid::new_v4(), vigil_core::clock::now());
        let err = insert(&conn, &vital).unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)), "{err:?}");
    }
}
