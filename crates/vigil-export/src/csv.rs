use vigil_core::models::patient::Patient;

use crate::error::ExportError;

pub const PATIENT_CSV_HEADER: [&str; 18] = [
    "id",
    "mrn",
    "first_name",
    "last_name",
    "date_of_birth",
    "gender",
    "phone",
    "email",
    "city",
    "state",
    "zip_code",
    "insurance_id",
    "comorbidities",
    "allergies",
    "admission_date",
    "discharge_date",
    "is_active",
    "created_at",
];

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// One row per patient under [`PATIENT_CSV_HEADER`]. List fields are joined
/// with `;`.
pub fn patients_to_csv(patients: &[Patient]) -> Result<String, ExportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(PATIENT_CSV_HEADER)?;
    for p in patients {
        writer.write_record([
            p.id.to_string(),
            p.mrn.clone(),
            p.first_name.clone(),
            p.last_name.clone(),
            p.date_of_birth.to_string(),
            p.gender.to_string(),
            opt(&p.phone),
            opt(&p.email),
            opt(&p.city),
            opt(&p.state),
            opt(&p.zip_code),
            opt(&p.insurance_id),
            p.comorbidities.join(";"),
            p.allergies.join(";"),
            opt(&p.admission_date),
            opt(&p.discharge_date),
            p.is_active.to_string(),
            p.created_at.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}
