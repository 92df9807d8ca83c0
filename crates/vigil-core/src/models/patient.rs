use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::enums::Gender;
use crate::error::CoreError;
use crate::validate::{self, Validate};

/// Demographic and clinical record for a single patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    /// Medical record number, unique across the platform.
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub gender: Gender,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub insurance_id: Option<String>,
    pub comorbidities: Vec<String>,
    pub allergies: Vec<String>,
    pub current_medications: Map<String, Value>,
    pub admission_date: Option<Timestamp>,
    pub discharge_date: Option<Timestamp>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Merge a partial update into this record. Absent fields are left alone.
    ///
    /// Values are normalized the same way as on creation: the MRN is trimmed
    /// and timestamps are cut to microseconds. An optional field cannot be
    /// cleared through an update, since `null` and absent both mean "keep".
    pub fn apply(&mut self, mut update: PatientUpdate) {
        update.mrn = update.mrn.map(|mrn| mrn.trim().to_string());
        update.admission_date = update.admission_date.map(crate::clock::truncate);
        update.discharge_date = update.discharge_date.map(crate::clock::truncate);

        macro_rules! set {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(v) = update.$field { self.$field = v; })+
            };
        }
        macro_rules! set_opt {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(v) = update.$field { self.$field = Some(v); })+
            };
        }

        set!(
            mrn,
            first_name,
            last_name,
            date_of_birth,
            gender,
            comorbidities,
            allergies,
            current_medications,
            is_active,
        );
        set_opt!(
            phone,
            email,
            address,
            city,
            state,
            zip_code,
            emergency_contact,
            emergency_phone,
            insurance_id,
            admission_date,
            discharge_date,
        );
    }
}

impl Validate for Patient {
    fn validate(&self) -> Result<(), CoreError> {
        validate_demographics(&Demographics {
            mrn: &self.mrn,
            first_name: &self.first_name,
            last_name: &self.last_name,
            phone: self.phone.as_deref(),
            email: self.email.as_deref(),
            address: self.address.as_deref(),
            city: self.city.as_deref(),
            state: self.state.as_deref(),
            zip_code: self.zip_code.as_deref(),
            emergency_contact: self.emergency_contact.as_deref(),
            emergency_phone: self.emergency_phone.as_deref(),
            insurance_id: self.insurance_id.as_deref(),
            comorbidities: &self.comorbidities,
            allergies: &self.allergies,
            admission_date: self.admission_date,
            discharge_date: self.discharge_date,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub gender: Gender,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub emergency_phone: Option<String>,
    #[serde(default)]
    pub insurance_id: Option<String>,
    #[serde(default)]
    pub comorbidities: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub current_medications: Map<String, Value>,
    #[serde(default)]
    pub admission_date: Option<Timestamp>,
    #[serde(default)]
    pub discharge_date: Option<Timestamp>,
}

impl NewPatient {
    pub fn into_patient(self, now: Timestamp) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            mrn: self.mrn.trim().to_string(),
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            phone: self.phone,
            email: self.email,
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            emergency_contact: self.emergency_contact,
            emergency_phone: self.emergency_phone,
            insurance_id: self.insurance_id,
            comorbidities: self.comorbidities,
            allergies: self.allergies,
            current_medications: self.current_medications,
            admission_date: self.admission_date.map(crate::clock::truncate),
            discharge_date: self.discharge_date.map(crate::clock::truncate),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Validate for NewPatient {
    fn validate(&self) -> Result<(), CoreError> {
        validate_demographics(&Demographics {
            mrn: &self.mrn,
            first_name: &self.first_name,
            last_name: &self.last_name,
            phone: self.phone.as_deref(),
            email: self.email.as_deref(),
            address: self.address.as_deref(),
            city: self.city.as_deref(),
            state: self.state.as_deref(),
            zip_code: self.zip_code.as_deref(),
            emergency_contact: self.emergency_contact.as_deref(),
            emergency_phone: self.emergency_phone.as_deref(),
            insurance_id: self.insurance_id.as_deref(),
            comorbidities: &self.comorbidities,
            allergies: &self.allergies,
            admission_date: self.admission_date,
            discharge_date: self.discharge_date,
        })
    }
}

/// Partial update. Every field is optional; `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatientUpdate {
    pub mrn: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub insurance_id: Option<String>,
    pub comorbidities: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub current_medications: Option<Map<String, Value>>,
    pub admission_date: Option<Timestamp>,
    pub discharge_date: Option<Timestamp>,
    /// `true` reactivates a soft-deleted patient.
    pub is_active: Option<bool>,
}

struct Demographics<'a> {
    mrn: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    phone: Option<&'a str>,
    email: Option<&'a str>,
    address: Option<&'a str>,
    city: Option<&'a str>,
    state: Option<&'a str>,
    zip_code: Option<&'a str>,
    emergency_contact: Option<&'a str>,
    emergency_phone: Option<&'a str>,
    insurance_id: Option<&'a str>,
    comorbidities: &'a [String],
    allergies: &'a [String],
    admission_date: Option<Timestamp>,
    discharge_date: Option<Timestamp>,
}

fn validate_demographics(d: &Demographics<'_>) -> Result<(), CoreError> {
    validate::required("mrn", d.mrn, 50)?;
    validate::required("first_name", d.first_name, 50)?;
    validate::required("last_name", d.last_name, 50)?;
    validate::optional_len("phone", d.phone, 20)?;
    if let Some(email) = d.email {
        validate::max_len("email", email, 120)?;
        validate::email("email", email)?;
    }
    validate::optional_len("address", d.address, 255)?;
    validate::optional_len("city", d.city, 50)?;
    validate::optional_len("state", d.state, 50)?;
    validate::optional_len("zip_code", d.zip_code, 10)?;
    validate::optional_len("emergency_contact", d.emergency_contact, 100)?;
    validate::optional_len("emergency_phone", d.emergency_phone, 20)?;
    validate::optional_len("insurance_id", d.insurance_id, 100)?;
    if d.comorbidities.iter().any(|c| c.trim().is_empty()) {
        return Err(CoreError::validation("comorbidities", "entries must not be empty"));
    }
    if d.allergies.iter().any(|a| a.trim().is_empty()) {
        return Err(CoreError::validation("allergies", "entries must not be empty"));
    }
    if let (Some(admitted), Some(discharged)) = (d.admission_date, d.discharge_date)
        && discharged < admitted
    {
        return Err(CoreError::validation(
            "discharge_date",
            "must not be before admission_date",
        ));
    }
    Ok(())
}
