use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::LabStatus;
use crate::error::CoreError;
use crate::validate::{self, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub test_name: String,
    pub test_value: Option<f64>,
    pub unit: Option<String>,
    pub reference_low: Option<f64>,
    pub reference_high: Option<f64>,
    pub test_date: Timestamp,
    pub lab_name: Option<String>,
    pub status: LabStatus,
    pub notes: Option<String>,
    /// Derived from the value and the stored reference interval.
    pub out_of_range: Option<bool>,
    pub created_at: Timestamp,
}

/// Compare a value against its reference interval.
///
/// `None` when there is nothing to compare: no value, or no bound at all.
/// A single bound is checked on its own.
pub fn reference_flag(value: Option<f64>, low: Option<f64>, high: Option<f64>) -> Option<bool> {
    let value = value?;
    if low.is_none() && high.is_none() {
        return None;
    }
    let below = low.is_some_and(|l| value < l);
    let above = high.is_some_and(|h| value > h);
    Some(below || above)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLabResult {
    pub test_name: String,
    #[serde(default)]
    pub test_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_low: Option<f64>,
    #[serde(default)]
    pub reference_high: Option<f64>,
    pub test_date: Timestamp,
    #[serde(default)]
    pub lab_name: Option<String>,
    #[serde(default)]
    pub status: Option<LabStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewLabResult {
    pub fn into_lab_result(self, patient_id: Uuid, now: Timestamp) -> LabResult {
        LabResult {
            id: Uuid::new_v4(),
            patient_id,
            out_of_range: reference_flag(self.test_value, self.reference_low, self.reference_high),
            test_name: self.test_name.trim().to_string(),
            test_value: self.test_value,
            unit: self.unit,
            reference_low: self.reference_low,
            reference_high: self.reference_high,
            test_date: crate::clock::truncate(self.test_date),
            lab_name: self.lab_name,
            status: self.status.unwrap_or_default(),
            notes: self.notes,
            created_at: now,
        }
    }
}

impl Validate for NewLabResult {
    fn validate(&self) -> Result<(), CoreError> {
        validate::required("test_name", &self.test_name, 100)?;
        validate::optional_len("unit", self.unit.as_deref(), 50)?;
        validate::optional_len("lab_name", self.lab_name.as_deref(), 100)?;
        validate::float_range("test_value", self.test_value, f64::MIN, f64::MAX)?;
        validate::float_range("reference_low", self.reference_low, f64::MIN, f64::MAX)?;
        validate::float_range("reference_high", self.reference_high, f64::MIN, f64::MAX)?;
        if let (Some(low), Some(high)) = (self.reference_low, self.reference_high)
            && low > high
        {
            return Err(CoreError::validation(
                "reference_low",
                "must not exceed reference_high",
            ));
        }
        Ok(())
    }
}
