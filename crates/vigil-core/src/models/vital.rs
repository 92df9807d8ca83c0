use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::validate::{self, Validate};

pub const HEART_RATE_RANGE: (i32, i32) = (0, 300);
pub const SYSTOLIC_RANGE: (i32, i32) = (50, 300);
pub const DIASTOLIC_RANGE: (i32, i32) = (30, 200);

/// One set of bedside measurements.
///
/// Units: heart rate in BPM, blood pressure in mmHg, respiratory rate in
/// breaths/min, temperature in Celsius, SpO2 in percent, glucose in mg/dL,
/// weight in kg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSign {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub measurement_time: Timestamp,
    pub heart_rate: Option<i32>,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub respiratory_rate: Option<i32>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub blood_glucose: Option<f64>,
    pub weight: Option<f64>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewVitalSign {
    pub measurement_time: Option<Timestamp>,
    pub heart_rate: Option<i32>,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub respiratory_rate: Option<i32>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub blood_glucose: Option<f64>,
    pub weight: Option<f64>,
}

impl NewVitalSign {
    fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.systolic_bp.is_none()
            && self.diastolic_bp.is_none()
            && self.respiratory_rate.is_none()
            && self.temperature.is_none()
            && self.oxygen_saturation.is_none()
            && self.blood_glucose.is_none()
            && self.weight.is_none()
    }

    pub fn into_vital(self, patient_id: Uuid, now: Timestamp) -> VitalSign {
        VitalSign {
            id: Uuid::new_v4(),
            patient_id,
            measurement_time: self
                .measurement_time
                .map(crate::clock::truncate)
                .unwrap_or(now),
            heart_rate: self.heart_rate,
            systolic_bp: self.systolic_bp,
            diastolic_bp: self.diastolic_bp,
            respiratory_rate: self.respiratory_rate,
            temperature: self.temperature,
            oxygen_saturation: self.oxygen_saturation,
            blood_glucose: self.blood_glucose,
            weight: self.weight,
            created_at: now,
        }
    }
}

impl Validate for NewVitalSign {
    fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::validation(
                "vital_signs",
                "at least one measurement is required",
            ));
        }
        validate::int_range("heart_rate", self.heart_rate, HEART_RATE_RANGE.0, HEART_RATE_RANGE.1)?;
        validate::int_range("systolic_bp", self.systolic_bp, SYSTOLIC_RANGE.0, SYSTOLIC_RANGE.1)?;
        validate::int_range("diastolic_bp", self.diastolic_bp, DIASTOLIC_RANGE.0, DIASTOLIC_RANGE.1)?;
        validate::int_range("respiratory_rate", self.respiratory_rate, 0, i32::MAX)?;
        validate::float_range("temperature", self.temperature, f64::MIN, f64::MAX)?;
        validate::float_range("oxygen_saturation", self.oxygen_saturation, 0.0, 100.0)?;
        validate::non_negative("blood_glucose", self.blood_glucose)?;
        validate::non_negative("weight", self.weight)?;
        Ok(())
    }
}
