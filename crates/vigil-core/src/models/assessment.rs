use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::enums::RiskCategory;
use crate::error::CoreError;
use crate::validate::{self, Validate};

pub const RISK_SCORE_RANGE: (f64, f64) = (0.0, 100.0);

/// A recorded risk score. The score and category are supplied by the
/// clinician or an upstream model; Vigil stores them as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub assessment_date: Timestamp,
    pub risk_score: f64,
    pub risk_category: Option<RiskCategory>,
    pub clinical_factors: Map<String, Value>,
    pub alert_triggered: bool,
    pub alert_message: Option<String>,
    /// e.g. `readmission`, `mortality`.
    pub assessment_type: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRiskAssessment {
    #[serde(default)]
    pub assessment_date: Option<Timestamp>,
    pub risk_score: f64,
    #[serde(default)]
    pub risk_category: Option<RiskCategory>,
    #[serde(default)]
    pub clinical_factors: Map<String, Value>,
    #[serde(default)]
    pub alert_triggered: bool,
    #[serde(default)]
    pub alert_message: Option<String>,
    #[serde(default)]
    pub assessment_type: Option<String>,
}

impl NewRiskAssessment {
    pub fn into_assessment(
        self,
        patient_id: Uuid,
        created_by: Option<Uuid>,
        now: Timestamp,
    ) -> RiskAssessment {
        RiskAssessment {
            id: Uuid::new_v4(),
            patient_id,
            assessment_date: self
                .assessment_date
                .map(crate::clock::truncate)
                .unwrap_or(now),
            risk_score: self.risk_score,
            risk_category: self.risk_category,
            clinical_factors: self.clinical_factors,
            alert_triggered: self.alert_triggered,
            alert_message: self.alert_message,
            assessment_type: self.assessment_type,
            created_by,
            created_at: now,
        }
    }
}

impl Validate for NewRiskAssessment {
    fn validate(&self) -> Result<(), CoreError> {
        validate::float_range(
            "risk_score",
            Some(self.risk_score),
            RISK_SCORE_RANGE.0,
            RISK_SCORE_RANGE.1,
        )?;
        validate::optional_len("assessment_type", self.assessment_type.as_deref(), 50)?;
        Ok(())
    }
}
