use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::InterventionOutcome;
use crate::error::CoreError;
use crate::validate::{self, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub intervention_type: String,
    pub description: Option<String>,
    pub intervention_date: Timestamp,
    pub outcome: Option<InterventionOutcome>,
    pub clinician_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIntervention {
    pub intervention_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub intervention_date: Timestamp,
    #[serde(default)]
    pub outcome: Option<InterventionOutcome>,
    /// Defaults to the user recording the intervention.
    #[serde(default)]
    pub clinician_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewIntervention {
    pub fn into_intervention(self, patient_id: Uuid, recorded_by: Uuid, now: Timestamp) -> Intervention {
        Intervention {
            id: Uuid::new_v4(),
            patient_id,
            intervention_type: self.intervention_type.trim().to_string(),
            description: self.description,
            intervention_date: crate::clock::truncate(self.intervention_date),
            outcome: self.outcome,
            clinician_id: Some(self.clinician_id.unwrap_or(recorded_by)),
            notes: self.notes,
            created_at: now,
        }
    }
}

impl Validate for NewIntervention {
    fn validate(&self) -> Result<(), CoreError> {
        validate::required("intervention_type", &self.intervention_type, 100)
    }
}
