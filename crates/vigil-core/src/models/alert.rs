use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{AlertStatus, AlertType, Severity};
use crate::error::CoreError;
use crate::validate::{self, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub alert_type: AlertType,
    pub title: String,
    pub message: Option<String>,
    pub severity: Option<Severity>,
    pub status: AlertStatus,
    pub acknowledged_by: Option<Uuid>,
    pub acknowledged_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Alert {
    pub fn acknowledge(&mut self, by: Uuid, at: Timestamp) -> Result<(), CoreError> {
        self.status = self.status.transition_to(AlertStatus::Acknowledged)?;
        self.acknowledged_by = Some(by);
        self.acknowledged_at = Some(at);
        Ok(())
    }

    pub fn resolve(&mut self, at: Timestamp) -> Result<(), CoreError> {
        self.status = self.status.transition_to(AlertStatus::Resolved)?;
        self.resolved_at = Some(at);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAlert {
    pub alert_type: AlertType,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl NewAlert {
    pub fn into_alert(self, patient_id: Uuid, now: Timestamp) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            patient_id,
            alert_type: self.alert_type,
            title: self.title.trim().to_string(),
            message: self.message,
            severity: self.severity,
            status: AlertStatus::Active,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_at: None,
            created_at: now,
        }
    }
}

impl Validate for NewAlert {
    fn validate(&self) -> Result<(), CoreError> {
        validate::required("title", &self.title, 200)
    }
}
