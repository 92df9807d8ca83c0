use jiff::Timestamp;
use serde::Serialize;

use vigil_core::models::alert::Alert;
use vigil_core::models::assessment::RiskAssessment;
use vigil_core::models::intervention::Intervention;
use vigil_core::models::lab::LabResult;
use vigil_core::models::patient::Patient;
use vigil_core::models::vital::VitalSign;

/// How many labs and interventions a summary carries.
pub const RECENT_LIMIT: u32 = 10;

/// How many active alerts a summary lists.
pub const ALERT_LIMIT: u32 = 100;

/// Point-in-time clinical picture of one patient.
#[derive(Debug, Clone, Serialize)]
pub struct PatientSummary {
    pub patient: Patient,
    pub generated_at: Timestamp,
    pub latest_vitals: Option<VitalSign>,
    pub recent_labs: Vec<LabResult>,
    pub out_of_range_labs: usize,
    pub latest_assessment: Option<RiskAssessment>,
    /// Capped at [`ALERT_LIMIT`]; `active_alert_count` is the full total.
    pub active_alerts: Vec<Alert>,
    pub active_alert_count: u64,
    /// Active alerts left out of `active_alerts`.
    pub omitted_alerts: u64,
    pub recent_interventions: Vec<Intervention>,
}

impl PatientSummary {
    pub fn new(patient: Patient, generated_at: Timestamp) -> Self {
        Self {
            patient,
            generated_at,
            latest_vitals: None,
            recent_labs: Vec::new(),
            out_of_range_labs: 0,
            latest_assessment: None,
            active_alerts: Vec::new(),
            active_alert_count: 0,
            omitted_alerts: 0,
            recent_interventions: Vec::new(),
        }
    }

    pub fn with_vitals(mut self, vitals: Option<VitalSign>) -> Self {
        self.latest_vitals = vitals;
        self
    }

    pub fn with_labs(mut self, labs: Vec<LabResult>) -> Self {
        self.out_of_range_labs = labs.iter().filter(|l| l.out_of_range == Some(true)).count();
        self.recent_labs = labs;
        self
    }

    pub fn with_assessment(mut self, assessment: Option<RiskAssessment>) -> Self {
        self.latest_assessment = assessment;
        self
    }

    /// `total` is the number of active alerts, which may exceed `alerts.len()`.
    pub fn with_alerts(mut self, alerts: Vec<Alert>, total: u64) -> Self {
        let shown = alerts.len() as u64;
        self.active_alert_count = total.max(shown);
        self.omitted_alerts = self.active_alert_count - shown;
        self.active_alerts = alerts;
        self
    }

    pub fn with_interventions(mut self, interventions: Vec<Intervention>) -> Self {
        self.recent_interventions = interventions;
        self
    }
}
