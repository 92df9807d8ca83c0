use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted audit log row. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub occurred_at: Timestamp,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
}
