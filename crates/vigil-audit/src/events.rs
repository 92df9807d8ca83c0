use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use vigil_core::models::audit::AuditLogEntry;

use crate::error::AuditError;

/// A structured audit event for an API action.
///
/// Every event is logged via `tracing`. Events that touch clinical or user
/// data are also written to `audit_logs` in the same transaction as the
/// change they describe.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl ToString,
        user_id: Option<Uuid>,
    ) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: Some(resource_id.to_string()),
            user_id,
            details: None,
        }
    }

    /// An event about a collection rather than one row (exports, listings).
    pub fn collection(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        user_id: Option<Uuid>,
    ) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            user_id,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn emit(&self) {
        info!(
            audit.action = %self.action,
            audit.resource_type = %self.resource_type,
            audit.resource_id = self.resource_id.as_deref().unwrap_or("-"),
            audit.user_id = ?self.user_id,
            "audit event"
        );
    }

    pub fn record(&self, conn: &Connection) -> Result<AuditLogEntry, AuditError> {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            occurred_at: vigil_core::clock::now(),
            user_id: self.user_id,
            action: self.action.clone(),
            resource_type: self.resource_type.clone(),
            resource_id: self.resource_id.clone(),
            details: self.details.clone(),
        };
        vigil_storage::audit::insert(conn, &entry)?;
        Ok(entry)
    }

    /// Emit, then persist. A failed write is logged and swallowed.
    pub fn commit(&self, conn: &Connection) {
        self.emit();
        if let Err(e) = self.record(conn) {
            warn!(
                error = %e,
                audit.action = %self.action,
                audit.resource_type = %self.resource_type,
                "audit event not persisted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::pagination::PageParams;
    use vigil_storage::audit::{AuditFilter, list};
    use vigil_storage::db::open_memory_connection;

    #[test]
    fn record_persists_all_fields() {
        let conn = open_memory_connection().unwrap();
        let actor = Uuid::new_v4();
        let patient = Uuid::new_v4();
        let event = AuditEvent::new("update", "patient", patient, Some(actor))
            .with_details(serde_json::json!({ "fields": ["city"] }));

        let entry = event.record(&conn).unwrap();
        assert_eq!(entry.resource_id, Some(patient.to_string()));

        let page = list(&conn, &AuditFilter::default(), &PageParams::default()).unwrap();
        assert_eq!(page.items, vec![entry]);
    }

    #[test]
    fn collection_events_have_no_resource_id() {
        let conn = open_memory_connection().unwrap();
        AuditEvent::collection("export", "patient", None).commit(&conn);

        let page = list(&conn, &AuditFilter::default(), &PageParams::default()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].resource_id, None);
        assert_eq!(page.items[0].action, "export");
    }

    #[test]
    fn commit_swallows_storage_failures() {
        // No migrations, so there is no audit_logs table.
        let conn = Connection::open_in_memory().unwrap();
        let event = AuditEvent::new("login", "user", Uuid::new_v4(), None);
        assert!(event.record(&conn).is_err());
        event.commit(&conn);
    }

    #[test]
    fn rolled_back_transaction_drops_the_audit_row() {
        let mut conn = open_memory_connection().unwrap();
        {
            let tx = conn.transaction().unwrap();
            AuditEvent::new("create", "patient", Uuid::new_v4(), None).commit(&tx);
        }
        let page = list(&conn, &AuditFilter::default(), &PageParams::default()).unwrap();
        assert_eq!(page.total, 0);
    }
}
