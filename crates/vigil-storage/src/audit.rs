use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use vigil_core::models::audit::AuditLogEntry;
use vigil_core::pagination::{Page, PageParams};

use crate::codec;
use crate::error::StorageError;

const COLUMNS: &str = "id, occurred_at, user_id, action, resource_type, resource_id, details";

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<Uuid>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<AuditLogEntry> {
    Ok(AuditLogEntry {
        id: codec::uuid(row, "id")?,
        occurred_at: codec::ts(row, "occurred_at")?,
        user_id: codec::opt_uuid(row, "user_id")?,
        action: row.get("action")?,
        resource_type: row.get("resource_type")?,
        resource_id: row.get("resource_id")?,
        details: codec::opt_json(row, "details")?,
    })
}

pub fn insert(conn: &Connection, entry: &AuditLogEntry) -> Result<(), StorageError> {
    let details = entry
        .details
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(vigil_core::error::CoreError::from)?;
    conn.execute(
        &format!("INSERT INTO audit_logs ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            entry.id.to_string(),
            codec::ts_to_sql(entry.occurred_at),
            entry.user_id.map(|id| id.to_string()),
            entry.action,
            entry.resource_type,
            entry.resource_id,
            details,
        ],
    )?;
    Ok(())
}

/// Newest first.
pub fn list(
    conn: &Connection,
    filter: &AuditFilter,
    page: &PageParams,
) -> Result<Page<AuditLogEntry>, StorageError> {
    let user = filter.user_id.map(|id| id.to_string());
    const WHERE: &str = "(?1 IS NULL OR user_id = ?1)
         AND (?2 IS NULL OR resource_type = ?2)
         AND (?3 IS NULL OR resource_id = ?3)";

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM audit_logs WHERE {WHERE}"),
        params![user, filter.resource_type, filter.resource_id],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM audit_logs WHERE {WHERE}
         ORDER BY occurred_at DESC, rowid DESC LIMIT ?4 OFFSET ?5"
    ))?;
    let items = stmt
        .query_map(
            params![
                user,
                filter.resource_type,
                filter.resource_id,
                page.limit(),
                page.offset()
            ],
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total as u64))
}
