pub mod alerts;
pub mod assessments;
pub mod audit_logs;
pub mod auth;
pub mod health;
pub mod interventions;
pub mod labs;
pub mod patients;
pub mod reports;
pub mod users;
pub mod vitals;

use rusqlite::Connection;
use uuid::Uuid;

use vigil_audit::AuditEvent;
use vigil_core::pagination::{Page, PageParams};
use vigil_storage::StorageError;
use vigil_storage::patients as patient_repo;

use crate::error::ApiError;
use crate::state::AppState;

/// Page through one patient's records of a kind. Inactive patients are still
/// readable; unknown ones are 404.
pub(crate) async fn list_for_patient<T, F>(
    state: &AppState,
    patient_id: Uuid,
    page: PageParams,
    list: F,
) -> Result<Page<T>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection, Uuid, &PageParams) -> Result<Page<T>, StorageError> + Send + 'static,
{
    let page = state
        .db
        .call(move |conn| {
            patient_repo::get(conn, patient_id)?;
            list(conn, patient_id, &page)
        })
        .await?;
    Ok(page)
}

/// Store a new record for an active patient and audit it in one transaction.
pub(crate) async fn create_for_patient<T, F>(
    state: &AppState,
    patient_id: Uuid,
    record: T,
    audit: AuditEvent,
    insert: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection, &T) -> Result<(), StorageError> + Send + 'static,
{
    state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            patient_repo::ensure_active(&tx, patient_id)?;
            insert(&tx, &record)?;
            audit.commit(&tx);
            tx.commit()?;
            Ok::<_, ApiError>(record)
        })
        .await
}
