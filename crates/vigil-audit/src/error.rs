use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to persist audit event: {0}")]
    Storage(#[from] vigil_storage::StorageError),
}
