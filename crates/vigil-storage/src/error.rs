use rusqlite::ffi;
use thiserror::Error;

use vigil_core::error::CoreError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("migration v{version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("blocking task failed: {0}")]
    Task(String),

    #[error("invalid database url: {0}")]
    InvalidUrl(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StorageError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &e {
            let detail = message.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return StorageError::Conflict(detail);
                }
                ffi::SQLITE_CONSTRAINT_CHECK
                | ffi::SQLITE_CONSTRAINT_FOREIGNKEY
                | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return StorageError::Constraint(detail);
                }
                _ => {}
            }
        }
        StorageError::Sqlite(e)
    }
}
