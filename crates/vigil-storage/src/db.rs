use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::error::StorageError;

const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../migrations/001_initial.sql"))];

/// Where the database lives, parsed from `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Accepts `sqlite://<path>`, `sqlite:<path>`, `:memory:` or a bare path.
    pub fn parse(url: &str) -> Result<Self, StorageError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(StorageError::InvalidUrl("empty".to_string()));
        }
        let rest = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        if rest == ":memory:" {
            return Ok(DatabaseLocation::Memory);
        }
        if rest.contains("://") {
            return Err(StorageError::InvalidUrl(format!(
                "unsupported scheme in {trimmed}"
            )));
        }
        if rest.is_empty() {
            return Err(StorageError::InvalidUrl(trimmed.to_string()));
        }
        Ok(DatabaseLocation::File(PathBuf::from(rest)))
    }
}

/// Shared handle to the single SQLite connection.
///
/// All access goes through [`Database::call`], which runs the closure on the
/// blocking thread pool so request handlers never block the runtime.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(location: &DatabaseLocation) -> Result<Self, StorageError> {
        let conn = match location {
            DatabaseLocation::Memory => open_memory_connection()?,
            DatabaseLocation::File(path) => open_connection(path)?,
        };
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::from_connection(open_memory_connection()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    ///
    /// The closure may return any error type that storage errors convert
    /// into, so callers can mix repository calls with their own checks.
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

pub fn open_connection(path: &Path) -> Result<Connection, StorageError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

pub fn open_memory_connection() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(())
}

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    apply_migrations(conn, MIGRATIONS)
}

/// Each migration runs in its own transaction, so a failure leaves the
/// schema at the previous version.
fn apply_migrations(conn: &Connection, migrations: &[(i64, &str)]) -> Result<(), StorageError> {
    let current = current_version(conn);
    for &(version, sql) in migrations {
        if version > current {
            tracing::info!(version, "running migration");
            let failed = |e: rusqlite::Error| StorageError::MigrationFailed {
                version,
                reason: e.to_string(),
            };
            let tx = conn.unchecked_transaction().map_err(failed)?;
            tx.execute_batch(sql).map_err(failed)?;
            tx.commit().map_err(failed)?;
        }
    }
    Ok(())
}

fn current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

pub fn schema_version(conn: &Connection) -> Result<i64, StorageError> {
    Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?)
}

/// Liveness check for the health endpoint.
pub fn ping(conn: &Connection) -> Result<(), StorageError> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}
