//! vigil-audit
//!
//! Structured audit events, logged through `tracing` and persisted to the
//! `audit_logs` table.

pub mod error;
pub mod events;

pub use error::AuditError;
pub use events::AuditEvent;
