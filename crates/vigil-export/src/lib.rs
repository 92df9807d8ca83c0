//! vigil-export
//!
//! Patient summary reports (JSON and Markdown via Tera) and CSV exports.

pub mod csv;
pub mod error;
pub mod render;
pub mod report;

pub use error::ExportError;
pub use report::PatientSummary;
