//! vigil-server
//!
//! HTTP API for the healthcare risk platform: authentication, patient
//! records, clinical data, alerts, reports and the audit trail.

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use app::build_router;
pub use config::Config;
pub use state::AppState;
