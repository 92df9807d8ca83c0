//! vigil-storage
//!
//! SQLite persistence. One module per table; every repository function takes
//! a borrowed `Connection` so callers decide the transaction boundaries.

mod codec;

pub mod alerts;
pub mod assessments;
pub mod audit;
pub mod db;
pub mod error;
pub mod interventions;
pub mod labs;
pub mod patients;
pub mod users;
pub mod vitals;

pub use db::Database;
pub use error::StorageError;
