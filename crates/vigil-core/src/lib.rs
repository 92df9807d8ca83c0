//! vigil-core
//!
//! Pure domain types, validation rules and paging conventions.
//! No database or HTTP dependency. This is the shared vocabulary of Vigil.

pub mod clock;
pub mod enums;
pub mod error;
pub mod models;
pub mod pagination;
pub mod validate;
