pub mod auth;
pub mod request_log;
pub mod security;
