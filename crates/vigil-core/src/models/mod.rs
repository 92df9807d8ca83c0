pub mod alert;
pub mod assessment;
pub mod audit;
pub mod intervention;
pub mod lab;
pub mod patient;
pub mod user;
pub mod vital;
