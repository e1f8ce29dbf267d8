pub mod auth;
pub mod clinician;
pub mod patient;
