pub mod candidates;
pub mod config;
pub mod error;
pub mod forms;
pub mod listings;
pub mod session;
pub mod telemetry;
