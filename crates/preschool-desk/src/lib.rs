pub mod config;
pub mod error;
pub mod school;
pub mod telemetry;
