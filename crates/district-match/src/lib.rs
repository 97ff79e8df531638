pub mod config;
pub mod error;
pub mod recommend;
pub mod telemetry;
