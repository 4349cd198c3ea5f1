//! Aura core domain logic.
//!
//! Pure, database-free building blocks for the machine health monitor:
//! telemetry simulation, health scoring, alert rules, and the machine and
//! maintenance records. Runtime orchestration lives in `aura-pipeline`.

pub mod alert;
pub mod alerting;
pub mod config;
pub mod error;
pub mod health;
pub mod machine;
pub mod maintenance;
pub mod telemetry;
pub mod types;
