//! Aura monitoring pipeline.
//!
//! Owns the live, shared state of the monitor and the loop that drives it:
//!
//! - [`MachineRegistry`]: authoritative per-machine records.
//! - [`AlertStore`]: the bounded alert log behind one mutex.
//! - [`MaintenanceBook`]: append-only maintenance history.
//! - [`MonitorService`]: the read/command facade used by the HTTP layer.
//! - [`MonitorScheduler`]: the periodic generate -> score -> update -> alert
//!   cycle.

pub mod alerts;
pub mod error;
pub mod maintenance;
pub mod registry;
pub mod scheduler;
pub mod service;
mod slots;

pub use alerts::AlertStore;
pub use error::PipelineError;
pub use maintenance::MaintenanceBook;
pub use registry::MachineRegistry;
pub use scheduler::{CycleReport, MonitorScheduler, SchedulerState, SchedulerStatus};
pub use service::MonitorService;
