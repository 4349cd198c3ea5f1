//! Canonical event names published on the [`EventBus`](crate::EventBus).

pub const ALERT_RAISED: &str = "alert.raised";
pub const ALERT_ACKNOWLEDGED: &str = "alert.acknowledged";
pub const MAINTENANCE_RECORDED: &str = "maintenance.recorded";
pub const CYCLE_COMPLETED: &str = "monitor.cycle_completed";
pub const CYCLE_FAILED: &str = "monitor.cycle_failed";
pub const MODEL_RELOADED: &str = "model.reloaded";
