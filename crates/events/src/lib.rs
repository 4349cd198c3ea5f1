//! Aura in-process event bus.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`MonitorEvent`]: the event envelope carried on the bus.
//! - [`event_types`]: the dot-separated names published by the monitor.

pub mod bus;
pub mod event_types;

pub use bus::{EventBus, MonitorEvent};
