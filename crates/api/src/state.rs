use std::sync::Arc;

use aura_events::EventBus;
use aura_pipeline::MonitorService;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Live machine state, alerts and maintenance history.
    pub monitor: Arc<MonitorService>,
    /// Event bus feeding the `/api/v1/events` stream.
    pub event_bus: Arc<EventBus>,
    /// Cancelled when the server starts shutting down.
    pub shutdown: CancellationToken,
}
