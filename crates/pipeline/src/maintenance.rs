//! Append-only maintenance history.

use aura_core::maintenance::MaintenanceLog;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MaintenanceBook {
    logs: RwLock<Vec<MaintenanceLog>>,
}

impl MaintenanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, log: MaintenanceLog) {
        self.logs.write().await.push(log);
    }

    /// Entries for one machine, oldest first.
    pub async fn for_machine(&self, machine_id: &str) -> Vec<MaintenanceLog> {
        self.logs
            .read()
            .await
            .iter()
            .filter(|l| l.machine_id == machine_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.is_empty()
    }
}
