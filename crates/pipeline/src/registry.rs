//! The machine registry: one record per configured machine, shared between
//! the scheduler (single writer) and request handlers (readers).

use std::collections::{BTreeMap, HashMap, VecDeque};

use aura_core::config::{HealthThresholds, MachineSpec};
use aura_core::error::CoreError;
use aura_core::health::ScoreResult;
use aura_core::machine::Machine;
use aura_core::maintenance::ActivityType;
use aura_core::telemetry::TelemetrySample;
use aura_core::types::{MachineId, Timestamp};
use tokio::sync::RwLock;

/// Samples retained per machine for history queries.
pub const HISTORY_LEN: usize = 24;

#[derive(Debug)]
struct Entry {
    machine: Machine,
    history: VecDeque<TelemetrySample>,
}

/// Live machine records keyed by id.
///
/// Every mutation replaces a record under the write lock, so readers see
/// either the previous or the next state of a machine, never a mix.
#[derive(Debug)]
pub struct MachineRegistry {
    entries: RwLock<HashMap<MachineId, Entry>>,
    /// Configuration order, used to iterate machines deterministically.
    order: Vec<MachineId>,
}

impl MachineRegistry {
    pub fn new(specs: &[MachineSpec], now: Timestamp) -> Self {
        let entries = specs
            .iter()
            .map(|spec| {
                (
                    spec.machine_id.clone(),
                    Entry {
                        machine: Machine::from_spec(spec, now),
                        history: VecDeque::with_capacity(HISTORY_LEN),
                    },
                )
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
            order: specs.iter().map(|s| s.machine_id.clone()).collect(),
        }
    }

    /// Machine ids in configuration order.
    pub fn ids(&self) -> &[MachineId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub async fn get(&self, machine_id: &str) -> Option<Machine> {
        self.entries
            .read()
            .await
            .get(machine_id)
            .map(|e| e.machine.clone())
    }

    /// Consistent snapshot of every machine.
    pub async fn all(&self) -> BTreeMap<MachineId, Machine> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(id, e)| (id.clone(), e.machine.clone()))
            .collect()
    }

    /// Oldest-first rolling window of recent samples.
    pub async fn history(&self, machine_id: &str) -> Option<Vec<TelemetrySample>> {
        self.entries
            .read()
            .await
            .get(machine_id)
            .map(|e| e.history.iter().copied().collect())
    }

    /// Install a new sample and its score as one update.
    pub async fn apply_score(
        &self,
        machine_id: &str,
        sample: TelemetrySample,
        score: &ScoreResult,
    ) -> Result<Machine, CoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(machine_id)
            .ok_or_else(|| CoreError::not_found("Machine", machine_id))?;

        entry.machine = entry.machine.with_score(sample, score);
        if entry.history.len() == HISTORY_LEN {
            entry.history.pop_front();
        }
        entry.history.push_back(sample);
        Ok(entry.machine.clone())
    }

    /// Apply a maintenance activity to one machine.
    pub async fn apply_maintenance(
        &self,
        machine_id: &str,
        activity: ActivityType,
        thresholds: &HealthThresholds,
        now: Timestamp,
    ) -> Result<Machine, CoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(machine_id)
            .ok_or_else(|| CoreError::not_found("Machine", machine_id))?;
        entry.machine.apply_maintenance(activity, thresholds, now);
        Ok(entry.machine.clone())
    }

    /// Mean health score over all machines, one decimal; 100 when empty.
    pub async fn system_health(&self) -> f64 {
        let entries = self.entries.read().await;
        if entries.is_empty() {
            return 100.0;
        }
        let total: f64 = entries.values().map(|e| e.machine.health_score).sum();
        ((total / entries.len() as f64) * 10.0).round() / 10.0
    }
}
