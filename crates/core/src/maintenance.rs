//! Maintenance activity records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{MachineId, Timestamp};

/// Technician recorded when the request names none.
pub const DEFAULT_TECHNICIAN: &str = "System";

/// Health points restored by a repair or replacement.
pub const MAINTENANCE_HEALTH_BONUS: f64 = 20.0;

/// Days until the next scheduled maintenance after any activity.
pub const MAINTENANCE_INTERVAL_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Inspection,
    Repair,
    Replacement,
    Calibration,
}

impl ActivityType {
    /// Whether the activity restores health points.
    pub fn restores_health(self) -> bool {
        matches!(self, Self::Repair | Self::Replacement)
    }
}

/// Maintenance request as submitted by an operator.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMaintenanceLog {
    pub machine_id: MachineId,
    pub activity_type: ActivityType,
    pub description: String,
    #[serde(default)]
    pub technician: Option<String>,
    /// Minutes spent.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub parts_used: Vec<String>,
    #[serde(default)]
    pub cost: Option<f64>,
}

impl NewMaintenanceLog {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.machine_id.trim().is_empty() {
            return Err(CoreError::Validation("machine_id must not be empty".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(CoreError::Validation("description must not be empty".to_string()));
        }
        if let Some(cost) = self.cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(CoreError::Validation(
                    "cost must be a non-negative number".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Stamp the request into an immutable log entry.
    pub fn into_log(self, now: Timestamp) -> MaintenanceLog {
        MaintenanceLog {
            log_id: Uuid::now_v7(),
            machine_id: self.machine_id,
            activity_type: self.activity_type,
            description: self.description,
            technician: self
                .technician
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TECHNICIAN.to_string()),
            timestamp: now,
            duration: self.duration,
            parts_used: self.parts_used,
            cost: self.cost.unwrap_or(0.0),
        }
    }
}

/// Append-only record of one maintenance activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceLog {
    pub log_id: Uuid,
    pub machine_id: MachineId,
    pub activity_type: ActivityType,
    pub description: String,
    pub technician: String,
    pub timestamp: Timestamp,
    pub duration: Option<u32>,
    pub parts_used: Vec<String>,
    pub cost: f64,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn request(activity_type: ActivityType) -> NewMaintenanceLog {
        NewMaintenanceLog {
            machine_id: "Machine_001".to_string(),
            activity_type,
            description: "Replaced bearing".to_string(),
            technician: None,
            duration: Some(45),
            parts_used: vec!["bearing".to_string()],
            cost: None,
        }
    }

    #[test]
    fn only_repair_and_replacement_restore_health() {
        assert!(ActivityType::Repair.restores_health());
        assert!(ActivityType::Replacement.restores_health());
        assert!(!ActivityType::Inspection.restores_health());
        assert!(!ActivityType::Calibration.restores_health());
    }

    #[test]
    fn defaults_fill_technician_and_cost() {
        let log = request(ActivityType::Repair).into_log(Utc::now());
        assert_eq!(log.technician, DEFAULT_TECHNICIAN);
        assert_eq!(log.cost, 0.0);
        assert_eq!(log.duration, Some(45));
    }

    #[test]
    fn blank_description_is_rejected() {
        let mut req = request(ActivityType::Inspection);
        req.description = "   ".to_string();
        assert_matches!(req.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn negative_cost_is_rejected() {
        let mut req = request(ActivityType::Inspection);
        req.cost = Some(-5.0);
        assert_matches!(req.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn request_deserializes_with_optional_fields_missing() {
        let req: NewMaintenanceLog = serde_json::from_str(
            r#"{"machine_id":"Machine_002","activity_type":"calibration","description":"Sensor check"}"#,
        )
        .unwrap();
        assert_eq!(req.activity_type, ActivityType::Calibration);
        assert!(req.parts_used.is_empty());
        assert!(req.validate().is_ok());
    }
}
