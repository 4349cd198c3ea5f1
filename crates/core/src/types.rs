/// Machine identifiers are stable string keys taken from configuration
/// (e.g. `Machine_001`).
pub type MachineId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
