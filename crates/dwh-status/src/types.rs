use serde::{Deserialize, Serialize};

/// Last recorded outcome of the maintenance task for one tracked table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    /// Logical table name, e.g. `dwh_users`. Unique.
    pub tracked_name: String,
    /// RFC3339 timestamp of the most recent run.
    pub last_executed: String,
    /// Whether that run finished without error.
    pub success: bool,
}
