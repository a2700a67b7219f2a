use async_trait::async_trait;
use tracing::info;

use crate::error::Result;

/// The unit of work the runner fires once a day.
#[async_trait]
pub trait MaintenanceTask: Send + Sync {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    async fn run(&self) -> Result<()>;
}

/// Placeholder body: logs and succeeds.
pub struct NoopTask;

#[async_trait]
impl MaintenanceTask for NoopTask {
    fn name(&self) -> &str {
        "noop"
    }

    async fn run(&self) -> Result<()> {
        info!("scheduled task executed successfully");
        Ok(())
    }
}
