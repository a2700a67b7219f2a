use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dwh_status::StatusStore;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{
    error::{Result, RunnerError},
    schedule::DailySchedule,
    task::MaintenanceTask,
};

/// Cheap, cloneable view of a running [`TaskRunner`].
///
/// Held by the HTTP layer to report the next fire time and by `main` to stop
/// the timer on shutdown.
#[derive(Clone)]
pub struct RunnerHandle {
    next_fire: Arc<Mutex<Option<DateTime<Utc>>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl RunnerHandle {
    /// When the timer fires next; `None` once it has stopped.
    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        *self.next_fire.lock().unwrap()
    }

    pub fn is_armed(&self) -> bool {
        self.next_fire().is_some()
    }

    /// Stop the timer. A run already in progress finishes first.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Fires the maintenance task once a day and records its outcome for every
/// tracked table.
pub struct TaskRunner {
    store: Arc<StatusStore>,
    schedule: DailySchedule,
    tracked: Vec<String>,
    task: Arc<dyn MaintenanceTask>,
    next_fire: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl TaskRunner {
    pub fn new(
        store: Arc<StatusStore>,
        schedule: DailySchedule,
        tracked: Vec<String>,
        task: Arc<dyn MaintenanceTask>,
    ) -> Self {
        Self {
            store,
            schedule,
            tracked,
            task,
            next_fire: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the timer loop on the current Tokio runtime.
    pub fn spawn(self) -> (RunnerHandle, JoinHandle<()>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = RunnerHandle {
            next_fire: Arc::clone(&self.next_fire),
            shutdown_tx: Arc::new(shutdown_tx),
        };
        let join = tokio::spawn(self.run(shutdown_rx));
        (handle, join)
    }

    /// Main loop. Sleeps until the next fire time, runs, re-arms; exits when
    /// `shutdown` broadcasts `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            task = self.task.name(),
            hour = self.schedule.hour,
            minute = self.schedule.minute,
            utc = self.schedule.utc,
            tracked = ?self.tracked,
            "task runner started"
        );

        loop {
            let now = Utc::now();
            let Some(next) = self.arm(now) else {
                error!("schedule produced no next fire time; task runner stopping");
                break;
            };
            info!(next_fire = %next, "task runner armed");
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.run_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("task runner shutting down");
                        break;
                    }
                }
            }
        }

        *self.next_fire.lock().unwrap() = None;
    }

    /// Compute and publish the next fire time after `now`.
    pub fn arm(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let next = self.schedule.next_after(now);
        *self.next_fire.lock().unwrap() = next;
        next
    }

    /// Execute the task once and record the outcome.
    ///
    /// Task failures are logged, never returned. If the success write fails,
    /// one failure write is attempted so the rows do not keep a stale success
    /// flag. Returns `true` only when a success was recorded.
    pub async fn run_once(&self) -> bool {
        let success = match self.execute().await {
            Ok(()) => {
                info!(task = self.task.name(), "maintenance task succeeded");
                true
            }
            Err(e) => {
                error!(task = self.task.name(), error = %e, "maintenance task failed");
                false
            }
        };

        if let Err(e) = self.record(Utc::now(), success).await {
            warn!(error = %e, success, "could not record task outcome");
            if success {
                if let Err(e) = self.record(Utc::now(), false).await {
                    error!(error = %e, "could not record fallback failure outcome");
                }
            }
            return false;
        }
        success
    }

    /// Run the body on its own task so a panic is reported instead of
    /// tearing down the loop.
    async fn execute(&self) -> Result<()> {
        let task = Arc::clone(&self.task);
        match tokio::spawn(async move { task.run().await }).await {
            Ok(result) => result,
            Err(join_err) => Err(RunnerError::Panicked(join_err.to_string())),
        }
    }

    /// rusqlite blocks; the write goes to the blocking pool.
    async fn record(&self, at: DateTime<Utc>, success: bool) -> Result<()> {
        let store = Arc::clone(&self.store);
        let tracked = self.tracked.clone();
        tokio::task::spawn_blocking(move || {
            store.record_outcomes(tracked.as_slice(), at, success)
        })
        .await
        .map_err(|join_err| RunnerError::Panicked(join_err.to_string()))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NoopTask;
    use async_trait::async_trait;
    use chrono::Duration;
    use rusqlite::Connection;

    struct FailingTask;

    #[async_trait]
    impl MaintenanceTask for FailingTask {
        fn name(&self) -> &str {
            "failing"
        }
        async fn run(&self) -> Result<()> {
            Err(RunnerError::Task("disk full".into()))
        }
    }

    struct PanickingTask;

    #[async_trait]
    impl MaintenanceTask for PanickingTask {
        fn name(&self) -> &str {
            "panicking"
        }
        async fn run(&self) -> Result<()> {
            panic!("boom");
        }
    }

    fn tracked() -> Vec<String> {
        vec!["dwh_users".to_string(), "dwh_admin".to_string()]
    }

    fn runner_with(task: Arc<dyn MaintenanceTask>) -> (TaskRunner, Arc<StatusStore>) {
        let store = Arc::new(StatusStore::new(Connection::open_in_memory().unwrap()).unwrap());
        let runner = TaskRunner::new(
            Arc::clone(&store),
            DailySchedule::new(15, 15, true),
            tracked(),
            task,
        );
        (runner, store)
    }

    #[tokio::test]
    async fn success_marks_every_tracked_table() {
        let (runner, store) = runner_with(Arc::new(NoopTask));
        assert!(runner.run_once().await);

        for name in tracked() {
            let status = store.get_status(&name).unwrap().unwrap();
            assert!(status.success, "{name} should be marked successful");
        }
    }

    #[tokio::test]
    async fn failure_marks_every_tracked_table_and_rearms() {
        let (runner, store) = runner_with(Arc::new(FailingTask));
        store
            .record_outcomes(tracked().as_slice(), Utc::now() - Duration::days(1), true)
            .unwrap();
        let before = store.get_status("dwh_users").unwrap().unwrap().last_executed;

        assert!(!runner.run_once().await);

        for name in tracked() {
            let status = store.get_status(&name).unwrap().unwrap();
            assert!(!status.success);
            assert!(status.last_executed > before);
        }
        assert_eq!(store.list_statuses().unwrap().len(), 2);

        let now = Utc::now();
        let next = runner.arm(now).unwrap();
        assert!(next > now);
        assert!(next - now <= Duration::days(1));
    }

    #[tokio::test]
    async fn panic_is_recorded_as_failure() {
        let (runner, store) = runner_with(Arc::new(PanickingTask));
        assert!(!runner.run_once().await);
        assert!(!store.get_status("dwh_admin").unwrap().unwrap().success);
    }

    #[tokio::test]
    async fn rejected_success_write_falls_back_to_failure() {
        let conn = Connection::open_in_memory().unwrap();
        dwh_status::db::init_db(&conn).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_success BEFORE INSERT ON schedule_status
             WHEN NEW.success = 1
             BEGIN SELECT RAISE(ABORT, 'success writes rejected'); END;",
        )
        .unwrap();
        let store = Arc::new(StatusStore::new(conn).unwrap());
        let runner = TaskRunner::new(
            Arc::clone(&store),
            DailySchedule::new(15, 15, true),
            tracked(),
            Arc::new(NoopTask),
        );

        assert!(!runner.run_once().await);
        for name in tracked() {
            let status = store.get_status(&name).unwrap().unwrap();
            assert!(!status.success, "{name} should fall back to failure");
        }
    }

    #[tokio::test]
    async fn spawned_runner_is_armed_until_shutdown() {
        let (runner, _store) = runner_with(Arc::new(NoopTask));
        let (handle, join) = runner.spawn();

        for _ in 0..100 {
            if handle.is_armed() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let next = handle.next_fire().expect("runner should be armed");
        assert!(next > Utc::now());

        handle.shutdown();
        join.await.unwrap();
        assert!(!handle.is_armed());
    }
}
