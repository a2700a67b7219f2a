//! `dwh-scheduler` — Tokio-based daily maintenance runner.
//!
//! # Overview
//!
//! The [`runner::TaskRunner`] sleeps until the next configured wall-clock
//! time, executes a [`task::MaintenanceTask`], and stamps every tracked table
//! in the status store with the outcome:
//!
//! | Outcome        | `schedule_status.success` | Runner afterwards     |
//! |----------------|---------------------------|-----------------------|
//! | `Ok(())`       | `true`                    | re-armed for tomorrow |
//! | `Err(_)`/panic | `false` (error logged)    | re-armed for tomorrow |
//!
//! Nothing is persisted about the schedule itself; a restart simply arms the
//! next daily fire.

pub mod error;
pub mod runner;
pub mod schedule;
pub mod task;

pub use error::{Result, RunnerError};
pub use runner::{RunnerHandle, TaskRunner};
pub use schedule::DailySchedule;
pub use task::{MaintenanceTask, NoopTask};
