//! `dwh-status` — the `schedule_status` table: one row per tracked table
//! recording when the maintenance task last ran and whether it succeeded.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StatusError};
pub use store::StatusStore;
pub use types::ScheduleStatus;
