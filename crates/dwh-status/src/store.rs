use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, instrument};

use crate::db::init_db;
use crate::error::{Result, StatusError};
use crate::types::ScheduleStatus;

const UPSERT_SQL: &str = "INSERT INTO schedule_status (tracked_name, last_executed, success)
     VALUES (?1, ?2, ?3)
     ON CONFLICT(tracked_name) DO UPDATE SET
         last_executed = excluded.last_executed,
         success       = excluded.success";

/// Thread-safe handle on the `schedule_status` table.
///
/// Each subsystem that writes statuses opens its own `StatusStore` on its own
/// connection; the upsert is a single statement so two stores racing on the
/// same name still leave exactly one row behind.
pub struct StatusStore {
    db: Mutex<Connection>,
}

impl StatusStore {
    /// Wrap `conn`, creating the table if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Insert or overwrite the row for `tracked_name`.
    #[instrument(skip(self, at), fields(at = %at))]
    pub fn record_outcome(
        &self,
        tracked_name: &str,
        at: DateTime<Utc>,
        success: bool,
    ) -> Result<()> {
        validate_name(tracked_name)?;
        let db = self.db.lock().unwrap();
        db.execute(
            UPSERT_SQL,
            rusqlite::params![tracked_name, format_ts(at), success],
        )?;
        debug!("status recorded");
        Ok(())
    }

    /// Record the same outcome for every name in one transaction.
    ///
    /// Either every row is written or none is.
    #[instrument(skip(self, names, at), fields(count = names.len()))]
    pub fn record_outcomes<S: AsRef<str>>(
        &self,
        names: &[S],
        at: DateTime<Utc>,
        success: bool,
    ) -> Result<()> {
        for name in names {
            validate_name(name.as_ref())?;
        }
        let ts = format_ts(at);
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for name in names {
                stmt.execute(rusqlite::params![name.as_ref(), ts, success])?;
            }
        }
        tx.commit()?;
        debug!(success, "statuses recorded");
        Ok(())
    }

    /// Current row for `tracked_name`, or `None` if it has never run.
    pub fn get_status(&self, tracked_name: &str) -> Result<Option<ScheduleStatus>> {
        let db = self.db.lock().unwrap();
        let status = db
            .query_row(
                "SELECT tracked_name, last_executed, success
                 FROM schedule_status WHERE tracked_name = ?1",
                [tracked_name],
                row_to_status,
            )
            .optional()?;
        Ok(status)
    }

    /// Every recorded status, ordered by name.
    pub fn list_statuses(&self) -> Result<Vec<ScheduleStatus>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT tracked_name, last_executed, success
             FROM schedule_status ORDER BY tracked_name",
        )?;
        let rows = stmt
            .query_map([], row_to_status)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleStatus> {
    Ok(ScheduleStatus {
        tracked_name: row.get(0)?,
        last_executed: row.get(1)?,
        success: row.get(2)?,
    })
}

fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StatusError::InvalidName(name.to_string()));
    }
    Ok(())
}
