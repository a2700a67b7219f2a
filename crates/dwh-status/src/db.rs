use rusqlite::Connection;

use crate::error::Result;

/// Initialise the `schedule_status` table. Safe to call on every startup.
///
/// `tracked_name` is UNIQUE so the upsert in [`crate::StatusStore`] can rely
/// on `ON CONFLICT` instead of a read-then-write.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schedule_status (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            tracked_name   TEXT    NOT NULL UNIQUE,
            last_executed  TEXT    NOT NULL,   -- RFC3339
            success        INTEGER NOT NULL CHECK (success IN (0, 1))
        );",
    )?;
    Ok(())
}
