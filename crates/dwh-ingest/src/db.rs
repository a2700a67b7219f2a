use rusqlite::{Connection, Result};

/// Initialise the ingest tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_users_table(conn)?;
    create_admin_table(conn)?;
    Ok(())
}

fn create_users_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS dwh_users (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id  TEXT,
            full_name    TEXT,
            email        TEXT,
            status       INTEGER,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );",
    )
}

/// Column widths mirror the warehouse schema; SQLite needs CHECKs to enforce them.
/// Passwords are stored as given (plaintext).
fn create_admin_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS dwh_admin (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            username  TEXT CHECK (length(username) <= 100),
            password  TEXT CHECK (length(password) <= 50),
            email     TEXT CHECK (length(email) <= 30)
        );",
    )
}
