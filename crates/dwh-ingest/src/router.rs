use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::db::init_db;
use crate::error::{IngestError, Result};
use crate::preview::{Preview, PREVIEW_ROWS};
use crate::records::{AdminColumns, UserColumns};
use crate::table::CsvTable;

/// Outcome of a successful ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// First rows of the file, column-oriented.
    pub preview: Preview,
    /// The file matched the user shape and its batch was committed.
    pub inserted_users: bool,
    /// The file matched the admin shape and its batch was committed.
    pub inserted_admins: bool,
    pub user_rows: usize,
    pub admin_rows: usize,
}

/// Routes CSV files under a base directory into `dwh_users` / `dwh_admin`.
///
/// Each table is loaded in its own transaction: the user batch is committed
/// before the admin batch starts, so an admin failure leaves users in place.
pub struct IngestRouter {
    db: Mutex<Connection>,
    base_dir: PathBuf,
}

impl IngestRouter {
    /// Wrap `conn`, creating the ingest tables if needed.
    pub fn new(conn: Connection, base_dir: impl Into<PathBuf>) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
            base_dir: base_dir.into(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map an uploaded file name to a path under the base directory.
    ///
    /// Only plain relative names are accepted; anything that could leave the
    /// base directory is reported as not found.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        let name = Path::new(file_name);
        let plain = !file_name.is_empty()
            && name
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(IngestError::NotFound {
                path: file_name.to_string(),
            });
        }
        Ok(self.base_dir.join(name))
    }

    /// Resolve `file_name` against the base directory and ingest it.
    #[instrument(skip(self))]
    pub fn ingest_file(&self, file_name: &str) -> Result<IngestReport> {
        let path = self.resolve(file_name)?;
        self.ingest(&path)
    }

    /// Parse the CSV at `path`, preview it, and load whichever tables its
    /// header matches.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn ingest(&self, path: &Path) -> Result<IngestReport> {
        if !path.is_file() {
            return Err(IngestError::NotFound {
                path: path.display().to_string(),
            });
        }

        let table = CsvTable::from_path(path)?;
        let preview = Preview::from_table(&table, PREVIEW_ROWS);
        debug!(
            columns = table.headers().len(),
            rows = table.len(),
            "csv parsed"
        );

        let mut report = IngestReport {
            preview,
            inserted_users: false,
            inserted_admins: false,
            user_rows: 0,
            admin_rows: 0,
        };

        if let Some(cols) = UserColumns::locate(&table) {
            report.user_rows = self.insert_users(&table, cols)?;
            report.inserted_users = true;
        }
        if let Some(cols) = AdminColumns::locate(&table) {
            report.admin_rows = self.insert_admins(&table, cols)?;
            report.inserted_admins = true;
        }

        if !report.inserted_users && !report.inserted_admins {
            info!("no known column set; preview only");
        }
        Ok(report)
    }

    /// Number of rows currently in `dwh_users`.
    pub fn count_users(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM dwh_users")
    }

    /// Number of rows currently in `dwh_admin`.
    pub fn count_admins(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM dwh_admin")
    }

    // --- private helpers ---------------------------------------------------

    fn insert_users(&self, table: &CsvTable, cols: UserColumns) -> Result<usize> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO dwh_users
                 (external_id, full_name, email, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (line, row) in table.rows().iter().enumerate() {
                let now = chrono::Utc::now().to_rfc3339();
                let rec = cols.record(row, line, &now)?;
                stmt.execute(rusqlite::params![
                    rec.external_id,
                    rec.full_name,
                    rec.email,
                    rec.status,
                    rec.created_at,
                    rec.updated_at,
                ])?;
            }
        }
        // Dropping `tx` on an early return above rolls the batch back.
        tx.commit()?;
        info!(rows = table.len(), "user batch committed");
        Ok(table.len())
    }

    fn insert_admins(&self, table: &CsvTable, cols: AdminColumns) -> Result<usize> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO dwh_admin (username, password, email) VALUES (?1, ?2, ?3)",
            )?;
            for row in table.rows() {
                let rec = cols.record(row);
                stmt.execute(rusqlite::params![rec.username, rec.password, rec.email])?;
            }
        }
        tx.commit()?;
        info!(rows = table.len(), "admin batch committed");
        Ok(table.len())
    }

    fn count(&self, sql: &str) -> Result<i64> {
        let db = self.db.lock().unwrap();
        Ok(db.query_row(sql, [], |r| r.get(0))?)
    }
}
