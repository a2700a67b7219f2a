use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::table::{cell, CsvTable};

/// Columns a file must carry to be loaded into `dwh_users`.
pub const USER_COLUMNS: [&str; 4] = ["external_id", "full_name", "email", "status"];
/// Columns a file must carry to be loaded into `dwh_admin`.
pub const ADMIN_COLUMNS: [&str; 3] = ["username", "password", "email"];
/// Older exports name the external id column `uuid`.
pub const LEGACY_ID_COLUMN: &str = "uuid";

/// One row of `dwh_users`. Empty CSV cells become `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub external_id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub status: Option<i64>,
    /// RFC3339 insertion time.
    pub created_at: String,
    /// RFC3339 insertion time; never changed afterwards.
    pub updated_at: String,
}

/// One row of `dwh_admin`.
///
/// The password is kept exactly as it appears in the file. It is not hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

/// Column positions of the user shape within a specific file.
#[derive(Debug, Clone, Copy)]
pub struct UserColumns {
    external_id: usize,
    full_name: usize,
    email: usize,
    status: usize,
}

impl UserColumns {
    /// Locate the user columns, accepting `uuid` in place of `external_id`.
    pub fn locate(table: &CsvTable) -> Option<Self> {
        let external_id = table
            .column_index(USER_COLUMNS[0])
            .or_else(|| table.column_index(LEGACY_ID_COLUMN))?;
        Some(Self {
            external_id,
            full_name: table.column_index("full_name")?,
            email: table.column_index("email")?,
            status: table.column_index("status")?,
        })
    }

    /// Build the record for data row `line` (0-based) stamped with `now`.
    pub fn record(&self, row: &[String], line: usize, now: &str) -> Result<UserRecord> {
        Ok(UserRecord {
            external_id: cell(row, self.external_id).map(str::to_string),
            full_name: cell(row, self.full_name).map(str::to_string),
            email: cell(row, self.email).map(str::to_string),
            status: cell(row, self.status)
                .map(|raw| parse_status(raw, line))
                .transpose()?,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
    }
}

/// Column positions of the admin shape within a specific file.
#[derive(Debug, Clone, Copy)]
pub struct AdminColumns {
    username: usize,
    password: usize,
    email: usize,
}

impl AdminColumns {
    pub fn locate(table: &CsvTable) -> Option<Self> {
        Some(Self {
            username: table.column_index(ADMIN_COLUMNS[0])?,
            password: table.column_index(ADMIN_COLUMNS[1])?,
            email: table.column_index(ADMIN_COLUMNS[2])?,
        })
    }

    pub fn record(&self, row: &[String]) -> AdminRecord {
        AdminRecord {
            username: cell(row, self.username).map(str::to_string),
            password: cell(row, self.password).map(str::to_string),
            email: cell(row, self.email).map(str::to_string),
        }
    }
}

/// Integers, or floats with no fractional part ("2.0"), are accepted.
fn parse_status(raw: &str, line: usize) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(IngestError::Parse(format!(
            "invalid status value {raw:?} in data row {}",
            line + 1
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> CsvTable {
        CsvTable::from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn user_record_from_row() {
        let t = table("external_id,full_name,email,status\nu-1,Ann Lee,ann@x.io,1\n");
        let cols = UserColumns::locate(&t).unwrap();
        let rec = cols.record(&t.rows()[0], 0, "2026-01-01T00:00:00Z").unwrap();
        assert_eq!(rec.external_id.as_deref(), Some("u-1"));
        assert_eq!(rec.full_name.as_deref(), Some("Ann Lee"));
        assert_eq!(rec.status, Some(1));
        assert_eq!(rec.created_at, rec.updated_at);
    }

    #[test]
    fn empty_cells_become_none() {
        let t = table("external_id,full_name,email,status\nu-2,,,\n");
        let cols = UserColumns::locate(&t).unwrap();
        let rec = cols.record(&t.rows()[0], 0, "now").unwrap();
        assert_eq!(rec.full_name, None);
        assert_eq!(rec.email, None);
        assert_eq!(rec.status, None);
    }

    #[test]
    fn legacy_uuid_column_is_accepted() {
        let t = table("uuid,full_name,email,status\nabc,B,b@x.io,0\n");
        let cols = UserColumns::locate(&t).unwrap();
        let rec = cols.record(&t.rows()[0], 0, "now").unwrap();
        assert_eq!(rec.external_id.as_deref(), Some("abc"));
    }

    #[test]
    fn float_status_with_zero_fraction() {
        assert_eq!(parse_status("2.0", 0).unwrap(), 2);
        assert!(parse_status("2.5", 0).is_err());
    }

    #[test]
    fn non_numeric_status_names_the_row() {
        let err = parse_status("active", 4).unwrap_err();
        assert!(err.to_string().contains("data row 5"));
    }

    #[test]
    fn admin_shape_requires_all_three() {
        assert!(AdminColumns::locate(&table("username,email\n")).is_none());
        let t = table("email,password,username\nroot@x.io,hunter2,root\n");
        let rec = AdminColumns::locate(&t).unwrap().record(&t.rows()[0]);
        assert_eq!(rec.username.as_deref(), Some("root"));
        assert_eq!(rec.password.as_deref(), Some("hunter2"));
    }
}
