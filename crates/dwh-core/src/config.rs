use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{DwhError, Result};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_RUN_HOUR: u8 = 15;
pub const DEFAULT_RUN_MINUTE: u8 = 15;

/// Top-level config (dwh.toml + DWH_* env overrides).
///
/// Nested keys are separated by a double underscore in the environment,
/// e.g. `DWH_INGEST__BASE_DIR=/srv/csv`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DwhConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Where uploaded CSV files are looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Base directory every `file_name` is resolved against.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

/// Daily maintenance run and the status rows it stamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Hour of day (0-23) the maintenance task fires.
    #[serde(default = "default_hour")]
    pub hour: u8,
    /// Minute of the hour (0-59).
    #[serde(default = "default_minute")]
    pub minute: u8,
    /// Interpret `hour:minute` as UTC instead of the host's local time.
    #[serde(default)]
    pub utc: bool,
    /// Names written to `schedule_status` after every run.
    #[serde(default = "default_tracked_tables")]
    pub tracked_tables: Vec<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            hour: DEFAULT_RUN_HOUR,
            minute: DEFAULT_RUN_MINUTE,
            utc: false,
            tracked_tables: default_tracked_tables(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_hour() -> u8 {
    DEFAULT_RUN_HOUR
}
fn default_minute() -> u8 {
    DEFAULT_RUN_MINUTE
}
fn default_base_dir() -> String {
    "./csv_files".to_string()
}
fn default_tracked_tables() -> Vec<String> {
    vec!["dwh_users".to_string(), "dwh_admin".to_string()]
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.dwh/dwh.db", home)
}

impl DwhConfig {
    /// Load config from a TOML file with DWH_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.dwh/dwh.toml
    ///
    /// A missing file is not an error; every section falls back to defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: DwhConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("DWH_").split("__"))
            .extract()
            .map_err(|e| DwhError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler or router cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.hour > 23 {
            return Err(DwhError::Config(format!(
                "scheduler.hour must be 0-23, got {}",
                self.scheduler.hour
            )));
        }
        if self.scheduler.minute > 59 {
            return Err(DwhError::Config(format!(
                "scheduler.minute must be 0-59, got {}",
                self.scheduler.minute
            )));
        }
        if self.scheduler.tracked_tables.is_empty() {
            return Err(DwhError::Config(
                "scheduler.tracked_tables must name at least one table".to_string(),
            ));
        }
        if self.ingest.base_dir.trim().is_empty() {
            return Err(DwhError::Config("ingest.base_dir is empty".to_string()));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.dwh/dwh.toml", home)
}
