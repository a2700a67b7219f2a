use clap::Parser;
use dwh_core::{DwhConfig, DwhError};
use dwh_scheduler::{DailySchedule, NoopTask, TaskRunner};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod app;
mod http;

/// CSV ingestion gateway with a daily maintenance timer.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to dwh.toml (falls back to DWH_CONFIG, then ~/.dwh/dwh.toml).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dwh_gateway=info,dwh_ingest=info,dwh_scheduler=info,tower_http=debug".into()),
        )
        .init();

    // load config: --config > DWH_CONFIG env > ~/.dwh/dwh.toml
    let args = Args::parse();
    let config_path = args.config.or_else(|| std::env::var("DWH_CONFIG").ok());
    let config = DwhConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        DwhConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    // initialize SQLite database — single file for all subsystems
    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path)?;
    info!(path = %db_path, "opening SQLite database");

    let db = open_db(&db_path)?;
    dwh_ingest::db::init_db(&db)?;
    dwh_status::db::init_db(&db)?;
    info!("database migrations complete");

    let base_dir = std::path::Path::new(&config.ingest.base_dir);
    if !base_dir.is_dir() {
        warn!(base_dir = %base_dir.display(), "ingest base directory does not exist; uploads will report file not found");
    }

    // build subsystems — each gets its own connection for thread safety
    let ingest = dwh_ingest::IngestRouter::new(open_db(&db_path)?, base_dir)?;
    let status = dwh_status::StatusStore::new(open_db(&db_path)?)?;
    let runner_store = Arc::new(dwh_status::StatusStore::new(open_db(&db_path)?)?);

    let schedule = DailySchedule::new(
        config.scheduler.hour,
        config.scheduler.minute,
        config.scheduler.utc,
    );
    let (runner, runner_join) = TaskRunner::new(
        runner_store,
        schedule,
        config.scheduler.tracked_tables.clone(),
        Arc::new(NoopTask),
    )
    .spawn();

    let state = Arc::new(app::AppState::new(config, ingest, status, runner.clone()));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("dwh gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // stop the timer; an in-flight run finishes first
    runner.shutdown();
    let _ = runner_join.await;
    info!("dwh gateway stopped");
    Ok(())
}

/// Open a connection with the pragmas every subsystem expects.
fn open_db(path: &str) -> dwh_core::Result<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(path).map_err(|e| DwhError::Database(e.to_string()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(|e| DwhError::Database(e.to_string()))?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| DwhError::Database(e.to_string()))?;
    Ok(conn)
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) -> dwh_core::Result<()> {
    match std::path::Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("ctrl-c handler failed: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
