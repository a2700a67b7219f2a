use axum::{
    routing::{get, post},
    Router,
};
use dwh_core::config::DwhConfig;
use dwh_ingest::IngestRouter;
use dwh_scheduler::RunnerHandle;
use dwh_status::StatusStore;
use std::sync::Arc;

/// Process context — built once in `main`, passed as Arc<AppState> to all
/// Axum handlers.
pub struct AppState {
    pub config: DwhConfig,
    pub ingest: IngestRouter,
    /// Read side of `schedule_status`; the runner writes through its own store.
    pub status: StatusStore,
    pub runner: RunnerHandle,
}

impl AppState {
    pub fn new(
        config: DwhConfig,
        ingest: IngestRouter,
        status: StatusStore,
        runner: RunnerHandle,
    ) -> Self {
        Self {
            config,
            ingest,
            status,
            runner,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/upload", post(crate::http::upload::upload_handler))
        .route("/upload/", post(crate::http::upload::upload_handler))
        .route("/status", get(crate::http::status::list_handler))
        .route("/status/{name}", get(crate::http::status::get_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use chrono::Utc;
    use dwh_scheduler::{DailySchedule, NoopTask, TaskRunner};
    use rusqlite::Connection;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Harness {
        dir: TempDir,
        state: Arc<AppState>,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dwh.db");
        let csv_dir = dir.path().join("csv");
        std::fs::create_dir(&csv_dir).unwrap();

        let mut config = DwhConfig::default();
        config.database.path = db_path.display().to_string();
        config.ingest.base_dir = csv_dir.display().to_string();

        let ingest = IngestRouter::new(Connection::open(&db_path).unwrap(), &csv_dir).unwrap();
        let status = StatusStore::new(Connection::open(&db_path).unwrap()).unwrap();
        let runner_store = Arc::new(StatusStore::new(Connection::open(&db_path).unwrap()).unwrap());
        let (runner, _join) = TaskRunner::new(
            runner_store,
            DailySchedule::new(15, 15, true),
            config.scheduler.tracked_tables.clone(),
            Arc::new(NoopTask),
        )
        .spawn();

        let state = Arc::new(AppState::new(config, ingest, status, runner));
        Harness { dir, state }
    }

    async fn call(state: &Arc<AppState>, method: &str, uri: &str) -> (StatusCode, String) {
        let resp = build_router(Arc::clone(state))
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn upload_missing_file_reports_error() {
        let h = harness();
        let (code, body) = call(&h.state, "POST", "/upload/?file_name=ghost.csv").await;
        assert_eq!(code, StatusCode::OK);
        let v: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v, json!({"error": "File not found."}));
    }

    #[tokio::test]
    async fn upload_without_name_reports_error() {
        let h = harness();
        let (code, body) = call(&h.state, "POST", "/upload").await;
        assert_eq!(code, StatusCode::OK);
        assert!(body.contains("\"error\""));
    }

    #[tokio::test]
    async fn upload_malformed_query_reports_json_error() {
        let h = harness();
        let (code, body) = call(&h.state, "POST", "/upload/?file_name=a.csv&file_name=b.csv").await;
        assert_eq!(code, StatusCode::OK);
        let v: Value = serde_json::from_str(&body).unwrap();
        assert!(v["error"].is_string());
        assert_eq!(h.state.ingest.count_users().unwrap(), 0);
    }

    #[tokio::test]
    async fn upload_users_returns_ordered_preview() {
        let h = harness();
        std::fs::write(
            h.dir.path().join("csv/users.csv"),
            "external_id,full_name,email,status\n\
             u-1,Ann,ann@x.io,1\nu-2,Bo,bo@x.io,0\nu-3,Cy,cy@x.io,1\n",
        )
        .unwrap();

        let (code, body) = call(&h.state, "POST", "/upload/?file_name=users.csv").await;
        assert_eq!(code, StatusCode::OK);
        // columns keep header order on the wire
        assert!(body.starts_with(r#"{"success":true,"data":{"external_id":["u-1","u-2","u-3"],"full_name""#));
        assert_eq!(h.state.ingest.count_users().unwrap(), 3);
        assert_eq!(h.state.ingest.count_admins().unwrap(), 0);
    }

    #[tokio::test]
    async fn status_lookup_round_trip() {
        let h = harness();
        let (code, _) = call(&h.state, "GET", "/status/dwh_users").await;
        assert_eq!(code, StatusCode::NOT_FOUND);

        h.state
            .status
            .record_outcome("dwh_users", Utc::now(), false)
            .unwrap();

        let (code, body) = call(&h.state, "GET", "/status/dwh_users").await;
        assert_eq!(code, StatusCode::OK);
        let v: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["tracked_name"], "dwh_users");
        assert_eq!(v["success"], false);

        let (_, body) = call(&h.state, "GET", "/status").await;
        let list: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn health_reports_armed_timer() {
        let h = harness();
        for _ in 0..100 {
            if h.state.runner.is_armed() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let (code, body) = call(&h.state, "GET", "/health").await;
        assert_eq!(code, StatusCode::OK);
        let v: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["status"], "ok");
        assert!(v["next_fire"].is_string());
        assert_eq!(v["tracked_tables"], json!(["dwh_users", "dwh_admin"]));
    }
}
