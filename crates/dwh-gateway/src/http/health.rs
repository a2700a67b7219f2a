use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health — liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "next_fire": state.runner.next_fire().map(|t| t.to_rfc3339()),
        "tracked_tables": state.config.scheduler.tracked_tables,
    }))
}
