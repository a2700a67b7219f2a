use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use dwh_status::ScheduleStatus;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;

type ErrorReply = (StatusCode, Json<Value>);

/// GET /status — every recorded maintenance outcome.
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScheduleStatus>>, ErrorReply> {
    state.status.list_statuses().map(Json).map_err(|e| {
        warn!(error = %e, "GET /status failed");
        internal(e)
    })
}

/// GET /status/{name} — outcome for one tracked table.
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ScheduleStatus>, ErrorReply> {
    match state.status.get_status(&name) {
        Ok(Some(status)) => Ok(Json(status)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no status recorded for {name}") })),
        )),
        Err(e) => {
            warn!(%name, error = %e, "GET /status/{{name}} failed");
            Err(internal(e))
        }
    }
}

fn internal(e: impl std::fmt::Display) -> ErrorReply {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}
