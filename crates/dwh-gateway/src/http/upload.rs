//! CSV upload endpoint — POST /upload/?file_name=<name>
//!
//! The file must already sit in the configured `ingest.base_dir`; only its
//! name travels over HTTP.
//!
//! Response: `{"success": true, "data": {"col": [..], ..}}`
//! Error:    `{"error": "..."}`
//!
//! Both shapes are returned with status 200.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use dwh_core::DwhError;
use dwh_ingest::Preview;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::app::AppState;

#[derive(Deserialize)]
pub struct UploadQuery {
    /// Name of the CSV file relative to the base directory.
    pub file_name: Option<String>,
}

#[derive(Serialize)]
pub struct UploadReply {
    pub success: bool,
    pub data: Preview,
}

#[derive(Serialize)]
pub struct UploadError {
    pub error: String,
}

/// POST /upload/ — ingest one CSV file and echo a preview.
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UploadQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            warn!(error = %rejection, "upload query rejected");
            return failure(rejection.body_text());
        }
    };
    let file_name = match query.file_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return failure("file_name query parameter is required"),
    };

    // rusqlite and file IO block; keep them off the async workers.
    let worker_state = Arc::clone(&state);
    let worker_name = file_name.clone();
    let joined =
        tokio::task::spawn_blocking(move || worker_state.ingest.ingest_file(&worker_name)).await;

    match joined {
        Ok(Ok(report)) => {
            info!(
                file = %file_name,
                users = report.user_rows,
                admins = report.admin_rows,
                "upload ingested"
            );
            Json(UploadReply {
                success: true,
                data: report.preview,
            })
            .into_response()
        }
        Ok(Err(e)) => {
            warn!(file = %file_name, kind = e.kind(), error = %e, "upload failed");
            failure(e.to_string())
        }
        Err(join_err) => {
            let e = DwhError::Internal(join_err.to_string());
            error!(file = %file_name, code = e.code(), error = %e, "upload worker crashed");
            failure(e.to_string())
        }
    }
}

fn failure(message: impl Into<String>) -> Response {
    Json(UploadError {
        error: message.into(),
    })
    .into_response()
}
