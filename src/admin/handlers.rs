use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::viewer::render_log_page;
use crate::http::response::json_error;
use crate::http::server::AppState;
use crate::store::{LogRecord, MAX_LOG_RECORDS};

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub proxy: String,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct RecordsResponse {
    pub total: u64,
    pub records: Vec<LogRecord>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        proxy: state.route.to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn get_log_page(State(state): State<AppState>) -> Response {
    let records = match state.log.list_newest(MAX_LOG_RECORDS).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read request log");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, e);
        }
    };
    let total = match state.log.count().await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count request log");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, e);
        }
    };

    Html(render_log_page(&records, total, &state.route)).into_response()
}

pub async fn get_log_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(MAX_LOG_RECORDS);

    let result = async {
        let records = state.log.list_newest(limit).await?;
        let total = state.log.count().await?;
        Ok::<_, crate::store::StoreError>(RecordsResponse { total, records })
    }
    .await;

    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list request log");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

pub async fn delete_logs(State(state): State<AppState>) -> (StatusCode, Json<DeleteResponse>) {
    match state.log.clear().await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(DeleteResponse {
                success: true,
                deleted_count: Some(deleted),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to clear request log");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DeleteResponse {
                    success: false,
                    deleted_count: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
