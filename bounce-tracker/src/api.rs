//! Request handlers for the reporting endpoints. All of them are thin
//! reads over the store; `/refresh` is the one that triggers work.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::error::{PipelineError, StoreError};
use crate::router::AppState;
use crate::schedule::ScheduledJob;
use crate::types::{BounceRecord, FetchLogEntry};

const DEFAULT_LOG_LIMIT: i64 = 10;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("a fetch run is already in progress")]
    RunInProgress,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::RunInProgress => ApiError::RunInProgress,
            PipelineError::Store(e) => ApiError::Store(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::RunInProgress => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            status: "error",
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    service: &'static str,
    timestamp: DateTime<Utc>,
}

pub async fn root() -> Json<impl Serialize> {
    Json(RootResponse {
        status: "running",
        service: "bounce-tracker",
        timestamp: Utc::now(),
    })
}

#[derive(Serialize)]
#[serde(untagged)]
enum BouncedEmailsResponse {
    Data {
        status: &'static str,
        data: Vec<BounceRecord>,
        fetched_at: DateTime<Utc>,
        total_bounced: usize,
    },
    NoData {
        status: &'static str,
        message: &'static str,
    },
}

pub async fn bounced_emails(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.store.get_records().await?;

    let body = match snapshot.fetched_at {
        Some(fetched_at) => BouncedEmailsResponse::Data {
            status: "success",
            total_bounced: snapshot.records.len(),
            data: snapshot.records,
            fetched_at,
        },
        None => BouncedEmailsResponse::NoData {
            status: "no_data",
            message: "No data available yet. Run /refresh to fetch data.",
        },
    };

    Ok(Json(body).into_response())
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<FetchLogEntry>, ApiError> {
    let entry = state.pipeline.run_fetch().await?;
    Ok(Json(entry))
}

#[derive(Deserialize)]
pub struct LogsParams {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct LogsResponse {
    logs: Vec<FetchLogEntry>,
}

pub async fn logs(
    State(state): State<AppState>,
    Query(params): Query<LogsParams>,
) -> Result<Json<impl Serialize>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT).max(0);
    let logs = state.store.get_logs(limit).await?;
    Ok(Json(LogsResponse { logs }))
}

#[derive(Serialize)]
struct ScheduleInfoResponse {
    scheduled_jobs: Vec<ScheduledJob>,
}

pub async fn schedule_info(State(state): State<AppState>) -> Json<impl Serialize> {
    Json(ScheduleInfoResponse {
        scheduled_jobs: state.scheduler.jobs(),
    })
}
