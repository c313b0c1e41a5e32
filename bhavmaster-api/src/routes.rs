//! Route handlers for the facade.
//!
//! Validation happens before any pipeline work: date parameters must be
//! DD-MM-YYYY and ranges must be ascending, otherwise the handler answers
//! 400 without touching the provider. Pipeline runs go through
//! `spawn_blocking`; the core is synchronous end to end.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use bhavmaster_core::{process_range, DateOutcome, RangeSummary, StoreError, TradeDate};

use crate::state::AppState;

/// JSON error body for every failing route.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

type Rejection = (StatusCode, Json<ApiError>);

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateParams {
    pub trade_date: Option<String>,
}

/// Outcome of a single-date run.
#[derive(Debug, Serialize)]
pub struct DateRunResponse {
    pub date: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
    pub count: usize,
}

/// Build the facade router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/process", get(process_range_handler))
        .route(
            "/process/date",
            get(process_date_handler).post(process_date_handler),
        )
        .route("/files", get(list_files))
        .route("/files/{filename}", get(download_file))
        .route("/health", get(health))
}

/// Run the pipeline over an inclusive date range.
///
/// GET /process?start_date=DD-MM-YYYY&end_date=DD-MM-YYYY
///
/// Always 200 once the range completes; per-date failures ride in the
/// summary body rather than failing the request.
pub async fn process_range_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<RangeSummary>, Rejection> {
    let (start, end) = validate_range(&params)?;
    info!(start = %start, end = %end, "range run requested");

    let summary = tokio::task::spawn_blocking(move || {
        let pipeline = state.pipeline();
        process_range(&pipeline, start, end)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "range worker failed");
        internal("range run aborted")
    })?;

    Ok(Json(summary))
}

/// Run the pipeline for one trade date.
///
/// GET|POST /process/date?trade_date=DD-MM-YYYY
pub async fn process_date_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Result<Json<DateRunResponse>, Rejection> {
    let date = validate_date(&params)?;
    run_single(state, date).await
}

async fn run_single(
    state: Arc<AppState>,
    date: TradeDate,
) -> Result<Json<DateRunResponse>, Rejection> {
    let result = tokio::task::spawn_blocking(move || {
        let pipeline = state.pipeline();
        pipeline.process_date(date)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "date worker failed");
        internal("date run aborted")
    })?;

    match result {
        Ok(DateOutcome::Written(file)) => {
            let message = format!("{} rows written to {}", file.rows, file.filename);
            Ok(Json(DateRunResponse {
                date: date.to_string(),
                status: "written",
                file: Some(file.filename),
                rows: Some(file.rows),
                message,
            }))
        }
        Ok(DateOutcome::NoTradingData) => Ok(Json(DateRunResponse {
            date: date.to_string(),
            status: "no_trading_data",
            file: None,
            rows: None,
            message: format!("no trading data published for {date}"),
        })),
        Err(e) => {
            error!(date = %date, error = %e, "pipeline run failed");
            Err(internal(e.to_string()))
        }
    }
}

/// List written master files.
///
/// GET /files
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FileListResponse>, Rejection> {
    let files = state.store().list().map_err(|e| {
        error!(error = %e, "file listing failed");
        internal(e.to_string())
    })?;
    Ok(Json(FileListResponse {
        count: files.len(),
        files,
    }))
}

/// Download one master file as a CSV attachment.
///
/// GET /files/{filename}
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, Rejection> {
    let path = state.store().resolve(&filename).map_err(|e| match e {
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, Json(ApiError::new(e.to_string()))),
        StoreError::InvalidName(_) => bad_request(e.to_string()),
        other => {
            error!(file = %filename, error = %other, "file resolution failed");
            internal(other.to_string())
        }
    })?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        error!(file = %filename, error = %e, "failed to read master file");
        internal("failed to read master file")
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    let disposition = format!("attachment; filename=\"{filename}\"");
    let value = HeaderValue::from_str(&disposition)
        .map_err(|_| bad_request("filename is not header-safe"))?;
    headers.insert(header::CONTENT_DISPOSITION, value);

    info!(file = %filename, bytes = bytes.len(), "serving master file");
    Ok((headers, bytes))
}

/// Service identity and output-file count.
///
/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let files = state.store().list().map(|f| f.len()).unwrap_or(0);
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "files": files,
    }))
}

fn validate_range(params: &RangeParams) -> Result<(TradeDate, TradeDate), Rejection> {
    let (Some(start), Some(end)) = (params.start_date.as_deref(), params.end_date.as_deref())
    else {
        return Err(bad_request("please provide both start_date and end_date"));
    };
    let start = parse_date_param(start)?;
    let end = parse_date_param(end)?;
    if start > end {
        return Err(bad_request(format!(
            "start_date {start} falls after end_date {end}"
        )));
    }
    Ok((start, end))
}

fn validate_date(params: &DateParams) -> Result<TradeDate, Rejection> {
    let Some(date) = params.trade_date.as_deref() else {
        return Err(bad_request("please provide trade_date"));
    };
    parse_date_param(date)
}

fn parse_date_param(value: &str) -> Result<TradeDate, Rejection> {
    TradeDate::parse(value).map_err(|e| bad_request(e.to_string()))
}

fn bad_request(message: impl Into<String>) -> Rejection {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(message)))
}

fn internal(message: impl Into<String>) -> Rejection {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(message)),
    )
}
