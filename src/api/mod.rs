//! HTTP API: start a search, poll its status, fetch or download results.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::app::HarvestError;
use crate::domain::{JobStatus, SearchParams};
use crate::export::{self, ExportFormat, ResultsPayload};
use crate::scraper::JobManager;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobManager>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`HarvestError`] onto a status code and a `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError(HarvestError);

impl From<HarvestError> for ApiError {
    fn from(err: HarvestError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HarvestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HarvestError::JobAlreadyRunning | HarvestError::NoJobRunning => StatusCode::CONFLICT,
            HarvestError::NoResults => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Form body of `POST /search`.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(alias = "establishment_type")]
    pub category: Option<String>,
    pub location: Option<String>,
    pub max_results: Option<String>,
}

/// JSON body of `POST /api/search`; `max_results` may be a number or a string.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(alias = "establishment_type")]
    pub category: Option<String>,
    pub location: Option<String>,
    pub max_results: Option<serde_json::Value>,
}

impl From<SearchRequest> for SearchForm {
    fn from(req: SearchRequest) -> Self {
        let max_results = req.max_results.and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
        Self {
            category: req.category,
            location: req.location,
            max_results,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search_form))
        .route("/api/search", post(search_json))
        .route("/api/status", get(status))
        .route("/api/results", get(results))
        .route("/api/cancel", post(cancel))
        .route("/export/{format}", get(export_results))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn start_job(
    state: &AppState,
    form: SearchForm,
) -> Result<(StatusCode, Json<JobStatus>), ApiError> {
    let params = SearchParams::new(
        form.category.as_deref(),
        form.location.as_deref(),
        form.max_results.as_deref(),
    )?;
    state.jobs.start(params)?;
    Ok((StatusCode::ACCEPTED, Json(state.jobs.status())))
}

async fn search_form(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<(StatusCode, Json<JobStatus>), ApiError> {
    start_job(&state, form)
}

async fn search_json(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<(StatusCode, Json<JobStatus>), ApiError> {
    start_job(&state, req.into())
}

async fn status(State(state): State<AppState>) -> Json<JobStatus> {
    Json(state.jobs.status())
}

fn payload(state: &AppState) -> ResultsPayload {
    let (params, records) = state.jobs.results();
    ResultsPayload::new(params, records)
}

async fn results(State(state): State<AppState>) -> Json<ResultsPayload> {
    Json(payload(&state))
}

async fn cancel(State(state): State<AppState>) -> Result<Json<JobStatus>, ApiError> {
    state.jobs.cancel()?;
    Ok(Json(state.jobs.status()))
}

async fn export_results(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = format.parse()?;
    let body = export::render(format, &payload(&state))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        format.file_name(&Local::now())
    );
    tracing::info!(format = format.extension(), bytes = body.len(), "Export generated");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
