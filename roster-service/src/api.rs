//! HTTP surface consumed by the host's generation UI.
//!
//! The operations named in the core contract: submit a generation request,
//! read back its status, export the current roster as CSV, and read the
//! staff-request satisfaction report. Everything else — auth, sessions, the
//! editing UI — is the host's concern; `session` here is accepted as a plain
//! request field rather than derived from a cookie, since this crate owns no
//! session store.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use roster_core::EntityStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jobs::{JobOrchestrator, JobStatus, SubmitError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub jobs: Arc<JobOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/rosters/generate", post(submit))
        .route("/rosters/generate/{task}", get(status))
        .route("/rosters/{start_date}/export.csv", get(export_csv))
        .route("/rosters/{start_date}/staff-requests", get(staff_requests))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    date: String,
    #[serde(default = "default_session")]
    session: String,
}

fn default_session() -> String {
    "default".to_string()
}

/// Accepts the ISO-8601 datetime the core contract specifies, plus a bare
/// date for convenience; only the date component is meaningful to the
/// generator.
fn parse_submit_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = raw.parse::<chrono::DateTime<chrono::Utc>>() {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    raw.parse::<NaiveDate>().ok()
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    task: Uuid,
}

async fn submit(State(state): State<AppState>, Json(body): Json<SubmitRequest>) -> Response {
    let Some(start_date) = parse_submit_date(&body.date) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "detail": "date must be an ISO-8601 datetime" })),
        )
            .into_response();
    };
    match state.jobs.submit(&body.session, start_date).await {
        Ok(task) => (StatusCode::CREATED, Json(SubmitResponse { task })).into_response(),
        Err(SubmitError::AlreadyInProgress) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "detail": "a generation job for this session is already in progress" })),
        )
            .into_response(),
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    status_message: String,
}

async fn status(State(state): State<AppState>, Path(task): Path<Uuid>) -> Response {
    let Some(job_status) = state.jobs.status(task) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let body = match job_status {
        JobStatus::Processing => StatusResponse {
            status: "PROCESSING",
            status_message: String::new(),
        },
        JobStatus::Succeeded => StatusResponse {
            status: "SUCCEEDED",
            status_message: String::new(),
        },
        JobStatus::Failed { message, .. } => StatusResponse {
            status: "FAILED",
            status_message: message,
        },
    };
    Json(body).into_response()
}

async fn export_csv(State(state): State<AppState>, Path(start_date): Path<NaiveDate>) -> Response {
    match roster_core::reader::roster_by_staff(state.store.as_ref(), start_date) {
        Ok((dates, rows)) => {
            let csv = roster_core::reader::to_csv(&dates, &rows);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"roster-{start_date}.csv\""),
                    ),
                ],
                csv,
            )
                .into_response()
        }
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

#[derive(Debug, Serialize)]
struct StaffRequestReport {
    successes: Vec<String>,
    failures: Vec<String>,
}

async fn staff_requests(State(state): State<AppState>, Path(start_date): Path<NaiveDate>) -> Response {
    match roster_core::reader::staff_request_satisfaction(state.store.as_ref(), start_date) {
        Ok(outcomes) => {
            let mut successes = Vec::new();
            let mut failures = Vec::new();
            for outcome in outcomes {
                if outcome.satisfied {
                    successes.push(outcome.description);
                } else {
                    failures.push(outcome.description);
                }
            }
            Json(StaffRequestReport { successes, failures }).into_response()
        }
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}
