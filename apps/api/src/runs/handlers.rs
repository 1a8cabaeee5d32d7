use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobRecord;
use crate::models::run::InvocationInput;
use crate::output::RunOutput;
use crate::runs::runner::{execute_run, RunRecord};
use crate::runs::sink::StoredRun;
use crate::runs::upload::read_upload_form;
use crate::state::AppState;
use crate::tools::format::format_job_report;

/// POST /api/v1/runs
/// A missing or unparseable body runs with the fallback input.
pub async fn handle_create_run(
    State(state): State<AppState>,
    body: Option<Json<InvocationInput>>,
) -> Json<RunRecord> {
    let input = body.map(|Json(input)| input);
    Json(execute_run(&state.runs, input).await)
}

/// POST /api/v1/runs/upload
pub async fn handle_upload_run(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RunRecord>, AppError> {
    let input = read_upload_form(multipart).await?;
    Ok(Json(execute_run(&state.runs, Some(input)).await))
}

/// GET /api/v1/runs/:id
pub async fn handle_get_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<StoredRun>, AppError> {
    Ok(Json(find_run(&state, run_id).await?))
}

/// GET /api/v1/runs/:id/report
pub async fn handle_run_report(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let run = find_run(&state, run_id).await?;
    let jobs: Vec<JobRecord> = match &run.output {
        RunOutput::Success(result) => result.jobs.iter().map(JobRecord::from_loose).collect(),
        RunOutput::Error(_) => Vec::new(),
    };
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        format_job_report(&jobs),
    ))
}

async fn find_run(state: &AppState, run_id: Uuid) -> Result<StoredRun, AppError> {
    state
        .runs
        .sink
        .fetch(run_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Run {run_id} not found")))
}
