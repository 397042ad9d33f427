use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::dispatch::{
    CreateDispatchTaskRequest, DispatchLogResponse, DispatchTaskQuery, DispatchTaskResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/dispatches",
    request_body = CreateDispatchTaskRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Dispatch task scheduled", body = DispatchTaskResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Project not configured")
    ),
    tag = "dispatches"
)]
pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateDispatchTaskRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let task = services::create_task(state.db.pool(), &req).await?;

    Ok((StatusCode::CREATED, Json(DispatchTaskResponse::from(task))).into_response())
}

#[utoipa::path(
    get,
    path = "/api/dispatches",
    params(DispatchTaskQuery),
    responses(
        (status = 200, description = "Dispatch tasks", body = Vec<DispatchTaskResponse>)
    ),
    tag = "dispatches"
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<DispatchTaskQuery>,
) -> Result<Response, WebError> {
    let tasks = services::list_tasks(state.db.pool(), query.project_id).await?;

    let response: Vec<DispatchTaskResponse> =
        tasks.into_iter().map(DispatchTaskResponse::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/dispatches/{task_id}/logs",
    params(
        ("task_id" = Uuid, Path, description = "Dispatch task id")
    ),
    responses(
        (status = 200, description = "Per-recipient delivery log for the task", body = Vec<DispatchLogResponse>)
    ),
    tag = "dispatches"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let logs = services::list_logs(state.db.pool(), task_id).await?;

    let response: Vec<DispatchLogResponse> =
        logs.into_iter().map(DispatchLogResponse::from).collect();

    Ok(Json(response).into_response())
}
