use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::completion::{
    CompletionListQuery, CompletionResponse, EvaluateCompletionRequest, SubmitCompletionRequest,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/completions",
    request_body = SubmitCompletionRequest,
    responses(
        (status = 201, description = "Completion submitted for review", body = CompletionResponse),
        (status = 400, description = "Validation error"),
        (status = 422, description = "No day template configured for the project day")
    ),
    tag = "completions"
)]
pub async fn submit_completion(
    State(state): State<AppState>,
    Json(req): Json<SubmitCompletionRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let record = services::submit_completion(
        state.db.pool(),
        state.policy,
        state.legacy_template_fallback,
        &req,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CompletionResponse::from(record))).into_response())
}

#[utoipa::path(
    post,
    path = "/api/completions/{record_id}/evaluation",
    params(
        ("record_id" = Uuid, Path, description = "Completion record id")
    ),
    request_body = EvaluateCompletionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Completion evaluated", body = CompletionResponse),
        (status = 400, description = "Record is not pending review"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Record not found")
    ),
    tag = "completions"
)]
pub async fn evaluate_completion(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    Json(req): Json<EvaluateCompletionRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let record = services::evaluate_completion(
        state.db.pool(),
        state.policy,
        state.legacy_template_fallback,
        record_id,
        &req,
    )
    .await?;

    Ok(Json(CompletionResponse::from(record)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/completions",
    params(CompletionListQuery),
    responses(
        (status = 200, description = "Completion records", body = Vec<CompletionResponse>)
    ),
    tag = "completions"
)]
pub async fn list_completions(
    State(state): State<AppState>,
    Query(query): Query<CompletionListQuery>,
) -> Result<Response, WebError> {
    let records =
        services::list_completions(state.db.pool(), query.user_id, query.project_id).await?;

    let response: Vec<CompletionResponse> =
        records.into_iter().map(CompletionResponse::from).collect();

    Ok(Json(response).into_response())
}
