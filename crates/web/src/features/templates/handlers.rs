use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::template::{TemplateImportRequest, TemplateImportResponse, TemplateResponse};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/templates",
    params(
        ("project_id" = Uuid, Path, description = "Project id")
    ),
    request_body = TemplateImportRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Day templates imported", body = TemplateImportResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Project not configured")
    ),
    tag = "templates"
)]
pub async fn import_templates(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<TemplateImportRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let imported = services::import_templates(state.db.pool(), project_id, &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(TemplateImportResponse { imported }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/templates",
    params(
        ("project_id" = Uuid, Path, description = "Project id")
    ),
    responses(
        (status = 200, description = "Day templates for the project", body = Vec<TemplateResponse>)
    ),
    tag = "templates"
)]
pub async fn list_templates(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let templates = services::list_templates(state.db.pool(), project_id).await?;

    let response: Vec<TemplateResponse> =
        templates.into_iter().map(TemplateResponse::from).collect();

    Ok(Json(response).into_response())
}
