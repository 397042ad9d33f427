use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use storage::dto::ranking::{OrganizationRankingEntry, UserRankingEntry, UserRankingQuery};
use storage::models::RankingAggregate;
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/rankings/users",
    params(UserRankingQuery),
    responses(
        (status = 200, description = "User ranking retrieved successfully", body = Vec<UserRankingEntry>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "rankings"
)]
pub async fn get_user_ranking(
    State(state): State<AppState>,
    Query(query): Query<UserRankingQuery>,
) -> Result<Response, WebError> {
    query.validate().map_err(WebError::BadRequest)?;

    let entries = services::get_user_ranking(state.db.pool(), &query).await?;

    Ok(Json(entries).into_response())
}

#[utoipa::path(
    get,
    path = "/api/rankings/organizations",
    responses(
        (status = 200, description = "Organization ranking retrieved successfully", body = Vec<OrganizationRankingEntry>)
    ),
    tag = "rankings"
)]
pub async fn get_organization_ranking(
    State(state): State<AppState>,
) -> Result<Response, WebError> {
    let entries = services::get_organization_ranking(state.db.pool()).await?;

    Ok(Json(entries).into_response())
}

#[utoipa::path(
    get,
    path = "/api/rankings/users/{user_id}/projects/{project_id}",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("project_id" = Uuid, Path, description = "Project id")
    ),
    responses(
        (status = 200, description = "The user's running totals for the project", body = RankingAggregate),
        (status = 404, description = "The user has no recorded progress for the project")
    ),
    tag = "rankings"
)]
pub async fn get_user_progress(
    State(state): State<AppState>,
    Path((user_id, project_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let aggregate = services::get_user_progress(state.db.pool(), user_id, project_id).await?;

    Ok(Json(aggregate).into_response())
}
