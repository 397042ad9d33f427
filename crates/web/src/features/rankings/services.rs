use sqlx::PgPool;
use storage::{
    dto::ranking::{OrganizationRankingEntry, UserRankingEntry, UserRankingQuery},
    error::{Result, StorageError},
    models::RankingAggregate,
    repository::ranking::RankingRepository,
};
use uuid::Uuid;

/// Top users by total points, optionally scoped to one project.
pub async fn get_user_ranking(
    pool: &PgPool,
    query: &UserRankingQuery,
) -> Result<Vec<UserRankingEntry>> {
    let repo = RankingRepository::new(pool);
    repo.top_users(query.limit(), query.project_id).await
}

pub async fn get_organization_ranking(pool: &PgPool) -> Result<Vec<OrganizationRankingEntry>> {
    let repo = RankingRepository::new(pool);
    repo.organization_ranking().await
}

/// A user's running totals for one project.
pub async fn get_user_progress(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<RankingAggregate> {
    let repo = RankingRepository::new(pool);
    repo.get(user_id, project_id)
        .await?
        .ok_or(StorageError::NotFound)
}
