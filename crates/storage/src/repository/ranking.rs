use sqlx::{PgConnection, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::ranking::{OrganizationRankingEntry, UserRankingEntry};
use crate::error::Result;
use crate::models::RankingAggregate;

/// Atomically fold a ledger change into the (user, project) aggregate.
///
/// Runs as a single upsert so concurrent writers cannot observe or produce a
/// torn total/rate pair. Increments are clamped at zero and the completion
/// rate is recomputed from the post-increment day count in the same
/// statement. `total_days` must already be sanitized to >= 1 by the caller.
pub async fn apply_delta(
    conn: &mut PgConnection,
    user_id: Uuid,
    project_id: Uuid,
    points_delta: i32,
    completed_delta: i32,
    total_days: i32,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ranking_aggregates (user_id, project_id, total_points, completed_days, completion_rate, updated_at)
        VALUES ($1, $2, GREATEST($3, 0), GREATEST($4, 0),
                LEAST(100, ROUND(GREATEST($4, 0)::numeric * 100 / $5, 2)), now())
        ON CONFLICT (user_id, project_id) DO UPDATE SET
            total_points = GREATEST(ranking_aggregates.total_points + $3, 0),
            completed_days = GREATEST(ranking_aggregates.completed_days + $4, 0),
            completion_rate = LEAST(100, ROUND(GREATEST(ranking_aggregates.completed_days + $4, 0)::numeric * 100 / $5, 2)),
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(project_id)
    .bind(points_delta)
    .bind(completed_delta)
    .bind(total_days)
    .execute(conn)
    .await?;

    Ok(())
}

pub struct RankingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RankingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Running totals for one (user, project) pair.
    pub async fn get(&self, user_id: Uuid, project_id: Uuid) -> Result<Option<RankingAggregate>> {
        let aggregate = sqlx::query_as::<_, RankingAggregate>(
            r#"
            SELECT user_id, project_id, total_points, completed_days, completion_rate, updated_at
            FROM ranking_aggregates
            WHERE user_id = $1 AND project_id = $2
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(aggregate)
    }

    /// Top users by total points, optionally restricted to one project.
    /// Ties are left in whatever order the sort returns.
    pub async fn top_users(
        &self,
        limit: i64,
        project_id: Option<Uuid>,
    ) -> Result<Vec<UserRankingEntry>> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT
                ROW_NUMBER() OVER (ORDER BY SUM(ra.total_points) DESC) as rank,
                u.user_id,
                u.display_name,
                COALESCE(SUM(ra.total_points), 0)::bigint as total_points,
                COALESCE(SUM(ra.completed_days), 0)::bigint as completed_days
            FROM ranking_aggregates ra
            INNER JOIN users u ON ra.user_id = u.user_id
            WHERE 1=1
            "#,
        );

        if let Some(project_id) = project_id {
            query.push(" AND ra.project_id = ");
            query.push_bind(project_id);
        }

        query.push(
            r#"
            GROUP BY u.user_id, u.display_name
            ORDER BY total_points DESC
            LIMIT
            "#,
        );
        query.push_bind(limit);

        let entries = query.build_query_as().fetch_all(self.pool).await?;

        Ok(entries)
    }

    pub async fn organization_ranking(&self) -> Result<Vec<OrganizationRankingEntry>> {
        let entries = sqlx::query_as::<_, OrganizationRankingEntry>(
            r#"
            SELECT
                o.organization_id,
                o.name,
                COALESCE(SUM(ra.total_points), 0)::bigint as total_points,
                COALESCE(ROUND(SUM(ra.total_points)::numeric / NULLIF(COUNT(DISTINCT u.user_id), 0), 2), 0) as average_points,
                COUNT(DISTINCT u.user_id)::bigint as member_count
            FROM organizations o
            LEFT JOIN users u ON u.organization_id = o.organization_id
            LEFT JOIN ranking_aggregates ra ON ra.user_id = u.user_id
            GROUP BY o.organization_id, o.name
            ORDER BY total_points DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }
}
