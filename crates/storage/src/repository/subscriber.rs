use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ActiveSubscriber, SubscriberContext};

pub struct SubscriberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriberRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Recipient set for a dispatch fan-out: active subscribers of the
    /// project, connected or not.
    pub async fn active_subscribers(&self, project_id: Uuid) -> Result<Vec<ActiveSubscriber>> {
        let subscribers = sqlx::query_as::<_, ActiveSubscriber>(
            r#"
            SELECT u.user_id, u.display_name, ps.channel_user_id
            FROM project_subscriptions ps
            INNER JOIN users u ON ps.user_id = u.user_id
            WHERE ps.project_id = $1 AND ps.is_active = TRUE
            ORDER BY ps.created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;

        Ok(subscribers)
    }

    /// Resolve an inbound channel identity to the subscription a submission
    /// should land on. When a user subscribed to several projects under the
    /// same identity, the most recent active subscription wins.
    pub async fn find_active_by_channel_identity(
        &self,
        channel_user_id: &str,
    ) -> Result<Option<SubscriberContext>> {
        let context = sqlx::query_as::<_, SubscriberContext>(
            r#"
            SELECT ps.user_id, ps.project_id, p.start_date, p.total_days
            FROM project_subscriptions ps
            INNER JOIN projects p ON ps.project_id = p.project_id
            WHERE ps.channel_user_id = $1 AND ps.is_active = TRUE
            ORDER BY ps.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(channel_user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(context)
    }

    /// Toggle every subscription attached to the channel identity. Returns
    /// the number of rows touched.
    pub async fn set_active_by_channel_identity(
        &self,
        channel_user_id: &str,
        is_active: bool,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE project_subscriptions SET is_active = $2 WHERE channel_user_id = $1",
        )
        .bind(channel_user_id)
        .bind(is_active)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
