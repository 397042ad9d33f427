use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

use crate::dto::dispatch::CreateDispatchTaskRequest;
use crate::error::{Result, StorageError};
use crate::models::{ChannelCredential, DispatchLog, DispatchTask, NewDispatchLog};

const TASK_COLUMNS: &str = "task_id, project_id, content, scheduled_at, status, created_at";

pub struct DispatchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DispatchRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_task(&self, req: &CreateDispatchTaskRequest) -> Result<DispatchTask> {
        let task = sqlx::query_as::<_, DispatchTask>(&format!(
            r#"
            INSERT INTO dispatch_tasks (project_id, content, scheduled_at)
            VALUES ($1, $2, $3)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(req.project_id)
        .bind(&req.content)
        .bind(req.scheduled_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_foreign_key_violation() {
                StorageError::Configuration(format!("project {} is not configured", req.project_id))
            } else {
                err
            }
        })?;

        Ok(task)
    }

    pub async fn list_tasks(&self, project_id: Option<Uuid>) -> Result<Vec<DispatchTask>> {
        let mut query =
            QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM dispatch_tasks WHERE 1=1"));

        if let Some(project_id) = project_id {
            query.push(" AND project_id = ");
            query.push_bind(project_id);
        }

        query.push(" ORDER BY scheduled_at DESC");

        let tasks = query.build_query_as().fetch_all(self.pool).await?;

        Ok(tasks)
    }

    pub async fn due_tasks(&self, now: DateTime<Utc>) -> Result<Vec<DispatchTask>> {
        let tasks = sqlx::query_as::<_, DispatchTask>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM dispatch_tasks
            WHERE status = 'scheduled' AND scheduled_at <= $1
            ORDER BY scheduled_at
            "#
        ))
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        Ok(tasks)
    }

    /// Claim a task for sending. Returns false when another run already
    /// moved it past `scheduled`, which keeps the fan-out at-most-once.
    pub async fn mark_sending(&self, task_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE dispatch_tasks SET status = 'sending' WHERE task_id = $1 AND status = 'scheduled'",
        )
        .bind(task_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_done(&self, task_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE dispatch_tasks SET status = 'done' WHERE task_id = $1")
            .bind(task_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    pub async fn append_log(&self, log: &NewDispatchLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO dispatch_logs (task_id, user_id, recipient, outcome, error, attempts)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(log.task_id)
        .bind(log.user_id)
        .bind(&log.recipient)
        .bind(log.outcome)
        .bind(&log.error)
        .bind(log.attempts)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn logs_for_task(&self, task_id: Uuid) -> Result<Vec<DispatchLog>> {
        let logs = sqlx::query_as::<_, DispatchLog>(
            r#"
            SELECT log_id, task_id, user_id, recipient, outcome, error, attempts, created_at
            FROM dispatch_logs
            WHERE task_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(task_id)
        .fetch_all(self.pool)
        .await?;

        Ok(logs)
    }

    /// Try to take the named lease for `ttl`. The conditional upsert only
    /// steals a row whose lease has expired, so at most one holder exists
    /// at a time, across processes and across crashes. A holder cannot
    /// re-acquire its own live lease; a re-entrant tick must fail here.
    pub async fn acquire_lease(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool> {
        let ttl_secs = ttl.as_secs() as f64;
        let result = sqlx::query(
            r#"
            INSERT INTO dispatch_leases (lease_name, owner, expires_at)
            VALUES ($1, $2, now() + $3 * interval '1 second')
            ON CONFLICT (lease_name) DO UPDATE SET
                owner = EXCLUDED.owner,
                expires_at = EXCLUDED.expires_at
            WHERE dispatch_leases.expires_at <= now()
            "#,
        )
        .bind(name)
        .bind(owner)
        .bind(ttl_secs)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn release_lease(&self, name: &str, owner: &str) -> Result<()> {
        sqlx::query("DELETE FROM dispatch_leases WHERE lease_name = $1 AND owner = $2")
            .bind(name)
            .bind(owner)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    pub async fn credential_for_project(
        &self,
        project_id: Uuid,
        provider: &str,
    ) -> Result<Option<ChannelCredential>> {
        let credential = sqlx::query_as::<_, ChannelCredential>(
            r#"
            SELECT credential_id, project_id, provider, access_token, created_at
            FROM channel_credentials
            WHERE project_id = $1 AND provider = $2
            "#,
        )
        .bind(project_id)
        .bind(provider)
        .fetch_optional(self.pool)
        .await?;

        Ok(credential)
    }
}
