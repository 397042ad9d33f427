use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use storage::models::{ActiveSubscriber, DispatchTask, NewDispatchLog};
use storage::repository::dispatch::DispatchRepository;
use storage::repository::subscriber::SubscriberRepository;
use uuid::Uuid;

use crate::Result;
use crate::traits::DispatchStore;

/// Postgres-backed store for the dispatch loop.
#[derive(Clone)]
pub struct PgDispatchStore {
    pool: PgPool,
}

impl PgDispatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DispatchStore for PgDispatchStore {
    async fn acquire_lease(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool> {
        Ok(DispatchRepository::new(&self.pool)
            .acquire_lease(name, owner, ttl)
            .await?)
    }

    async fn release_lease(&self, name: &str, owner: &str) -> Result<()> {
        Ok(DispatchRepository::new(&self.pool)
            .release_lease(name, owner)
            .await?)
    }

    async fn due_tasks(&self, now: DateTime<Utc>) -> Result<Vec<DispatchTask>> {
        Ok(DispatchRepository::new(&self.pool).due_tasks(now).await?)
    }

    async fn mark_sending(&self, task_id: Uuid) -> Result<bool> {
        Ok(DispatchRepository::new(&self.pool)
            .mark_sending(task_id)
            .await?)
    }

    async fn mark_done(&self, task_id: Uuid) -> Result<()> {
        Ok(DispatchRepository::new(&self.pool).mark_done(task_id).await?)
    }

    async fn active_subscribers(&self, project_id: Uuid) -> Result<Vec<ActiveSubscriber>> {
        Ok(SubscriberRepository::new(&self.pool)
            .active_subscribers(project_id)
            .await?)
    }

    async fn append_log(&self, log: &NewDispatchLog) -> Result<()> {
        Ok(DispatchRepository::new(&self.pool).append_log(log).await?)
    }
}
