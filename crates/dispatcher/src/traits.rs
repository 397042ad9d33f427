use std::time::Duration;

use chrono::{DateTime, Utc};
use storage::models::{ActiveSubscriber, DispatchTask, NewDispatchLog};
use uuid::Uuid;

use crate::Result;

/// Storage operations the dispatch loop depends on.
#[async_trait::async_trait]
pub trait DispatchStore: Send + Sync {
    /// Take the named lease for `ttl`, stealing it only when expired.
    /// Returns false when another owner currently holds it.
    async fn acquire_lease(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool>;

    async fn release_lease(&self, name: &str, owner: &str) -> Result<()>;

    async fn due_tasks(&self, now: DateTime<Utc>) -> Result<Vec<DispatchTask>>;

    /// Claim a task for sending; false when another run already claimed it.
    async fn mark_sending(&self, task_id: Uuid) -> Result<bool>;

    async fn mark_done(&self, task_id: Uuid) -> Result<()>;

    async fn active_subscribers(&self, project_id: Uuid) -> Result<Vec<ActiveSubscriber>>;

    async fn append_log(&self, log: &NewDispatchLog) -> Result<()>;
}

/// Message delivery contract against the external chat provider.
#[async_trait::async_trait]
pub trait OutboundChannel: Send + Sync {
    async fn send(&self, project_id: Uuid, recipient: &str, content: &str) -> Result<()>;
}
