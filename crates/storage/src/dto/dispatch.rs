use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{DispatchLog, DispatchOutcome, DispatchTask, DispatchTaskStatus};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDispatchTaskRequest {
    pub project_id: Uuid,
    #[validate(length(min = 1, max = 4000, message = "content must be 1-4000 characters"))]
    pub content: String,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DispatchTaskQuery {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchTaskResponse {
    pub task_id: Uuid,
    pub project_id: Uuid,
    pub content: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: DispatchTaskStatus,
    pub created_at: DateTime<Utc>,
}

impl From<DispatchTask> for DispatchTaskResponse {
    fn from(task: DispatchTask) -> Self {
        Self {
            task_id: task.task_id,
            project_id: task.project_id,
            content: task.content,
            scheduled_at: task.scheduled_at,
            status: task.status,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchLogResponse {
    pub log_id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub recipient: Option<String>,
    pub outcome: DispatchOutcome,
    pub error: Option<String>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl From<DispatchLog> for DispatchLogResponse {
    fn from(log: DispatchLog) -> Self {
        Self {
            log_id: log.log_id,
            task_id: log.task_id,
            user_id: log.user_id,
            recipient: log.recipient,
            outcome: log.outcome,
            error: log.error,
            attempts: log.attempts,
            created_at: log.created_at,
        }
    }
}
