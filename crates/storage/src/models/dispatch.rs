use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "dispatch_task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchTaskStatus {
    Scheduled,
    Sending,
    Done,
}

/// Outbound message scheduled for all active subscribers of a project.
/// Status only moves forward: scheduled -> sending -> done.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DispatchTask {
    pub task_id: Uuid,
    pub project_id: Uuid,
    pub content: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: DispatchTaskStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "dispatch_outcome", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Success,
    Failure,
    FailedPermanent,
}

/// Append-only per-recipient delivery outcome for a dispatch run.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DispatchLog {
    pub log_id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub recipient: Option<String>,
    pub outcome: DispatchOutcome,
    pub error: Option<String>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

/// Log row as produced by a dispatch run, before insertion.
#[derive(Debug, Clone)]
pub struct NewDispatchLog {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub recipient: Option<String>,
    pub outcome: DispatchOutcome,
    pub error: Option<String>,
    pub attempts: i32,
}
