use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "completion_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    NotStarted,
    PendingReview,
    Approved,
    Rejected,
}

impl CompletionStatus {
    /// Whether the record's points currently count toward the aggregate.
    pub fn counts_toward_ranking(&self) -> bool {
        matches!(self, CompletionStatus::Approved)
    }
}

/// One row per (user, project, day): the proof-of-completion ledger entry.
/// Upserted on submission, mutated on evaluation, never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompletionRecord {
    pub record_id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub day_number: i32,
    pub status: CompletionStatus,
    pub points_awarded: i32,
    #[schema(value_type = Vec<String>)]
    pub media_refs: Json<Vec<String>>,
    pub notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
