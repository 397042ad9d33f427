use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CompletionRecord, CompletionStatus};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CompletionListQuery {
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitCompletionRequest {
    pub user_id: Uuid,
    pub project_id: Uuid,
    #[validate(range(min = 1, max = 366, message = "day_number must be between 1 and 366"))]
    pub day_number: i32,
    #[serde(default)]
    pub media_refs: Vec<String>,
    #[validate(length(max = 2000, message = "notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EvaluateCompletionRequest {
    pub decision: EvaluationDecision,
    #[validate(length(max = 2000, message = "notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompletionResponse {
    pub record_id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub day_number: i32,
    pub status: CompletionStatus,
    pub points_awarded: i32,
    pub media_refs: Vec<String>,
    pub notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl From<CompletionRecord> for CompletionResponse {
    fn from(record: CompletionRecord) -> Self {
        Self {
            record_id: record.record_id,
            user_id: record.user_id,
            project_id: record.project_id,
            day_number: record.day_number,
            status: record.status,
            points_awarded: record.points_awarded,
            media_refs: record.media_refs.0,
            notes: record.notes,
            submitted_at: record.submitted_at,
            evaluated_at: record.evaluated_at,
        }
    }
}
