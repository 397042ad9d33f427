use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-project, per-day action configuration. Read-only from the ledger's
/// perspective; written only through the admin batch import.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DayTemplate {
    pub template_id: Uuid,
    pub project_id: Uuid,
    pub day_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub points_base: i32,
    pub requires_photo: bool,
    pub created_at: DateTime<Utc>,
}
