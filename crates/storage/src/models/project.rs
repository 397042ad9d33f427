use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Fallback cycle length when a project row is missing or misconfigured.
pub const DEFAULT_TOTAL_DAYS: i32 = 21;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub total_days: i32,
    pub start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
