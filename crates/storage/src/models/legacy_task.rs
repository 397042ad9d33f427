use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Task row from the pre-template era. Only consulted when the
/// template-synthesis compatibility mode is enabled.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LegacyProjectTask {
    pub legacy_task_id: Uuid,
    pub project_id: Uuid,
    pub day_number: i32,
    pub title: String,
    pub points: i32,
}
