use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::DayTemplate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct DayTemplateEntry {
    #[validate(range(min = 1, max = 366, message = "day_number must be between 1 and 366"))]
    pub day_number: i32,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "points_base must be non-negative"))]
    pub points_base: i32,
    #[serde(default)]
    pub requires_photo: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TemplateImportRequest {
    #[validate(length(min = 1, message = "at least one day is required"), nested)]
    pub days: Vec<DayTemplateEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateImportResponse {
    pub imported: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateResponse {
    pub template_id: Uuid,
    pub project_id: Uuid,
    pub day_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub points_base: i32,
    pub requires_photo: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DayTemplate> for TemplateResponse {
    fn from(template: DayTemplate) -> Self {
        Self {
            template_id: template.template_id,
            project_id: template.project_id,
            day_number: template.day_number,
            title: template.title,
            description: template.description,
            points_base: template.points_base,
            requires_photo: template.requires_photo,
            created_at: template.created_at,
        }
    }
}
