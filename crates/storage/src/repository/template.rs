use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::template::DayTemplateEntry;
use crate::error::{Result, StorageError};
use crate::models::{DayTemplate, LegacyProjectTask};

pub struct TemplateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TemplateRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, project_id: Uuid, day_number: i32) -> Result<Option<DayTemplate>> {
        let template = sqlx::query_as::<_, DayTemplate>(
            r#"
            SELECT template_id, project_id, day_number, title, description,
                   points_base, requires_photo, created_at
            FROM day_templates
            WHERE project_id = $1 AND day_number = $2
            "#,
        )
        .bind(project_id)
        .bind(day_number)
        .fetch_optional(self.pool)
        .await?;

        Ok(template)
    }

    pub async fn list(&self, project_id: Uuid) -> Result<Vec<DayTemplate>> {
        let templates = sqlx::query_as::<_, DayTemplate>(
            r#"
            SELECT template_id, project_id, day_number, title, description,
                   points_base, requires_photo, created_at
            FROM day_templates
            WHERE project_id = $1
            ORDER BY day_number
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;

        Ok(templates)
    }

    /// Upsert the full day plan for a project in one transaction, so a
    /// partially applied import can never be observed.
    pub async fn import_batch(&self, project_id: Uuid, days: &[DayTemplateEntry]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let mut imported = 0u64;
        for entry in days {
            sqlx::query(
                r#"
                INSERT INTO day_templates (project_id, day_number, title, description, points_base, requires_photo)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (project_id, day_number)
                DO UPDATE SET
                    title = EXCLUDED.title,
                    description = EXCLUDED.description,
                    points_base = EXCLUDED.points_base,
                    requires_photo = EXCLUDED.requires_photo
                "#,
            )
            .bind(project_id)
            .bind(entry.day_number)
            .bind(&entry.title)
            .bind(&entry.description)
            .bind(entry.points_base)
            .bind(entry.requires_photo)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                let err = StorageError::from(e);
                if err.is_foreign_key_violation() {
                    StorageError::Configuration(format!("project {project_id} is not configured"))
                } else {
                    err
                }
            })?;
            imported += 1;
        }

        tx.commit().await?;
        Ok(imported)
    }

    /// Pre-template task row, used only by the opt-in synthesis fallback.
    pub async fn find_legacy_task(
        &self,
        project_id: Uuid,
        day_number: i32,
    ) -> Result<Option<LegacyProjectTask>> {
        let task = sqlx::query_as::<_, LegacyProjectTask>(
            r#"
            SELECT legacy_task_id, project_id, day_number, title, points
            FROM legacy_project_tasks
            WHERE project_id = $1 AND day_number = $2
            "#,
        )
        .bind(project_id)
        .bind(day_number)
        .fetch_optional(self.pool)
        .await?;

        Ok(task)
    }
}
