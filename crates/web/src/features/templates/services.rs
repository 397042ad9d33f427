use sqlx::PgPool;
use storage::{
    dto::template::TemplateImportRequest,
    error::Result,
    models::DayTemplate,
    repository::template::TemplateRepository,
};
use uuid::Uuid;

pub async fn import_templates(
    pool: &PgPool,
    project_id: Uuid,
    req: &TemplateImportRequest,
) -> Result<u64> {
    let repo = TemplateRepository::new(pool);
    repo.import_batch(project_id, &req.days).await
}

pub async fn list_templates(pool: &PgPool, project_id: Uuid) -> Result<Vec<DayTemplate>> {
    let repo = TemplateRepository::new(pool);
    repo.list(project_id).await
}
