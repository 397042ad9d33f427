use sqlx::PgPool;
use storage::{
    dto::dispatch::CreateDispatchTaskRequest,
    error::Result,
    models::{DispatchLog, DispatchTask},
    repository::dispatch::DispatchRepository,
};
use uuid::Uuid;

pub async fn create_task(pool: &PgPool, req: &CreateDispatchTaskRequest) -> Result<DispatchTask> {
    let repo = DispatchRepository::new(pool);
    repo.create_task(req).await
}

pub async fn list_tasks(pool: &PgPool, project_id: Option<Uuid>) -> Result<Vec<DispatchTask>> {
    let repo = DispatchRepository::new(pool);
    repo.list_tasks(project_id).await
}

pub async fn list_logs(pool: &PgPool, task_id: Uuid) -> Result<Vec<DispatchLog>> {
    let repo = DispatchRepository::new(pool);
    repo.logs_for_task(task_id).await
}
