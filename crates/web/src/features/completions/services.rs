use sqlx::PgPool;
use storage::{
    dto::completion::{EvaluateCompletionRequest, SubmitCompletionRequest},
    error::Result,
    models::CompletionRecord,
    repository::completion::CompletionRepository,
    services::{ledger::CompletionLedger, points::PointsPolicy},
};
use uuid::Uuid;

pub async fn submit_completion(
    pool: &PgPool,
    policy: PointsPolicy,
    legacy_template_fallback: bool,
    req: &SubmitCompletionRequest,
) -> Result<CompletionRecord> {
    let ledger = CompletionLedger::new(pool, policy, legacy_template_fallback);
    ledger
        .submit(
            req.user_id,
            req.project_id,
            req.day_number,
            req.media_refs.clone(),
            req.notes.clone(),
        )
        .await
}

pub async fn evaluate_completion(
    pool: &PgPool,
    policy: PointsPolicy,
    legacy_template_fallback: bool,
    record_id: Uuid,
    req: &EvaluateCompletionRequest,
) -> Result<CompletionRecord> {
    let ledger = CompletionLedger::new(pool, policy, legacy_template_fallback);
    ledger.evaluate(record_id, req.decision, req.notes.clone()).await
}

pub async fn list_completions(
    pool: &PgPool,
    user_id: Option<Uuid>,
    project_id: Option<Uuid>,
) -> Result<Vec<CompletionRecord>> {
    CompletionRepository::new(pool).list(user_id, project_id).await
}
