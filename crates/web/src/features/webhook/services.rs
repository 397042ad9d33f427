use chrono::Utc;
use sqlx::PgPool;
use storage::{
    error::{Result, StorageError},
    models::CompletionRecord,
    repository::subscriber::SubscriberRepository,
    services::{ledger::CompletionLedger, points::PointsPolicy},
};
use tracing::info;

/// Turn an inbound chat message into a ledger submission.
///
/// The day number is derived from the subscription's project calendar, and
/// the submission takes the same pending-review path as the HTTP API.
pub async fn submit_from_channel(
    pool: &PgPool,
    policy: PointsPolicy,
    legacy_template_fallback: bool,
    channel_user_id: &str,
    text: Option<String>,
    media_refs: Vec<String>,
) -> Result<CompletionRecord> {
    let context = SubscriberRepository::new(pool)
        .find_active_by_channel_identity(channel_user_id)
        .await?
        .ok_or(StorageError::NotFound)?;

    let today = Utc::now().date_naive();
    let day_number = context.day_number_for(today).ok_or_else(|| {
        StorageError::Validation("the subscribed project is not running today".to_string())
    })?;

    let ledger = CompletionLedger::new(pool, policy, legacy_template_fallback);
    ledger
        .submit(
            context.user_id,
            context.project_id,
            day_number,
            media_refs,
            text,
        )
        .await
}

/// Toggle every subscription attached to the channel identity.
pub async fn apply_subscription_change(
    pool: &PgPool,
    channel_user_id: &str,
    active: bool,
) -> Result<u64> {
    let updated = SubscriberRepository::new(pool)
        .set_active_by_channel_identity(channel_user_id, active)
        .await?;

    info!(channel_user_id, active, updated, "subscription change applied");
    Ok(updated)
}
