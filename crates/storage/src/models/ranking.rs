use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Derived running totals per (user, project). Must always equal the
/// sum/count of approved completion records for that pair; maintained
/// incrementally by the ledger and repairable via the reconcile service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RankingAggregate {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub total_points: i32,
    pub completed_days: i32,
    #[schema(value_type = f64)]
    pub completion_rate: Decimal,
    pub updated_at: DateTime<Utc>,
}
