use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-project access credential for an outbound channel provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChannelCredential {
    pub credential_id: Uuid,
    pub project_id: Uuid,
    pub provider: String,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
}
