use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserRankingQuery {
    /// Number of entries to return (default 10, max 100).
    pub limit: Option<i64>,
    /// Restrict the ranking to a single project.
    pub project_id: Option<Uuid>,
}

impl UserRankingQuery {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.limit
            && !(1..=MAX_LIMIT).contains(&limit)
        {
            return Err(format!("limit must be between 1 and {MAX_LIMIT}"));
        }
        Ok(())
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserRankingEntry {
    pub rank: i64,
    pub user_id: Uuid,
    pub display_name: String,
    pub total_points: i64,
    pub completed_days: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct OrganizationRankingEntry {
    pub organization_id: Uuid,
    pub name: String,
    pub total_points: i64,
    #[schema(value_type = f64)]
    pub average_points: Decimal,
    pub member_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_ten() {
        let query = UserRankingQuery::default();
        assert!(query.validate().is_ok());
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn rejects_out_of_range_limit() {
        let query = UserRankingQuery {
            limit: Some(0),
            project_id: None,
        };
        assert!(query.validate().is_err());

        let query = UserRankingQuery {
            limit: Some(101),
            project_id: None,
        };
        assert!(query.validate().is_err());
    }
}
