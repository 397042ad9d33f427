use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProjectSubscription {
    pub subscription_id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub channel_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Recipient row for a dispatch fan-out. `channel_user_id` is `None` when
/// the user never connected the external chat identity.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveSubscriber {
    pub user_id: Uuid,
    pub display_name: String,
    pub channel_user_id: Option<String>,
}

/// Resolution of an inbound channel identity to the subscription the
/// submission should land on.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriberContext {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub start_date: NaiveDate,
    pub total_days: i32,
}

impl SubscriberContext {
    /// One-based challenge day for a calendar date, counted from the
    /// project's start. `None` for dates outside the project's run.
    pub fn day_number_for(&self, date: NaiveDate) -> Option<i32> {
        let offset = (date - self.start_date).num_days();
        if offset < 0 || offset >= i64::from(self.total_days.max(0)) {
            return None;
        }
        Some(offset as i32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn context(total_days: i32, start: NaiveDate) -> SubscriberContext {
        SubscriberContext {
            user_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            start_date: start,
            total_days,
        }
    }

    #[test]
    fn first_day_is_one() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(context(21, start).day_number_for(start), Some(1));
    }

    #[test]
    fn last_day_matches_total_days() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let ctx = context(21, start);
        assert_eq!(ctx.day_number_for(start + Days::new(20)), Some(21));
        assert_eq!(ctx.day_number_for(start + Days::new(21)), None);
    }

    #[test]
    fn dates_before_start_have_no_day() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(context(21, start).day_number_for(start - Days::new(1)), None);
    }
}
