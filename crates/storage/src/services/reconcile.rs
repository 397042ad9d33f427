use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::models::DEFAULT_TOTAL_DAYS;

/// Completion rate as a 0-100 percentage with two decimal places.
/// A non-positive `total_days` falls back to the default cycle length.
pub fn completion_rate(completed_days: i32, total_days: i32) -> Decimal {
    let total = if total_days >= 1 {
        total_days
    } else {
        DEFAULT_TOTAL_DAYS
    };

    let rate = Decimal::from(completed_days.max(0)) * Decimal::from(100) / Decimal::from(total);
    rate.round_dp(2).clamp(Decimal::ZERO, Decimal::from(100))
}

#[derive(sqlx::FromRow)]
struct PairTotals {
    user_id: Uuid,
    project_id: Uuid,
    total_points: i64,
    completed_days: i64,
    total_days: Option<i32>,
}

/// Rebuild ranking aggregates from the approved ledger rows.
///
/// The aggregates are a derived cache; this is the repair path for the
/// invariant that they always equal the sum/count of approved completion
/// records. Returns the number of (user, project) pairs rewritten.
pub async fn rebuild_aggregates(pool: &PgPool, project_id: Option<Uuid>) -> Result<u64> {
    let mut query = QueryBuilder::new(
        r#"
        SELECT
            cr.user_id,
            cr.project_id,
            COALESCE(SUM(cr.points_awarded) FILTER (WHERE cr.status = 'approved'), 0)::bigint as total_points,
            COUNT(*) FILTER (WHERE cr.status = 'approved')::bigint as completed_days,
            p.total_days
        FROM completion_records cr
        LEFT JOIN projects p ON p.project_id = cr.project_id
        WHERE 1=1
        "#,
    );

    if let Some(project_id) = project_id {
        query.push(" AND cr.project_id = ");
        query.push_bind(project_id);
    }

    query.push(" GROUP BY cr.user_id, cr.project_id, p.total_days");

    let pairs: Vec<PairTotals> = query.build_query_as().fetch_all(pool).await?;

    let mut count = 0u64;

    for pair in pairs {
        if pair.total_days.is_none() {
            warn!(project_id = %pair.project_id, "project row missing, using the default cycle length");
        }

        let rate = completion_rate(
            pair.completed_days as i32,
            pair.total_days.unwrap_or(DEFAULT_TOTAL_DAYS),
        );

        sqlx::query(
            r#"
            INSERT INTO ranking_aggregates (user_id, project_id, total_points, completed_days, completion_rate, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (user_id, project_id) DO UPDATE SET
                total_points = EXCLUDED.total_points,
                completed_days = EXCLUDED.completed_days,
                completion_rate = EXCLUDED.completion_rate,
                updated_at = now()
            "#,
        )
        .bind(pair.user_id)
        .bind(pair.project_id)
        .bind(pair.total_points as i32)
        .bind(pair.completed_days as i32)
        .bind(rate)
        .execute(pool)
        .await?;

        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn one_of_twenty_one_days_rounds_to_two_places() {
        assert_eq!(completion_rate(1, 21), dec!(4.76));
    }

    #[test]
    fn full_completion_is_exactly_one_hundred() {
        assert_eq!(completion_rate(21, 21), dec!(100));
    }

    #[test]
    fn rate_is_clamped_to_the_upper_bound() {
        assert_eq!(completion_rate(30, 21), dec!(100));
    }

    #[test]
    fn negative_inputs_are_clamped_to_zero() {
        assert_eq!(completion_rate(-3, 21), Decimal::ZERO);
    }

    #[test]
    fn non_positive_total_days_falls_back_to_default() {
        assert_eq!(completion_rate(1, 0), dec!(4.76));
        assert_eq!(completion_rate(1, -7), dec!(4.76));
    }
}
