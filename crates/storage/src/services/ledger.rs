use sqlx::PgPool;
use sqlx::types::Json;
use tracing::warn;
use uuid::Uuid;

use crate::dto::completion::EvaluationDecision;
use crate::error::{Result, StorageError};
use crate::models::{CompletionRecord, CompletionStatus, DEFAULT_TOTAL_DAYS};
use crate::repository::project::ProjectRepository;
use crate::repository::ranking;
use crate::repository::template::TemplateRepository;
use crate::services::points::PointsPolicy;

const RECORD_COLUMNS: &str = r#"
    record_id, user_id, project_id, day_number, status, points_awarded,
    media_refs, notes, submitted_at, evaluated_at, created_at
"#;

/// Template terms the ledger needs to score a day.
#[derive(Debug, Clone, Copy)]
struct TemplateTerms {
    points_base: i32,
    requires_photo: bool,
}

/// Net effect of a record transition on the (user, project) aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateDelta {
    pub points: i32,
    pub completed: i32,
}

impl AggregateDelta {
    pub fn is_noop(&self) -> bool {
        self.points == 0 && self.completed == 0
    }
}

fn contribution(status: CompletionStatus, points_awarded: i32) -> i32 {
    if status.counts_toward_ranking() {
        points_awarded
    } else {
        0
    }
}

/// Delta between two record states. `old` is `None` for a first submission.
/// `completed` is +1 only on the first transition into approved.
pub fn aggregate_delta(
    old: Option<(CompletionStatus, i32)>,
    new: (CompletionStatus, i32),
) -> AggregateDelta {
    let old_contribution = old.map(|(s, p)| contribution(s, p)).unwrap_or(0);
    let old_completed = old.map(|(s, _)| s.counts_toward_ranking()).unwrap_or(false);
    let new_completed = new.0.counts_toward_ranking();

    AggregateDelta {
        points: contribution(new.0, new.1) - old_contribution,
        completed: i32::from(new_completed) - i32::from(old_completed),
    }
}

/// Status a new submission lands in, given the record's current state.
/// Approved days are terminal and reject resubmission.
pub fn submission_transition(current: Option<CompletionStatus>) -> Result<CompletionStatus> {
    match current {
        Some(CompletionStatus::Approved) => Err(StorageError::Validation(
            "this day has already been approved".to_string(),
        )),
        _ => Ok(CompletionStatus::PendingReview),
    }
}

/// Owns the proof-of-completion lifecycle: idempotent submission upserts,
/// evaluation, and the transactional ranking-aggregate update.
pub struct CompletionLedger<'a> {
    pool: &'a PgPool,
    policy: PointsPolicy,
    legacy_template_fallback: bool,
}

impl<'a> CompletionLedger<'a> {
    pub fn new(pool: &'a PgPool, policy: PointsPolicy, legacy_template_fallback: bool) -> Self {
        Self {
            pool,
            policy,
            legacy_template_fallback,
        }
    }

    /// Record a user's proof of completion for a project day.
    ///
    /// The upsert replaces the previous pending or rejected submission, so a
    /// retried call never accumulates points. The aggregate is untouched
    /// here: points only count once the record is approved.
    pub async fn submit(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        day_number: i32,
        media_refs: Vec<String>,
        notes: Option<String>,
    ) -> Result<CompletionRecord> {
        let terms = self.resolve_template(project_id, day_number).await?;

        let media_present = !media_refs.is_empty();
        if terms.requires_photo && !media_present {
            return Err(StorageError::Validation(
                "a photo is required to complete this day".to_string(),
            ));
        }

        let points = self.policy.submission_award(terms.points_base, media_present);

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, CompletionRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM completion_records
            WHERE user_id = $1 AND project_id = $2 AND day_number = $3
            FOR UPDATE
            "#
        ))
        .bind(user_id)
        .bind(project_id)
        .bind(day_number)
        .fetch_optional(&mut *tx)
        .await?;

        submission_transition(existing.map(|r| r.status))?;

        let record = sqlx::query_as::<_, CompletionRecord>(&format!(
            r#"
            INSERT INTO completion_records
                (user_id, project_id, day_number, status, points_awarded, media_refs, notes, submitted_at, evaluated_at)
            VALUES ($1, $2, $3, 'pending_review', $4, $5, $6, now(), NULL)
            ON CONFLICT (user_id, project_id, day_number) DO UPDATE SET
                status = 'pending_review',
                points_awarded = EXCLUDED.points_awarded,
                media_refs = EXCLUDED.media_refs,
                notes = EXCLUDED.notes,
                submitted_at = EXCLUDED.submitted_at,
                evaluated_at = NULL
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(project_id)
        .bind(day_number)
        .bind(points)
        .bind(Json(media_refs))
        .bind(&notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// Decide a pending submission. The approved award is re-derived from
    /// the template, and the aggregate delta is applied in the same
    /// transaction as the status change.
    pub async fn evaluate(
        &self,
        record_id: Uuid,
        decision: EvaluationDecision,
        notes: Option<String>,
    ) -> Result<CompletionRecord> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, CompletionRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM completion_records WHERE record_id = $1 FOR UPDATE"
        ))
        .bind(record_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        if existing.status != CompletionStatus::PendingReview {
            return Err(StorageError::Validation(
                "only submissions pending review can be evaluated".to_string(),
            ));
        }

        let (new_status, new_points) = match decision {
            EvaluationDecision::Approved => {
                let terms = self
                    .resolve_template(existing.project_id, existing.day_number)
                    .await?;
                (
                    CompletionStatus::Approved,
                    self.policy.approval_award(terms.points_base),
                )
            }
            EvaluationDecision::Rejected => {
                (CompletionStatus::Rejected, self.policy.rejection_award())
            }
        };

        let updated = sqlx::query_as::<_, CompletionRecord>(&format!(
            r#"
            UPDATE completion_records
            SET status = $2, points_awarded = $3, notes = COALESCE($4, notes), evaluated_at = now()
            WHERE record_id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(record_id)
        .bind(new_status)
        .bind(new_points)
        .bind(&notes)
        .fetch_one(&mut *tx)
        .await?;

        let delta = aggregate_delta(
            Some((existing.status, existing.points_awarded)),
            (updated.status, updated.points_awarded),
        );

        if !delta.is_noop() {
            let total_days = self.resolve_total_days(existing.project_id).await?;
            ranking::apply_delta(
                &mut tx,
                existing.user_id,
                existing.project_id,
                delta.points,
                delta.completed,
                total_days,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn resolve_template(&self, project_id: Uuid, day_number: i32) -> Result<TemplateTerms> {
        let repo = TemplateRepository::new(self.pool);

        if let Some(template) = repo.get(project_id, day_number).await? {
            return Ok(TemplateTerms {
                points_base: template.points_base,
                requires_photo: template.requires_photo,
            });
        }

        if self.legacy_template_fallback
            && let Some(task) = repo.find_legacy_task(project_id, day_number).await?
        {
            warn!(
                %project_id,
                day_number,
                "no day template configured, synthesizing terms from legacy task"
            );
            return Ok(TemplateTerms {
                points_base: task.points,
                requires_photo: false,
            });
        }

        Err(StorageError::Configuration(format!(
            "no day template configured for project {project_id} day {day_number}"
        )))
    }

    async fn resolve_total_days(&self, project_id: Uuid) -> Result<i32> {
        match ProjectRepository::new(self.pool).find_by_id(project_id).await? {
            Some(project) if project.total_days >= 1 => Ok(project.total_days),
            Some(_) => {
                warn!(%project_id, "project has a non-positive total_days, using the default");
                Ok(DEFAULT_TOTAL_DAYS)
            }
            None => {
                warn!(%project_id, "project row missing, using the default cycle length");
                Ok(DEFAULT_TOTAL_DAYS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CompletionStatus::*;

    #[test]
    fn first_approval_adds_points_and_a_completed_day() {
        // 25 provisional points, approval re-derives the award to the base 10.
        let delta = aggregate_delta(Some((PendingReview, 25)), (Approved, 10));
        assert_eq!(
            delta,
            AggregateDelta {
                points: 10,
                completed: 1
            }
        );
    }

    #[test]
    fn rejection_of_a_pending_record_changes_nothing() {
        let delta = aggregate_delta(Some((PendingReview, 25)), (Rejected, 0));
        assert!(delta.is_noop());
    }

    #[test]
    fn resubmission_after_rejection_changes_nothing() {
        let delta = aggregate_delta(Some((Rejected, 0)), (PendingReview, 25));
        assert!(delta.is_noop());
    }

    #[test]
    fn first_submission_contributes_nothing_until_approved() {
        let delta = aggregate_delta(None, (PendingReview, 25));
        assert!(delta.is_noop());
    }

    #[test]
    fn repeated_submission_is_idempotent() {
        // Submitting twice replaces the provisional award, so the second
        // transition starts from the first one's state and nets to zero.
        let first = aggregate_delta(None, (PendingReview, 25));
        let second = aggregate_delta(Some((PendingReview, 25)), (PendingReview, 25));
        assert!(first.is_noop());
        assert!(second.is_noop());
    }

    #[test]
    fn approved_days_are_terminal() {
        assert!(submission_transition(Some(Approved)).is_err());
        assert_eq!(submission_transition(None).unwrap(), PendingReview);
        assert_eq!(submission_transition(Some(Rejected)).unwrap(), PendingReview);
        assert_eq!(
            submission_transition(Some(PendingReview)).unwrap(),
            PendingReview
        );
    }

    #[test]
    fn totals_track_approved_contributions_across_a_sequence() {
        // Replay a submit/evaluate history and check the folded deltas match
        // the sum of approved awards at every step.
        let history: [(Option<(CompletionStatus, i32)>, (CompletionStatus, i32)); 5] = [
            (None, (PendingReview, 25)),
            (Some((PendingReview, 25)), (Approved, 10)),
            (None, (PendingReview, 12)),
            (Some((PendingReview, 12)), (Rejected, 0)),
            (Some((Rejected, 0)), (PendingReview, 12)),
        ];

        let mut total = 0;
        let mut completed = 0;
        for (old, new) in history {
            let delta = aggregate_delta(old, new);
            total += delta.points;
            completed += delta.completed;
        }

        assert_eq!(total, 10);
        assert_eq!(completed, 1);
    }
}
