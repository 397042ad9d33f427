use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::CompletionRecord;

const RECORD_COLUMNS: &str = r#"
    record_id, user_id, project_id, day_number, status, points_awarded,
    media_refs, notes, submitted_at, evaluated_at, created_at
"#;

pub struct CompletionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompletionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, record_id: Uuid) -> Result<CompletionRecord> {
        let record = sqlx::query_as::<_, CompletionRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM completion_records WHERE record_id = $1"
        ))
        .bind(record_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(record)
    }

    /// Ledger listing for the operator surface, filtered by user and/or project.
    pub async fn list(
        &self,
        user_id: Option<Uuid>,
        project_id: Option<Uuid>,
    ) -> Result<Vec<CompletionRecord>> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {RECORD_COLUMNS} FROM completion_records WHERE 1=1"
        ));

        if let Some(user_id) = user_id {
            query.push(" AND user_id = ");
            query.push_bind(user_id);
        }

        if let Some(project_id) = project_id {
            query.push(" AND project_id = ");
            query.push_bind(project_id);
        }

        query.push(" ORDER BY project_id, user_id, day_number");

        let records = query.build_query_as().fetch_all(self.pool).await?;

        Ok(records)
    }
}
