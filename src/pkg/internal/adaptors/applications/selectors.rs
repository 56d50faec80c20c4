use std::collections::HashMap;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::applications::spec::{APPLICATION_COLUMNS, ApplicationEntry};
use crate::prelude::Result;

pub struct ApplicationSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicationSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicationSelector { pool }
    }

    pub async fn get_by_job(&mut self, job_id: Uuid) -> Result<Vec<ApplicationEntry>> {
        let rows = sqlx::query_as::<_, ApplicationEntry>(&format!(
            "SELECT {} FROM job_applications WHERE job_id = $1 ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    /// application counts keyed by job id; jobs without applications are absent
    pub async fn count_by_jobs(&mut self, job_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if job_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT job_id, COUNT(*) FROM job_applications WHERE job_id = ANY($1) GROUP BY job_id",
        )
        .bind(job_ids)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
