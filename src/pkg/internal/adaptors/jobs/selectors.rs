use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    pkg::internal::adaptors::jobs::spec::{JOB_COLUMNS, JobEntry, JobStatus},
    prelude::Result,
};

pub struct JobSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> JobSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        JobSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *self.pool)
            .await?;
        Ok(row)
    }

    /// posting with `id`, only if `email` submitted it
    pub async fn get_owned(&mut self, id: Uuid, email: &str) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            "SELECT {} FROM jobs WHERE id = $1 AND lower(submitter_email) = lower($2)",
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(email.trim())
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row.filter(|job| job.is_owned_by(email)))
    }

    pub async fn get_listed_by_slug(&mut self, slug: &str, now: DateTime<Utc>) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            "SELECT {} FROM jobs WHERE slug = $1 AND status = $2 AND (expires_at IS NULL OR expires_at > $3)",
            JOB_COLUMNS
        ))
        .bind(slug)
        .bind(JobStatus::Approved)
        .bind(now)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row.filter(|job| job.is_listed(now)))
    }

    /// public listing: approved, unexpired, featured first then newest
    pub async fn get_listed(&mut self, now: DateTime<Utc>) -> Result<Vec<JobEntry>> {
        let rows = sqlx::query_as::<_, JobEntry>(&format!(
            "SELECT {} FROM jobs WHERE status = $1 AND (expires_at IS NULL OR expires_at > $2) \
             ORDER BY featured DESC, created_at DESC",
            JOB_COLUMNS
        ))
        .bind(JobStatus::Approved)
        .bind(now)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows.into_iter().filter(|job| job.is_listed(now)).collect())
    }

    pub async fn get_all(&mut self) -> Result<Vec<JobEntry>> {
        let rows = sqlx::query_as::<_, JobEntry>(&format!("SELECT {} FROM jobs ORDER BY created_at DESC", JOB_COLUMNS))
            .fetch_all(&mut *self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_status(&mut self, status: JobStatus) -> Result<Vec<JobEntry>> {
        let rows = sqlx::query_as::<_, JobEntry>(&format!(
            "SELECT {} FROM jobs WHERE status = $1 ORDER BY created_at ASC",
            JOB_COLUMNS
        ))
        .bind(status)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn submitter_exists(&mut self, email: &str) -> Result<bool> {
        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM jobs WHERE lower(submitter_email) = lower($1) LIMIT 1")
                .bind(email.trim())
                .fetch_optional(&mut *self.pool)
                .await?;
        Ok(found.is_some())
    }
}
