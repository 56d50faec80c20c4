use chrono::{DateTime, Utc};
use sqlx::{PgConnection, types::Json};
use uuid::Uuid;

use crate::pkg::internal::adaptors::jobs::spec::{JOB_COLUMNS, JobDetails, JobEntry, JobStatus, Submitter};
use crate::prelude::Result;

pub struct JobMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> JobMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        JobMutator { pool }
    }

    /// new postings always start out pending review
    pub async fn create(&mut self, slug: &str, job: &JobDetails, submitter: &Submitter) -> Result<JobEntry> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            r#"
            INSERT INTO jobs (slug, title, organization, description, job_type, location, location_type,
                is_paid, salary_range, hourly_rate, requirements, qualifications, contact_name, contact_email,
                contact_phone, application_url, application_instructions, expires_at, custom_questions,
                require_resume, require_cover_letter, status, submitter_name, submitter_email, submitter_phone,
                submitter_address, submitter_city, submitter_state, submitter_zip_code, submitter_date_of_birth,
                submitter_employer, submitter_organization, member_id, donor_id, subscriber_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34, $35)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(slug)
        .bind(&job.title)
        .bind(&job.organization)
        .bind(&job.description)
        .bind(job.job_type)
        .bind(&job.location)
        .bind(job.location_type)
        .bind(job.is_paid)
        .bind(&job.salary_range)
        .bind(&job.hourly_rate)
        .bind(&job.requirements)
        .bind(&job.qualifications)
        .bind(&job.contact_name)
        .bind(job.contact_email.to_lowercase())
        .bind(&job.contact_phone)
        .bind(&job.application_url)
        .bind(&job.application_instructions)
        .bind(job.expires_at)
        .bind(Json(&job.custom_questions))
        .bind(job.require_resume)
        .bind(job.require_cover_letter)
        .bind(JobStatus::Pending)
        .bind(&submitter.name)
        .bind(submitter.email.to_lowercase())
        .bind(&submitter.phone)
        .bind(&submitter.address)
        .bind(&submitter.city)
        .bind(&submitter.state)
        .bind(&submitter.zip_code)
        .bind(&submitter.date_of_birth)
        .bind(&submitter.employer)
        .bind(&submitter.organization)
        .bind(&submitter.member_id)
        .bind(&submitter.donor_id)
        .bind(&submitter.subscriber_id)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_details(&mut self, id: Uuid, job: &JobDetails) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            r#"
            UPDATE jobs SET title = $2, organization = $3, description = $4, job_type = $5, location = $6,
                location_type = $7, is_paid = $8, salary_range = $9, hourly_rate = $10, requirements = $11,
                qualifications = $12, contact_name = $13, contact_email = $14, contact_phone = $15,
                application_url = $16, application_instructions = $17, expires_at = $18,
                custom_questions = $19, require_resume = $20, require_cover_letter = $21,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(&job.title)
        .bind(&job.organization)
        .bind(&job.description)
        .bind(job.job_type)
        .bind(&job.location)
        .bind(job.location_type)
        .bind(job.is_paid)
        .bind(&job.salary_range)
        .bind(&job.hourly_rate)
        .bind(&job.requirements)
        .bind(&job.qualifications)
        .bind(&job.contact_name)
        .bind(job.contact_email.to_lowercase())
        .bind(&job.contact_phone)
        .bind(&job.application_url)
        .bind(&job.application_instructions)
        .bind(job.expires_at)
        .bind(Json(&job.custom_questions))
        .bind(job.require_resume)
        .bind(job.require_cover_letter)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_status(&mut self, id: Uuid, status: JobStatus) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            "UPDATE jobs SET status = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING {}",
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn expire_due(&mut self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $1, updated_at = CURRENT_TIMESTAMP \
             WHERE status = $2 AND expires_at IS NOT NULL AND expires_at <= $3",
        )
        .bind(JobStatus::Expired)
        .bind(JobStatus::Approved)
        .bind(now)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
