use sqlx::{PgConnection, types::Json};
use uuid::Uuid;

use crate::pkg::internal::adaptors::applications::spec::{
    APPLICATION_COLUMNS, ApplicationEntry, ApplicationStatus, CreateApplicationData,
};
use crate::prelude::Result;

pub struct ApplicationMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicationMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicationMutator { pool }
    }

    pub async fn create(&mut self, application: CreateApplicationData) -> Result<ApplicationEntry> {
        let row = sqlx::query_as::<_, ApplicationEntry>(&format!(
            r#"
            INSERT INTO job_applications (job_id, applicant_name, applicant_email, applicant_phone,
                applicant_city, applicant_zip_code, member_id, resume_path, cover_letter, cover_letter_path,
                answers, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(application.job_id)
        .bind(application.applicant_name)
        .bind(application.applicant_email.to_lowercase())
        .bind(application.applicant_phone)
        .bind(application.applicant_city)
        .bind(application.applicant_zip_code)
        .bind(application.member_id)
        .bind(application.resume_path)
        .bind(application.cover_letter)
        .bind(application.cover_letter_path)
        .bind(Json(application.answers))
        .bind(ApplicationStatus::Submitted)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    /// any status may follow any other; only touches applications of `job_id`
    pub async fn update_status(
        &mut self,
        job_id: Uuid,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<ApplicationEntry>> {
        let row = sqlx::query_as::<_, ApplicationEntry>(&format!(
            "UPDATE job_applications SET status = $3 WHERE id = $2 AND job_id = $1 RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .bind(application_id)
        .bind(status)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }
}
