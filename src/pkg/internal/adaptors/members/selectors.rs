use sqlx::PgConnection;

use crate::pkg::internal::adaptors::members::spec::{MEMBER_COLUMNS, MemberEntry};
use crate::prelude::Result;

pub struct MemberSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> MemberSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        MemberSelector { pool }
    }

    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<MemberEntry>> {
        let row = sqlx::query_as::<_, MemberEntry>(&format!(
            "SELECT {} FROM members WHERE lower(email) = lower($1)",
            MEMBER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_alert_subscribers(&mut self) -> Result<Vec<MemberEntry>> {
        let rows = sqlx::query_as::<_, MemberEntry>(&format!(
            "SELECT {} FROM members WHERE subscribed_to_job_alerts ORDER BY created_at ASC",
            MEMBER_COLUMNS
        ))
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }
}
