use sqlx::PgConnection;
use uuid::Uuid;

use crate::prelude::Result;

pub struct MemberMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> MemberMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        MemberMutator { pool }
    }

    /// returns false when no member has this id
    pub async fn set_job_alerts(&mut self, member_id: Uuid, subscribed: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE members SET subscribed_to_job_alerts = $2 WHERE id = $1")
            .bind(member_id)
            .bind(subscribed)
            .execute(&mut *self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
