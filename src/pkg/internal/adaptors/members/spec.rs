use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MemberEntry {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub subscribed_to_job_alerts: bool,
    pub created_at: DateTime<Utc>,
}

pub const MEMBER_COLUMNS: &str = "id, email, first_name, last_name, phone, subscribed_to_job_alerts, created_at";

impl MemberEntry {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}
