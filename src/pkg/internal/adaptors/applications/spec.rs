use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, Type, types::Json};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Submitted,
    Reviewed,
    Shortlisted,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Accepted,
    ];

    pub fn value(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::Reviewed => "Reviewed",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Accepted => "Accepted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationEntry {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: Option<String>,
    pub applicant_city: Option<String>,
    pub applicant_zip_code: Option<String>,
    pub member_id: Option<Uuid>,
    pub resume_path: Option<String>,
    pub cover_letter: Option<String>,
    pub cover_letter_path: Option<String>,
    pub answers: Json<BTreeMap<String, Value>>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

pub const APPLICATION_COLUMNS: &str = "id, job_id, applicant_name, applicant_email, applicant_phone, \
    applicant_city, applicant_zip_code, member_id, resume_path, cover_letter, cover_letter_path, answers, \
    status, created_at";

pub struct CreateApplicationData {
    pub job_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: Option<String>,
    pub applicant_city: Option<String>,
    pub applicant_zip_code: Option<String>,
    pub member_id: Option<Uuid>,
    pub resume_path: Option<String>,
    pub cover_letter: Option<String>,
    pub cover_letter_path: Option<String>,
    pub answers: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_status_round_trips_its_value() {
        for status in ApplicationStatus::ALL {
            let parsed: ApplicationStatus = serde_json::from_value(Value::from(status.value())).unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::Submitted);
    }
}
