use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type, types::Json};
use uuid::Uuid;

use crate::pkg::internal::questions::CustomQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Approved,
    Rejected,
    Archived,
    Expired,
}

impl JobStatus {
    /// reviewer decides pending postings, posters archive their own, time expires approved ones
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Archived) | (Approved, Archived) | (Approved, Expired)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending Review",
            JobStatus::Approved => "Active",
            JobStatus::Rejected => "Rejected",
            JobStatus::Archived => "Archived",
            JobStatus::Expired => "Expired",
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Approved => "approved",
            JobStatus::Rejected => "rejected",
            JobStatus::Archived => "archived",
            JobStatus::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[sqlx(type_name = "job_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Internship,
    Volunteer,
    Contract,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Internship,
        JobType::Volunteer,
        JobType::Contract,
    ];

    pub fn value(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Internship => "internship",
            JobType::Volunteer => "volunteer",
            JobType::Contract => "contract",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-Time",
            JobType::PartTime => "Part-Time",
            JobType::Internship => "Internship",
            JobType::Volunteer => "Volunteer",
            JobType::Contract => "Contract",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[sqlx(type_name = "location_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    #[default]
    InPerson,
    Remote,
    Hybrid,
}

impl LocationType {
    pub const ALL: [LocationType; 3] = [LocationType::InPerson, LocationType::Remote, LocationType::Hybrid];

    pub fn value(&self) -> &'static str {
        match self {
            LocationType::InPerson => "in-person",
            LocationType::Remote => "remote",
            LocationType::Hybrid => "hybrid",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LocationType::InPerson => "In-Person",
            LocationType::Remote => "Remote",
            LocationType::Hybrid => "Hybrid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobEntry {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub organization: String,
    pub description: String,
    pub job_type: JobType,
    pub location: Option<String>,
    pub location_type: LocationType,
    pub is_paid: bool,
    pub salary_range: Option<String>,
    pub hourly_rate: Option<String>,
    pub requirements: Option<String>,
    pub qualifications: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub application_url: Option<String>,
    pub application_instructions: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub featured: bool,
    pub submitter_name: String,
    pub submitter_email: String,
    pub submitter_phone: Option<String>,
    pub submitter_address: Option<String>,
    pub submitter_city: Option<String>,
    pub submitter_state: Option<String>,
    pub submitter_zip_code: Option<String>,
    pub submitter_date_of_birth: Option<String>,
    pub submitter_employer: Option<String>,
    pub submitter_organization: Option<String>,
    pub member_id: Option<String>,
    pub donor_id: Option<String>,
    pub subscriber_id: Option<String>,
    pub custom_questions: Json<Vec<CustomQuestion>>,
    pub require_resume: bool,
    pub require_cover_letter: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const JOB_COLUMNS: &str = "id, slug, title, organization, description, job_type, location, location_type, \
    is_paid, salary_range, hourly_rate, requirements, qualifications, contact_name, contact_email, contact_phone, \
    application_url, application_instructions, expires_at, status, featured, submitter_name, submitter_email, \
    submitter_phone, submitter_address, submitter_city, submitter_state, submitter_zip_code, \
    submitter_date_of_birth, submitter_employer, submitter_organization, member_id, donor_id, subscriber_id, \
    custom_questions, require_resume, require_cover_letter, created_at, updated_at";

impl JobEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    /// stored status, except that approved postings past their expiry read as expired
    pub fn effective_status(&self, now: DateTime<Utc>) -> JobStatus {
        match self.status {
            JobStatus::Approved if self.is_expired(now) => JobStatus::Expired,
            status => status,
        }
    }

    pub fn is_listed(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Approved && !self.is_expired(now)
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.submitter_email.to_lowercase() == email.trim().to_lowercase()
    }

    pub fn questions(&self) -> &[CustomQuestion] {
        &self.custom_questions.0
    }
}

/// fields a submitter or the owning poster may write
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: String,
    pub organization: String,
    pub description: String,
    pub job_type: JobType,
    pub location: Option<String>,
    pub location_type: LocationType,
    pub is_paid: bool,
    pub salary_range: Option<String>,
    pub hourly_rate: Option<String>,
    pub requirements: Option<String>,
    pub qualifications: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub application_url: Option<String>,
    pub application_instructions: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub custom_questions: Vec<CustomQuestion>,
    pub require_resume: bool,
    pub require_cover_letter: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submitter {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub date_of_birth: Option<String>,
    pub employer: Option<String>,
    pub organization: Option<String>,
    pub member_id: Option<String>,
    pub donor_id: Option<String>,
    pub subscriber_id: Option<String>,
}

pub fn slugify(title: &str, suffix: &str) -> String {
    let mut slug = String::with_capacity(title.len() + suffix.len() + 1);
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    match (slug.is_empty(), suffix.is_empty()) {
        (true, _) => suffix.to_string(),
        (false, true) => slug.to_string(),
        (false, false) => format!("{}-{}", slug, suffix),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Duration;

    use super::*;

    pub(crate) fn job(submitter: &str, contact: &str) -> JobEntry {
        let now = Utc::now();
        JobEntry {
            id: Uuid::new_v4(),
            slug: slugify("Field Organizer", "ab12"),
            title: "Field Organizer".into(),
            organization: "County Party".into(),
            description: "Knock doors".into(),
            job_type: JobType::FullTime,
            location: Some("Kansas City".into()),
            location_type: LocationType::InPerson,
            is_paid: true,
            salary_range: Some("$40,000 - $50,000".into()),
            hourly_rate: None,
            requirements: None,
            qualifications: None,
            contact_name: None,
            contact_email: contact.into(),
            contact_phone: None,
            application_url: None,
            application_instructions: None,
            expires_at: None,
            status: JobStatus::Approved,
            featured: false,
            submitter_name: "Sam".into(),
            submitter_email: submitter.into(),
            submitter_phone: None,
            submitter_address: None,
            submitter_city: None,
            submitter_state: None,
            submitter_zip_code: None,
            submitter_date_of_birth: None,
            submitter_employer: None,
            submitter_organization: None,
            member_id: None,
            donor_id: None,
            subscriber_id: None,
            custom_questions: Json(vec![]),
            require_resume: false,
            require_cover_letter: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_expired_posting_is_never_listed() {
        let now = Utc::now();
        let mut posting = job("a@x.org", "a@x.org");
        posting.expires_at = Some(now - Duration::hours(1));
        assert!(!posting.is_listed(now));
        assert_eq!(posting.effective_status(now), JobStatus::Expired);

        posting.expires_at = Some(now + Duration::days(3));
        assert!(posting.is_listed(now));
        assert_eq!(posting.effective_status(now), JobStatus::Approved);

        posting.status = JobStatus::Pending;
        assert!(!posting.is_listed(now));
        posting.expires_at = Some(now - Duration::hours(1));
        assert_eq!(posting.effective_status(now), JobStatus::Pending);
    }

    #[test]
    fn test_status_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Approved));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Rejected));
        assert!(JobStatus::Approved.can_transition_to(JobStatus::Archived));
        assert!(JobStatus::Approved.can_transition_to(JobStatus::Expired));
        assert!(!JobStatus::Rejected.can_transition_to(JobStatus::Approved));
        assert!(!JobStatus::Archived.can_transition_to(JobStatus::Approved));
        assert!(!JobStatus::Approved.can_transition_to(JobStatus::Pending));
    }

    #[test]
    fn test_ownership_ignores_case() {
        let posting = job("Chair@Example.org", "jobs@example.org");
        assert!(posting.is_owned_by("chair@example.org "));
        assert!(!posting.is_owned_by("jobs@example.org"));
        let posting = job("ÉLISE@Example.org", "jobs@example.org");
        assert!(posting.is_owned_by("élise@example.org"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Campaign Manager (Remote)! ", "x1y2"), "campaign-manager-remote-x1y2");
        assert_eq!(slugify("???", "x1y2"), "x1y2");
        assert_eq!(slugify("Intern", ""), "intern");
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&JobType::FullTime).unwrap(), "\"full-time\"");
        assert_eq!(serde_json::to_string(&LocationType::InPerson).unwrap(), "\"in-person\"");
        assert_eq!(serde_json::to_string(&JobStatus::Approved).unwrap(), "\"approved\"");
        for t in JobType::ALL {
            let parsed: JobType = serde_json::from_str(&format!("\"{}\"", t.value())).unwrap();
            assert_eq!(parsed, t);
        }
    }
}
