use askama::Template;
use chrono::{DateTime, Utc};

use crate::pkg::internal::{
    adaptors::{
        applications::spec::{ApplicationEntry, ApplicationStatus},
        jobs::spec::{JobEntry, JobStatus, JobType, LocationType, Submitter},
    },
    minio::public_url,
    questions::{CustomQuestion, QuestionKind},
};

pub fn short_date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct Home {
    pub signed_in: bool,
    pub is_member: bool,
    pub jobs: Vec<JobEntry>,
    pub membership_url: String,
}

#[derive(Template)]
#[template(path = "job_detail.html")]
pub struct JobDetail {
    pub job: JobEntry,
    pub questions: Vec<CustomQuestion>,
    pub expires: Option<String>,
}

#[derive(Template)]
#[template(path = "job_gate.html")]
pub struct JobGate {
    pub title: String,
    pub membership_url: String,
}

#[derive(Template)]
#[template(path = "apply_success.html")]
pub struct ApplySuccess {
    pub title: String,
    pub organization: String,
}

#[derive(Template)]
#[template(path = "submit_phone.html")]
pub struct SubmitPhone {}

#[derive(Template)]
#[template(path = "submit_form.html")]
pub struct SubmitForm {
    pub found: bool,
    pub submitter: Submitter,
    pub job_types: [JobType; 5],
    pub location_types: [LocationType; 3],
}

#[derive(Template)]
#[template(path = "submit_success.html")]
pub struct SubmitSuccess {}

#[derive(Template)]
#[template(path = "signin.html")]
pub struct SignIn {
    pub action: &'static str,
    pub heading: &'static str,
    pub hint: &'static str,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "verify.html")]
pub struct Verify {
    pub message: Option<String>,
    pub next: String,
}

pub struct PosterJobCard {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub status_label: &'static str,
    pub created: String,
    pub application_count: i64,
    /// stored status still allows archiving, so approved postings past expiry qualify
    pub can_archive: bool,
    /// only the submitter may manage a posting; associated ones are listed read-only
    pub is_owned: bool,
}

impl PosterJobCard {
    pub fn new(job: &JobEntry, status: JobStatus, application_count: i64, is_owned: bool) -> Self {
        PosterJobCard {
            id: job.id.to_string(),
            title: job.title.clone(),
            organization: job.organization.clone(),
            status_label: status.label(),
            created: short_date(&job.created_at),
            application_count,
            can_archive: job.status.can_transition_to(JobStatus::Archived),
            is_owned,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct Dashboard {
    pub email: String,
    pub active: Vec<PosterJobCard>,
    pub pending: Vec<PosterJobCard>,
    pub past: Vec<PosterJobCard>,
    pub total_applications: i64,
}

impl Dashboard {
    pub fn total(&self) -> usize {
        self.active.len() + self.pending.len() + self.past.len()
    }
}

#[derive(Template)]
#[template(path = "edit_job.html")]
pub struct EditJob {
    pub job: JobEntry,
    pub status_label: &'static str,
    pub is_pending: bool,
    pub is_live: bool,
    pub expires: String,
    pub questions_json: String,
    pub saved: bool,
    pub job_types: [JobType; 5],
    pub location_types: [LocationType; 3],
}

pub struct ApplicantView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub place: Option<String>,
    pub status: ApplicationStatus,
    pub applied: String,
    pub is_member: bool,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
    pub cover_letter_url: Option<String>,
    pub answers: Vec<(String, String)>,
}

impl ApplicantView {
    pub fn new(application: ApplicationEntry, questions: &[CustomQuestion], public_base: &str, bucket: &str) -> Self {
        let answers = questions
            .iter()
            .filter_map(|q| {
                let answer = application.answers.0.get(&q.id)?;
                let text = match (q.kind, answer) {
                    (QuestionKind::Checkbox, serde_json::Value::Array(values)) => values
                        .iter()
                        .filter_map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    (_, serde_json::Value::String(s)) => s.clone(),
                    (_, other) => other.to_string(),
                };
                Some((q.question.clone(), text))
            })
            .collect();
        let place = match (&application.applicant_city, &application.applicant_zip_code) {
            (Some(city), Some(zip)) => Some(format!("{}, {}", city, zip)),
            (Some(city), None) => Some(city.clone()),
            (None, Some(zip)) => Some(zip.clone()),
            (None, None) => None,
        };
        ApplicantView {
            id: application.id.to_string(),
            name: application.applicant_name,
            email: application.applicant_email,
            phone: application.applicant_phone,
            place,
            status: application.status,
            applied: short_date(&application.created_at),
            is_member: application.member_id.is_some(),
            resume_url: application.resume_path.map(|p| public_url(public_base, bucket, &p)),
            cover_letter: application.cover_letter.filter(|c| !c.trim().is_empty()),
            cover_letter_url: application.cover_letter_path.map(|p| public_url(public_base, bucket, &p)),
            answers,
        }
    }
}

#[derive(Template)]
#[template(path = "applicants.html")]
pub struct Applicants {
    pub job_id: String,
    pub title: String,
    pub posted: String,
    pub applicants: Vec<ApplicantView>,
    pub statuses: [ApplicationStatus; 5],
}

#[derive(Template)]
#[template(path = "review.html")]
pub struct ReviewQueue {
    pub jobs: Vec<JobEntry>,
}

#[derive(Template)]
#[template(path = "unsubscribe.html")]
pub struct Unsubscribe {
    pub success: bool,
    pub message: String,
    pub portal_url: String,
}
