use std::collections::HashMap;

use askama::Template;
use axum::{
    Extension,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::Html,
};
use chrono::Utc;
use standard_error::{Interpolate, StandardError, Status};
use validator::Validate;

use crate::{
    conf::settings,
    pkg::{
        internal::{
            adaptors::{
                applications::{mutators::ApplicationMutator, spec::CreateApplicationData},
                jobs::{selectors::JobSelector, spec::JobEntry},
                members::{selectors::MemberSelector, spec::MemberEntry},
            },
            email::{SendEmail, application::NewApplicant},
            minio::{S3Ops, application_object_key, document_mime_type},
            questions::validate_answers,
        },
        server::{
            handlers::forms::validation_error,
            middlewares::authn::Viewer,
            state::{AppState, GetTxn},
            uispec::{ApplySuccess, Home, JobDetail, JobGate, short_date},
        },
    },
    prelude::Result,
};

const ANSWER_PREFIX: &str = "answer_";

async fn viewer_membership(state: &AppState, viewer: &Viewer) -> Result<Option<MemberEntry>> {
    let Some(user) = &viewer.0 else {
        return Ok(None);
    };
    let mut tx = state.db_pool.begin_txn().await?;
    MemberSelector::new(&mut *tx).get_by_email(&user.email).await
}

fn not_found() -> StandardError {
    StandardError::new("ERR-JOB-404").code(StatusCode::NOT_FOUND)
}

pub async fn home(State(state): State<AppState>, Extension(viewer): Extension<Viewer>) -> Result<Html<String>> {
    let jobs = {
        let mut tx = state.db_pool.begin_txn().await?;
        JobSelector::new(&mut *tx).get_listed(Utc::now()).await?
    };
    let member = viewer_membership(&state, &viewer).await?;
    tracing::debug!("listing {} postings, member: {}", jobs.len(), member.is_some());
    let template = Home {
        signed_in: viewer.0.is_some(),
        is_member: member.is_some(),
        jobs,
        membership_url: settings.membership_url.clone(),
    };
    Ok(Html(template.render()?))
}

async fn listed_job(state: &AppState, slug: &str) -> Result<JobEntry> {
    let mut tx = state.db_pool.begin_txn().await?;
    JobSelector::new(&mut *tx)
        .get_listed_by_slug(slug, Utc::now())
        .await?
        .ok_or_else(not_found)
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(slug): Path<String>,
) -> Result<Html<String>> {
    let job = listed_job(&state, &slug).await?;
    if viewer_membership(&state, &viewer).await?.is_none() {
        let gate = JobGate {
            title: job.title,
            membership_url: settings.membership_url.clone(),
        };
        return Ok(Html(gate.render()?));
    }
    let template = JobDetail {
        questions: job.questions().to_vec(),
        expires: job.expires_at.as_ref().map(short_date),
        job,
    };
    Ok(Html(template.render()?))
}

pub struct Upload {
    pub file_name: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct ApplicationForm {
    pub fields: HashMap<String, String>,
    pub answers: HashMap<String, Vec<String>>,
    pub resume: Option<Upload>,
    pub cover_letter_file: Option<Upload>,
}

#[derive(Debug, Validate)]
pub struct ApplicantInput {
    #[validate(length(min = 1, message = "your name is required"))]
    pub applicant_name: String,
    #[validate(email(message = "your email must be a valid email address"))]
    pub applicant_email: String,
}

fn form_error(err: MultipartError) -> StandardError {
    StandardError::new("ERR-APPLY-001")
        .code(StatusCode::BAD_REQUEST)
        .interpolate_err(err.to_string())
}

impl ApplicationForm {
    pub async fn read(multipart: &mut Multipart) -> Result<Self> {
        let mut form = ApplicationForm::default();
        while let Some(field) = multipart.next_field().await.map_err(form_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "resume" | "cover_letter_file" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await.map_err(form_error)?;
                    // browsers send an empty part for an untouched file input
                    if file_name.is_empty() || data.is_empty() {
                        continue;
                    }
                    let content_type = document_mime_type(&file_name, data.len())
                        .map_err(|mut e| e.code(StatusCode::BAD_REQUEST))?;
                    let upload = Upload {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    };
                    if name == "resume" {
                        form.resume = Some(upload);
                    } else {
                        form.cover_letter_file = Some(upload);
                    }
                }
                _ => {
                    let value = field.text().await.map_err(form_error)?;
                    form.push_text(&name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn push_text(&mut self, name: &str, value: String) {
        match name.strip_prefix(ANSWER_PREFIX) {
            Some(id) => self.answers.entry(id.to_string()).or_default().push(value),
            None => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// document requirements a posting may set
    pub fn check_documents(&self, job: &JobEntry) -> Result<()> {
        let missing = |what: &str| {
            StandardError::new("ERR-APPLY-004")
                .code(StatusCode::BAD_REQUEST)
                .interpolate_err(format!("{} is required for this posting", what))
        };
        if job.require_resume && self.resume.is_none() {
            return Err(missing("a resume"));
        }
        if job.require_cover_letter && self.cover_letter_file.is_none() && self.text("cover_letter").is_none() {
            return Err(missing("a cover letter"));
        }
        Ok(())
    }
}

async fn store(state: &AppState, job: &JobEntry, upload: Option<Upload>) -> Result<Option<String>> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    let key = application_object_key(&job.id, &upload.file_name);
    state
        .s3_client
        .upload_object(&settings.s3_bucket_name, &key, upload.data, upload.content_type)
        .await?;
    Ok(Some(key))
}

pub async fn apply(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(slug): Path<String>,
    mut multipart: Multipart,
) -> Result<Html<String>> {
    let forbidden = || StandardError::new("ERR-APPLY-005").code(StatusCode::FORBIDDEN);
    let job = listed_job(&state, &slug).await?;
    let member = viewer_membership(&state, &viewer).await?.ok_or_else(forbidden)?;

    let mut form = ApplicationForm::read(&mut multipart).await?;
    let applicant = ApplicantInput {
        applicant_name: form.text("applicant_name").unwrap_or_else(|| member.full_name()),
        applicant_email: form.text("applicant_email").unwrap_or_else(|| member.email.clone()),
    };
    applicant.validate().map_err(validation_error)?;
    form.check_documents(&job)?;
    let answers = validate_answers(job.questions(), &form.answers).map_err(|mut e| e.code(StatusCode::BAD_REQUEST))?;

    let resume_path = store(&state, &job, form.resume.take()).await?;
    let cover_letter_path = store(&state, &job, form.cover_letter_file.take()).await?;

    let mut tx = state.db_pool.begin_txn().await?;
    let application = ApplicationMutator::new(&mut *tx)
        .create(CreateApplicationData {
            job_id: job.id,
            applicant_name: applicant.applicant_name,
            applicant_email: applicant.applicant_email.to_lowercase(),
            applicant_phone: form.text("applicant_phone"),
            applicant_city: form.text("applicant_city"),
            applicant_zip_code: form.text("applicant_zip_code"),
            member_id: Some(member.id),
            resume_path,
            cover_letter: form.text("cover_letter"),
            cover_letter_path,
            answers,
        })
        .await?;
    tx.commit().await?;
    tracing::info!("application {} received for {}", application.id, &job.slug);

    let notice = NewApplicant {
        applicant_name: &application.applicant_name,
        title: &job.title,
        job_id: &job.id.to_string(),
        base_url: &settings.base_url,
    };
    if let Err(e) = notice.send(&job.submitter_email) {
        tracing::warn!("could not notify poster of {}: {:?}", &job.slug, e);
    }
    let template = ApplySuccess {
        title: job.title,
        organization: job.organization,
    };
    Ok(Html(template.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::internal::adaptors::jobs::spec::tests::job;

    #[test]
    fn test_answers_are_collected_by_question_id() {
        let mut form = ApplicationForm::default();
        form.push_text("applicant_name", "  Ari ".into());
        form.push_text("answer_teams", "Field".into());
        form.push_text("answer_teams", "Digital".into());
        form.push_text("answer_why", "Because".into());
        form.push_text("applicant_phone", "   ".into());
        assert_eq!(form.text("applicant_name").as_deref(), Some("Ari"));
        assert!(form.text("applicant_phone").is_none());
        assert_eq!(form.answers["teams"], vec!["Field".to_string(), "Digital".to_string()]);
        assert_eq!(form.answers["why"], vec!["Because".to_string()]);
        assert!(!form.fields.contains_key("answer_why"));
    }

    #[test]
    fn test_required_documents() {
        let mut posting = job("poster@example.org", "hr@example.org");
        posting.require_resume = true;
        posting.require_cover_letter = true;
        let mut form = ApplicationForm::default();
        assert!(form.check_documents(&posting).is_err());

        form.resume = Some(Upload {
            file_name: "cv.pdf".into(),
            content_type: "application/pdf",
            data: vec![1],
        });
        assert!(form.check_documents(&posting).is_err());

        form.push_text("cover_letter", "I would love to help.".into());
        assert!(form.check_documents(&posting).is_ok());
    }

    #[test]
    fn test_applicant_validation() {
        let input = ApplicantInput {
            applicant_name: "Ari".into(),
            applicant_email: "not-an-email".into(),
        };
        assert!(input.validate().is_err());
    }
}
