use std::{collections::HashMap, sync::Arc};

use askama::Template;
use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use standard_error::{Interpolate, StandardError, Status};
use uuid::Uuid;
use validator::Validate;

use crate::{
    conf::settings,
    pkg::{
        internal::{
            adaptors::{
                applications::{
                    mutators::ApplicationMutator, selectors::ApplicationSelector, spec::ApplicationStatus,
                },
                jobs::{
                    mutators::JobMutator,
                    selectors::JobSelector,
                    spec::{JobEntry, JobStatus, JobType, LocationType},
                },
            },
            association::associated_postings,
            auth::User,
        },
        server::{
            handlers::forms::{JobForm, validation_error},
            state::{AppState, GetTxn},
            uispec::{ApplicantView, Applicants, Dashboard, EditJob, PosterJobCard, short_date},
        },
    },
    prelude::Result,
};

#[derive(Deserialize)]
pub struct EditQuery {
    pub saved: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusInput {
    pub status: ApplicationStatus,
}

fn not_found() -> StandardError {
    StandardError::new("ERR-JOB-404").code(StatusCode::NOT_FOUND)
}

/// Splits the grouped postings into active, pending and past, each card
/// carrying its application count.
pub fn build_dashboard(
    email: &str,
    postings: &[JobEntry],
    counts: &HashMap<Uuid, i64>,
    now: DateTime<Utc>,
) -> Dashboard {
    let mut dashboard = Dashboard {
        email: email.to_string(),
        active: vec![],
        pending: vec![],
        past: vec![],
        total_applications: 0,
    };
    for job in postings {
        let status = job.effective_status(now);
        let count = counts.get(&job.id).copied().unwrap_or(0);
        dashboard.total_applications += count;
        let card = PosterJobCard::new(job, status, count, job.is_owned_by(email));
        match status {
            JobStatus::Approved => dashboard.active.push(card),
            JobStatus::Pending => dashboard.pending.push(card),
            _ => dashboard.past.push(card),
        }
    }
    dashboard
}

pub async fn dashboard(State(state): State<AppState>, Extension(user): Extension<Arc<User>>) -> Result<Html<String>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let postings = associated_postings(&user.email, JobSelector::new(&mut *tx).get_all().await?);
    let ids: Vec<Uuid> = postings.iter().map(|job| job.id).collect();
    let counts = ApplicationSelector::new(&mut *tx).count_by_jobs(&ids).await?;
    tracing::debug!("{} sees {} postings", &user.email, postings.len());
    Ok(Html(build_dashboard(&user.email, &postings, &counts, Utc::now()).render()?))
}

async fn owned_job(state: &AppState, id: Uuid, user: &User) -> Result<JobEntry> {
    let mut tx = state.db_pool.begin_txn().await?;
    JobSelector::new(&mut *tx)
        .get_owned(id, &user.email)
        .await?
        .ok_or_else(not_found)
}

fn edit_page(job: JobEntry, saved: bool) -> Result<EditJob> {
    let status = job.effective_status(Utc::now());
    Ok(EditJob {
        status_label: status.label(),
        is_pending: status == JobStatus::Pending,
        is_live: status == JobStatus::Approved,
        expires: job
            .expires_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        questions_json: serde_json::to_string(job.questions())?,
        saved,
        job_types: JobType::ALL,
        location_types: LocationType::ALL,
        job,
    })
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
    Query(query): Query<EditQuery>,
) -> Result<Html<String>> {
    let job = owned_job(&state, id, &user).await?;
    Ok(Html(edit_page(job, query.saved.is_some())?.render()?))
}

/// writes the posting fields; status is left alone
pub async fn edit(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
    Form(input): Form<JobForm>,
) -> Result<Redirect> {
    let job = owned_job(&state, id, &user).await?;
    input.validate().map_err(validation_error)?;
    let details = input.into_details(Utc::now(), job.expires_at)?;
    let mut tx = state.db_pool.begin_txn().await?;
    JobMutator::new(&mut *tx)
        .update_details(job.id, &details)
        .await?
        .ok_or_else(not_found)?;
    tx.commit().await?;
    tracing::info!("{} edited posting {}", &user.email, &job.slug);
    Ok(Redirect::to(&format!("/poster/jobs/{}?saved=1", job.id)))
}

pub async fn archive(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
) -> Result<Redirect> {
    let job = owned_job(&state, id, &user).await?;
    if !job.status.can_transition_to(JobStatus::Archived) {
        return Err(StandardError::new("ERR-JOB-001")
            .code(StatusCode::CONFLICT)
            .interpolate_err(format!("{} -> {}", job.status, JobStatus::Archived)));
    }
    let mut tx = state.db_pool.begin_txn().await?;
    JobMutator::new(&mut *tx).set_status(job.id, JobStatus::Archived).await?;
    tx.commit().await?;
    tracing::info!("{} archived posting {}", &user.email, &job.slug);
    Ok(Redirect::to("/poster/dashboard"))
}

pub async fn applicants(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>> {
    let job = owned_job(&state, id, &user).await?;
    let mut tx = state.db_pool.begin_txn().await?;
    let applications = ApplicationSelector::new(&mut *tx).get_by_job(job.id).await?;
    let applicants = applications
        .into_iter()
        .map(|a| ApplicantView::new(a, job.questions(), &settings.storage_public_url, &settings.s3_bucket_name))
        .collect();
    let template = Applicants {
        job_id: job.id.to_string(),
        title: job.title.clone(),
        posted: short_date(&job.created_at),
        applicants,
        statuses: ApplicationStatus::ALL,
    };
    Ok(Html(template.render()?))
}

pub async fn set_application_status(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path((id, application_id)): Path<(Uuid, Uuid)>,
    Form(input): Form<StatusInput>,
) -> Result<Redirect> {
    let job = owned_job(&state, id, &user).await?;
    let mut tx = state.db_pool.begin_txn().await?;
    ApplicationMutator::new(&mut *tx)
        .update_status(job.id, application_id, input.status)
        .await?
        .ok_or_else(|| StandardError::new("ERR-APPLICATION-404").code(StatusCode::NOT_FOUND))?;
    tx.commit().await?;
    tracing::info!("application {} marked {}", application_id, input.status.value());
    Ok(Redirect::to(&format!("/poster/jobs/{}/applicants", job.id)))
}
