use std::sync::Arc;

use askama::Template;
use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use serde::Deserialize;
use standard_error::{Interpolate, StandardError, Status};
use uuid::Uuid;

use crate::{
    conf::settings,
    pkg::{
        internal::{
            adaptors::{
                jobs::{
                    mutators::JobMutator,
                    selectors::JobSelector,
                    spec::{JobEntry, JobStatus},
                },
                members::{selectors::MemberSelector, spec::MemberEntry},
            },
            auth::User,
            email::{SendEmail, job_alert::JobAlert},
        },
        server::{
            state::{AppState, GetTxn},
            uispec::ReviewQueue,
        },
    },
    prelude::Result,
};

#[derive(Deserialize)]
pub struct DecisionInput {
    pub status: JobStatus,
}

fn require_reviewer(user: &User) -> Result<()> {
    if user.is_reviewer() {
        return Ok(());
    }
    tracing::warn!("{} is not a reviewer", &user.email);
    Err(StandardError::new("ERR-AUTH-005").code(StatusCode::FORBIDDEN))
}

/// reviewers only decide between approving and rejecting a pending posting
pub fn check_decision(current: JobStatus, next: JobStatus) -> Result<()> {
    let decision = matches!(next, JobStatus::Approved | JobStatus::Rejected);
    if decision && current.can_transition_to(next) {
        return Ok(());
    }
    Err(StandardError::new("ERR-JOB-001")
        .code(StatusCode::CONFLICT)
        .interpolate_err(format!("{} -> {}", current, next)))
}

pub async fn queue(State(state): State<AppState>, Extension(user): Extension<Arc<User>>) -> Result<Html<String>> {
    require_reviewer(&user)?;
    let mut tx = state.db_pool.begin_txn().await?;
    let jobs = JobSelector::new(&mut *tx).get_by_status(JobStatus::Pending).await?;
    Ok(Html(ReviewQueue { jobs }.render()?))
}

fn announce(job: &JobEntry, subscribers: &[MemberEntry]) {
    let mut sent = 0;
    for member in subscribers {
        let alert = JobAlert {
            first_name: &member.first_name,
            member_id: &member.id.to_string(),
            title: &job.title,
            organization: &job.organization,
            slug: &job.slug,
            base_url: &settings.base_url,
        };
        match alert.send(&member.email) {
            Ok(()) => sent += 1,
            Err(e) => tracing::warn!("job alert to {} not sent: {:?}", &member.email, e),
        }
    }
    tracing::info!("announced {} to {} subscribers", &job.slug, sent);
}

pub async fn decide(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
    Form(input): Form<DecisionInput>,
) -> Result<Redirect> {
    require_reviewer(&user)?;
    let mut tx = state.db_pool.begin_txn().await?;
    let job = JobSelector::new(&mut *tx)
        .get_by_id(id)
        .await?
        .ok_or_else(|| StandardError::new("ERR-JOB-404").code(StatusCode::NOT_FOUND))?;
    check_decision(job.status, input.status)?;
    let job = JobMutator::new(&mut *tx)
        .set_status(job.id, input.status)
        .await?
        .ok_or_else(|| StandardError::new("ERR-JOB-404").code(StatusCode::NOT_FOUND))?;
    let subscribers = match job.status {
        JobStatus::Approved => MemberSelector::new(&mut *tx).get_alert_subscribers().await?,
        _ => vec![],
    };
    tx.commit().await?;
    tracing::info!("{} marked {} as {}", &user.email, &job.slug, job.status);
    announce(&job, &subscribers);
    Ok(Redirect::to("/review"))
}
