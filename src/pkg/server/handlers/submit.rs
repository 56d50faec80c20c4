use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, Redirect},
};
use rand::Rng;
use serde::Deserialize;
use validator::Validate;

use crate::{
    conf::settings,
    pkg::{
        internal::{
            adaptors::jobs::{
                mutators::JobMutator,
                spec::{JobType, LocationType, slugify},
            },
            email::{
                SendEmail, send_all,
                submission::{PendingReview, SubmissionReceived},
            },
            lookup::normalize_phone,
        },
        server::{
            handlers::forms::{SubmitInput, validation_error},
            state::{AppState, GetTxn},
            uispec::{SubmitForm, SubmitPhone, SubmitSuccess},
        },
    },
    prelude::Result,
};

const SLUG_SUFFIX_LEN: usize = 6;
const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Deserialize)]
pub struct LookupInput {
    pub phone: String,
}

pub fn slug_suffix() -> String {
    let mut rng = rand::rng();
    (0..SLUG_SUFFIX_LEN)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

pub async fn phone_page() -> Result<Html<String>> {
    Ok(Html(SubmitPhone {}.render()?))
}

/// Looks the phone number up and renders the posting form, prefilled when
/// the caller is already known.
pub async fn lookup(State(state): State<AppState>, Form(input): Form<LookupInput>) -> Result<Html<String>> {
    let phone = normalize_phone(&input.phone);
    let record = state.lookup.lookup(&phone).await;
    tracing::debug!("lookup for submitter matched: {}", record.found);
    let template = SubmitForm {
        found: record.found,
        submitter: record.prefill(&phone),
        job_types: JobType::ALL,
        location_types: LocationType::ALL,
    };
    Ok(Html(template.render()?))
}

pub async fn submit(State(state): State<AppState>, Form(input): Form<SubmitInput>) -> Result<Redirect> {
    input.validate().map_err(validation_error)?;
    let submitter = input.submitter();
    let details = input.job.into_details(chrono::Utc::now(), None)?;
    let slug = slugify(&details.title, &slug_suffix());

    let mut tx = state.db_pool.begin_txn().await?;
    let job = JobMutator::new(&mut *tx).create(&slug, &details, &submitter).await?;
    tx.commit().await?;
    tracing::info!("posting {} submitted by {}", &job.slug, &job.submitter_email);

    let receipt = SubmissionReceived {
        name: &job.submitter_name,
        title: &job.title,
        organization: &job.organization,
        base_url: &settings.base_url,
    };
    if let Err(e) = receipt.send(&job.submitter_email) {
        tracing::warn!("could not confirm submission of {}: {:?}", &job.slug, e);
    }
    send_all(
        &PendingReview {
            title: &job.title,
            organization: &job.organization,
            submitter_name: &job.submitter_name,
            submitter_email: &job.submitter_email,
            base_url: &settings.base_url,
        },
        &settings.reviewers(),
    );
    Ok(Redirect::to("/submit/success"))
}

pub async fn success() -> Result<Html<String>> {
    Ok(Html(SubmitSuccess {}.render()?))
}
