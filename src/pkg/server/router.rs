use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use super::handlers::{auth, jobs, poster, probes, questions, review, submit, unsubscribe};
use super::middlewares::authn;
use super::state::AppState;
use crate::{pkg::internal::minio::MAX_UPLOAD_BYTES, prelude::Result};

/// resume and cover letter plus the text fields
const APPLY_BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES + 1024 * 1024;

pub async fn build_routes() -> Result<Router> {
    let state = AppState::new().await?;

    let signed_in = Router::new()
        .route("/logout", post(auth::logout))
        .route("/poster/dashboard", get(poster::dashboard))
        .route("/poster/jobs/:id", get(poster::edit_form).post(poster::edit))
        .route("/poster/jobs/:id/archive", post(poster::archive))
        .route("/poster/jobs/:id/applicants", get(poster::applicants))
        .route(
            "/poster/jobs/:id/applicants/:application_id/status",
            post(poster::set_application_status),
        )
        .route("/review", get(review::queue))
        .route("/review/jobs/:id/status", post(review::decide))
        .layer(from_fn_with_state(state.clone(), authn::authenticate));

    let browsing = Router::new()
        .route("/", get(jobs::home))
        .route("/jobs/:slug", get(jobs::detail))
        .route(
            "/jobs/:slug/apply",
            post(jobs::apply).layer(DefaultBodyLimit::max(APPLY_BODY_LIMIT)),
        )
        .layer(from_fn_with_state(state.clone(), authn::identify));

    let app = Router::new()
        .merge(signed_in)
        .merge(browsing)
        .route("/submit", get(submit::phone_page).post(submit::submit))
        .route("/submit/lookup", post(submit::lookup))
        .route("/submit/success", get(submit::success))
        .route("/questions/builder", post(questions::builder))
        .route("/poster", get(auth::poster_page))
        .route("/poster/signin", get(auth::poster_page).post(auth::poster_signin))
        .route("/signin", get(auth::member_page).post(auth::member_signin))
        .route("/otp", get(auth::otp))
        .route("/verify", post(auth::verify))
        .route("/auth/callback", get(auth::callback))
        .route("/unsubscribe", get(unsubscribe::unsubscribe))
        .route("/healthz", get(probes::healthz))
        .route("/livez", get(probes::livez))
        .with_state(state);

    Ok(app)
}
