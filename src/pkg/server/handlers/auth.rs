use std::sync::Arc;

use askama::Template;
use axum::{
    Extension, Form,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use standard_error::{HtmlRes, StandardError, Status};

use crate::{
    conf::settings,
    pkg::{
        internal::{
            adaptors::jobs::selectors::JobSelector,
            auth::{AuthToken, User, VerifyOutcome, name_from_email},
            email::authtoken::link,
        },
        server::{
            middlewares::authn::{EMAIL_COOKIE, SESSION_COOKIE},
            state::{AppState, GetTxn},
            uispec::{SignIn, Verify},
        },
    },
    prelude::Result,
};

pub const POSTER_HOME: &str = "/poster/dashboard";
pub const MEMBER_HOME: &str = "/";

#[derive(Deserialize)]
pub struct SignInInput {
    pub email: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyInput {
    pub code: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub email: Option<String>,
    pub code: Option<String>,
    pub next: Option<String>,
}

/// local paths only, anything else falls back to `default`
pub fn safe_next<'a>(next: Option<&'a str>, default: &'a str) -> &'a str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(|c| c.is_control() || c.is_whitespace()) =>
        {
            path
        }
        _ => default,
    }
}

fn otp_location(base_url: &str, next: &str) -> String {
    link(base_url, "/otp", &[("next", next)])
}

fn cookie(name: &str, value: &str, max_age: Option<i64>) -> Result<HeaderValue> {
    let mut raw = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value);
    if let Some(age) = max_age {
        raw.push_str(&format!("; Max-Age={}", age));
    }
    Ok(HeaderValue::from_str(&raw)?)
}

fn poster_sign_in(error: Option<String>) -> SignIn {
    SignIn {
        action: "/poster/signin",
        heading: "Job Poster Sign In",
        hint: "Use the email address you submitted your job posting with.",
        next: POSTER_HOME.to_string(),
        error,
    }
}

fn member_sign_in(next: &str, error: Option<String>) -> SignIn {
    SignIn {
        action: "/signin",
        heading: "Member Sign In",
        hint: "We will email you a one-time code.",
        next: next.to_string(),
        error,
    }
}

fn no_postings() -> Result<StandardError> {
    let message =
        "No job postings found for this email address. Please use the email you submitted your job posting with.";
    Ok(StandardError::new("ERR-AUTH-004")
        .code(StatusCode::NOT_FOUND)
        .template(poster_sign_in(Some(message.to_string())).render()?))
}

pub async fn poster_page() -> Result<Html<String>> {
    Ok(Html(poster_sign_in(None).render()?))
}

pub async fn member_page(Query(query): Query<NextQuery>) -> Result<Html<String>> {
    let next = safe_next(query.next.as_deref(), MEMBER_HOME);
    Ok(Html(member_sign_in(next, None).render()?))
}

pub async fn otp(Query(query): Query<NextQuery>) -> Result<Html<String>> {
    let next = safe_next(query.next.as_deref(), POSTER_HOME).to_string();
    Ok(Html(Verify { message: None, next }.render()?))
}

async fn start_sign_in(state: &AppState, email: &str, next: &str) -> Result<Response> {
    let user = AuthToken::issue_user_token(state, email, &name_from_email(email), next).await?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie(EMAIL_COOKIE, &user.email, None)?);
    Ok((headers, Redirect::to(&otp_location(&settings.base_url, next))).into_response())
}

/// only addresses that already submitted a posting may sign in as posters
pub async fn poster_signin(State(state): State<AppState>, Form(input): Form<SignInInput>) -> Result<Response> {
    let email = input.email.trim().to_lowercase();
    let mut tx = state.db_pool.begin_txn().await?;
    if !JobSelector::new(&mut *tx).submitter_exists(&email).await? {
        tracing::info!("poster sign-in refused for {}, no postings", &email);
        return Err(no_postings()?);
    }
    start_sign_in(&state, &email, POSTER_HOME).await
}

pub async fn member_signin(State(state): State<AppState>, Form(input): Form<SignInInput>) -> Result<Response> {
    let email = input.email.trim().to_lowercase();
    let next = safe_next(input.next.as_deref(), MEMBER_HOME);
    if !email.contains('@') {
        let page = member_sign_in(next, Some("Please enter a valid email address.".into()));
        return Ok(Html(page.render()?).into_response());
    }
    start_sign_in(&state, &email, next).await
}

fn signed_in(token: &str, email: &str, next: &str) -> Result<Response> {
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, cookie(SESSION_COOKIE, token, None)?);
    headers.append(SET_COOKIE, cookie(EMAIL_COOKIE, email, None)?);
    Ok((headers, Redirect::to(next)).into_response())
}

pub async fn verify(
    headers: HeaderMap,
    State(state): State<AppState>,
    Form(input): Form<VerifyInput>,
) -> Result<Response> {
    let next = safe_next(input.next.as_deref(), POSTER_HOME).to_string();
    let jar = CookieJar::from_headers(&headers);
    let Some(email) = jar.get(EMAIL_COOKIE).map(|c| c.value().to_string()).filter(|e| !e.is_empty()) else {
        let message = Some("Verification failed, please sign in again.".to_string());
        return Ok(Html(Verify { message, next }.render()?).into_response());
    };
    let message = match AuthToken::verify_code(&state, &email, &input.code, &next).await? {
        VerifyOutcome::Verified(token) => return signed_in(&token.to_string(), &email, &next),
        VerifyOutcome::Invalid => "Invalid code, please try again.",
        VerifyOutcome::Reissued => "No active code found, we sent you a new one.",
    };
    Ok(Html(
        Verify {
            message: Some(message.to_string()),
            next,
        }
        .render()?,
    )
    .into_response())
}

/// magic link from the sign-in email
pub async fn callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Result<Response> {
    let next = safe_next(query.next.as_deref(), POSTER_HOME).to_string();
    let retry = if next.starts_with("/poster") { "/poster" } else { "/signin" };
    let (Some(email), Some(code)) = (query.email, query.code) else {
        return Ok(Redirect::to(retry).into_response());
    };
    match AuthToken::verify_code(&state, &email, &code, &next).await? {
        VerifyOutcome::Verified(token) => signed_in(&token.to_string(), &email.trim().to_lowercase(), &next),
        outcome => {
            tracing::warn!("magic link for {} did not verify: {:?}", &email, outcome);
            Ok(Redirect::to(retry).into_response())
        }
    }
}

pub async fn logout(State(state): State<AppState>, Extension(user): Extension<Arc<User>>) -> Result<Response> {
    AuthToken::revoke(&state, &user).await?;
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, cookie(SESSION_COOKIE, "", Some(0))?);
    headers.append(SET_COOKIE, cookie(EMAIL_COOKIE, "", Some(0))?);
    Ok((headers, Redirect::to("/")).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::header::CONTENT_TYPE;

    use super::*;

    #[test]
    fn test_refused_poster_gets_sign_in_page_as_404() {
        let response = no_postings().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");

        let missing: StandardError = sqlx::Error::RowNotFound.into();
        assert_eq!(missing.err_code, "ER-DB-NOTFOUND");
    }

    #[test]
    fn test_safe_next_keeps_local_paths_only() {
        assert_eq!(safe_next(Some("/poster/jobs/1"), POSTER_HOME), "/poster/jobs/1");
        assert_eq!(safe_next(Some("https://evil.example"), POSTER_HOME), POSTER_HOME);
        assert_eq!(safe_next(Some("//evil.example"), POSTER_HOME), POSTER_HOME);
        assert_eq!(safe_next(None, MEMBER_HOME), MEMBER_HOME);
        assert_eq!(safe_next(Some("/\t/evil.example"), POSTER_HOME), POSTER_HOME);
        assert_eq!(safe_next(Some("/\r\n/evil.example"), POSTER_HOME), POSTER_HOME);
        assert_eq!(safe_next(Some("/ /evil.example"), MEMBER_HOME), MEMBER_HOME);
        assert_eq!(safe_next(Some("/\\evil.example"), MEMBER_HOME), MEMBER_HOME);
    }

    #[test]
    fn test_otp_location_encodes_next() {
        let location = otp_location("https://jobs.example.org", "/poster/jobs/1?saved=1&x=2#top");
        assert_eq!(
            location,
            "https://jobs.example.org/otp?next=%2Fposter%2Fjobs%2F1%3Fsaved%3D1%26x%3D2%23top"
        );
    }

    #[test]
    fn test_cookie_attributes() {
        let value = cookie(SESSION_COOKIE, "abc", None).unwrap();
        assert_eq!(value.to_str().unwrap(), "_Host_token=abc; Path=/; HttpOnly; SameSite=Lax");
        let cleared = cookie(EMAIL_COOKIE, "", Some(0)).unwrap();
        assert!(cleared.to_str().unwrap().ends_with("Max-Age=0"));
    }

    #[test]
    fn test_sign_in_pages_render() {
        let html = poster_sign_in(Some("No job postings found".into())).render().unwrap();
        assert!(html.contains("action=\"/poster/signin\""));
        assert!(html.contains("No job postings found"));
        let html = member_sign_in("/review", None).render().unwrap();
        assert!(html.contains("action=\"/signin\""));
        assert!(html.contains("name=\"next\""));
        assert!(html.contains("review"));
    }
}
