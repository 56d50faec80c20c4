use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    pkg::{
        internal::auth::{AuthToken, User},
        server::state::AppState,
    },
    prelude::Result,
};

pub const SESSION_COOKIE: &str = "_Host_token";
pub const EMAIL_COOKIE: &str = "_Host_email";

/// the signed-in user, if any; inserted on every request by [`identify`]
#[derive(Clone, Default)]
pub struct Viewer(pub Option<Arc<User>>);

async fn session_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let jar = CookieJar::from_headers(headers);
    let cookie = jar.get(SESSION_COOKIE).filter(|c| !c.value().is_empty())?;
    match AuthToken::check_token_validity(state, cookie.value()).await {
        Ok(user) => Some(user),
        Err(_) => {
            tracing::debug!("stale session cookie ignored");
            None
        }
    }
}

/// Requires a live session. Requests without one are sent to sign in,
/// reviewers through the member flow and everyone else as a poster.
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    match session_user(&state, &headers).await {
        Some(user) => {
            request.extensions_mut().insert(Arc::new(user));
            Ok(next.run(request).await)
        }
        None => {
            let path = request.uri().path();
            tracing::warn!("token missing, authentication denied for {}", path);
            let target = if path.starts_with("/review") { "/signin?next=/review" } else { "/poster" };
            Ok(Redirect::to(target).into_response())
        }
    }
}

pub async fn identify(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let viewer = Viewer(session_user(&state, &headers).await.map(Arc::new));
    request.extensions_mut().insert(viewer);
    Ok(next.run(request).await)
}
