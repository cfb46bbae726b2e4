//! Per-request session gate.
//!
//! Runs before every page handler: refreshes the session from cookies,
//! applies the route-access policy and propagates refreshed cookies onto
//! whatever response goes out.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use launchpad_core::auth::{decide, is_static_asset, RefreshedSession, SessionRefresher};

use crate::cookies::{append_set_cookies, apply_mutations, request_cookies, rewrite_cookie_header};

/// State for [`session_gate`].
#[derive(Clone)]
pub struct SessionGate {
    refresher: Arc<dyn SessionRefresher>,
}

impl SessionGate {
    pub fn new(refresher: Arc<dyn SessionRefresher>) -> Self {
        Self { refresher }
    }
}

/// Middleware enforcing the route-access policy.
///
/// A refresher error is logged and the request is treated as anonymous.
/// On pass-through the authenticated user is stored in request extensions
/// and the `Cookie` header is rewritten to reflect refreshed values.
/// Refreshed cookies the handler writes itself are left to the handler.
pub async fn session_gate(
    State(gate): State<SessionGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if is_static_asset(&path) {
        return next.run(request).await;
    }

    let cookies = request_cookies(&CookieJar::from_headers(request.headers()));

    let refreshed = match gate.refresher.refresh(&cookies).await {
        Ok(refreshed) => refreshed,
        Err(e) => {
            tracing::warn!(error = %e, path = %path, "Session refresh failed, continuing as anonymous");
            RefreshedSession::anonymous()
        }
    };

    let decision = decide(&path, refreshed.user.is_some());

    let (mut response, writes) = match decision.location() {
        Some(location) => {
            tracing::debug!(path = %path, location = %location, "Session gate redirect");
            (Redirect::to(&location).into_response(), refreshed.cookies)
        }
        None => {
            if !refreshed.cookies.is_empty() {
                let merged = apply_mutations(&cookies, &refreshed.cookies);
                rewrite_cookie_header(request.headers_mut(), &merged);
            }
            if let Some(user) = refreshed.user {
                request.extensions_mut().insert(user);
            }
            let response = next.run(request).await;

            // The handler saw the refreshed cookies; its own writes are newer.
            let handled = set_cookie_names(response.headers());
            let writes = refreshed
                .cookies
                .into_iter()
                .filter(|mutation| !handled.contains(&mutation.name))
                .collect::<Vec<_>>();
            (response, writes)
        }
    };

    append_set_cookies(response.headers_mut(), &writes);
    response
}

/// Names of the cookies a response already sets.
fn set_cookie_names(headers: &HeaderMap) -> HashSet<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value).ok())
        .map(|cookie| cookie.name().to_string())
        .collect()
}
