//! Theme switcher.

use axum::{
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use launchpad_core::auth::validate_return_to;
use launchpad_core::theme::{Theme, THEME_COOKIE};
use serde::Deserialize;

/// One year.
const THEME_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

#[derive(Deserialize)]
pub struct ThemeForm {
    pub theme: String,
    #[serde(default)]
    pub return_to: Option<String>,
}

fn theme_cookie(theme: Theme) -> String {
    format!(
        "{THEME_COOKIE}={}; Path=/; SameSite=Lax; Max-Age={THEME_MAX_AGE_SECS}",
        theme.as_str()
    )
}

/// POST /theme - stores the preference and sends the user back where they were.
pub async fn set_theme(Form(form): Form<ThemeForm>) -> Response {
    let theme = Theme::from_cookie(Some(&form.theme));
    let location = form
        .return_to
        .as_deref()
        .and_then(validate_return_to)
        .unwrap_or("/");

    ([(SET_COOKIE, theme_cookie(theme))], Redirect::to(location)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, header::LOCATION, Request, StatusCode},
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    async fn submit(body: &'static str) -> Response {
        Router::new()
            .route("/theme", post(set_theme))
            .oneshot(
                Request::post("/theme")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn stores_theme_and_returns_to_page() {
        let response = submit("theme=dark&return_to=%2Fdashboard").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/dashboard");
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("theme=dark;"));
    }

    #[tokio::test]
    async fn rejects_offsite_return_to() {
        let response = submit("theme=light&return_to=https%3A%2F%2Fevil.com").await;
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn unknown_theme_resets_to_system() {
        let response = submit("theme=neon").await;
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("theme=system;"));
    }
}
