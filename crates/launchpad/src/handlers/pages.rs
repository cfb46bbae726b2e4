use askama::Template;
use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use launchpad_auth::{CurrentUser, OptionalUser};
use launchpad_core::notify::Notification;
use serde::Deserialize;

use super::flash::clear_flash;
use super::shell::Shell;
use crate::state::AppState;

/// Template wrapper that converts Askama templates into HTML responses.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to render template");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template: {err}"),
                )
                    .into_response()
            }
        }
    }
}

/// Renders a page and clears the flash cookie if the page displayed it.
pub fn render_page<T: Template>(status: StatusCode, template: T, shows_flash: bool) -> Response {
    let mut response = (status, HtmlTemplate(template)).into_response();
    if shows_flash {
        clear_flash(response.headers_mut());
    }
    response
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub shell: Shell,
}

#[derive(Deserialize, Default)]
pub struct HomeQuery {
    /// Notification demo: `success`, `error` or `info`.
    pub demo: Option<String>,
}

fn demo_notification(kind: &str) -> Option<Notification> {
    match kind {
        "success" => Some(Notification::success(
            "Success! Your action completed as expected.",
        )),
        "error" => Some(Notification::error("Error! Something went wrong.")),
        "info" => Some(Notification::info("Info: here is something worth knowing.")),
        _ => None,
    }
}

/// Handler for the home page (GET /).
pub async fn home(
    OptionalUser(user): OptionalUser,
    jar: CookieJar,
    Query(query): Query<HomeQuery>,
) -> Response {
    let mut shell = Shell::new("/", &jar, user.as_ref());
    if let Some(notification) = query.demo.as_deref().and_then(demo_notification) {
        shell = shell.with_notification(notification);
    }

    let shows_flash = shell.flash.is_some();
    render_page(StatusCode::OK, HomeTemplate { shell }, shows_flash)
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell: Shell,
    pub user_id: String,
    pub email: String,
    pub created_at: String,
    pub last_sign_in_at: Option<String>,
    pub email_confirmed: bool,
    pub metadata_json: String,
    pub debug: bool,
}

/// Handler for the dashboard (GET /dashboard). Requires a signed-in user.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Response {
    let shell = Shell::new("/dashboard", &jar, Some(&user));
    let shows_flash = shell.flash.is_some();

    let template = DashboardTemplate {
        shell,
        user_id: user.id.to_string(),
        email: user.email.clone().unwrap_or_default(),
        created_at: user.created_at.format("%B %-d, %Y").to_string(),
        last_sign_in_at: user
            .last_sign_in_at
            .map(|at| at.format("%B %-d, %Y %H:%M UTC").to_string()),
        email_confirmed: user.is_email_confirmed(),
        metadata_json: serde_json::to_string_pretty(&user.user_metadata)
            .unwrap_or_else(|_| "{}".to_string()),
        debug: state.debug(),
    };

    render_page(StatusCode::OK, template, shows_flash)
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub shell: Shell,
}

/// Fallback for unknown paths.
pub async fn not_found(OptionalUser(user): OptionalUser, jar: CookieJar, uri: Uri) -> Response {
    let shell = Shell::new(uri.path(), &jar, user.as_ref());
    let shows_flash = shell.flash.is_some();
    render_page(StatusCode::NOT_FOUND, NotFoundTemplate { shell }, shows_flash)
}
