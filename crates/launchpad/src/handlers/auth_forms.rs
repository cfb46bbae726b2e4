//! Login, signup, password reset and logout.
//!
//! Each POST runs the operation through a request-scoped [`AuthContext`]
//! whose navigator and notifier are recorded, then turns the recorded
//! effects into a redirect with a flash message and session cookie writes.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use launchpad_auth::{
    append_set_cookies, request_cookies, AuthClient, AuthContext, EffectRecorder,
};
use launchpad_core::auth::{
    validate_login, validate_reset, validate_signup, FieldErrors, RequestCookies, Session,
    UserMetadata, DASHBOARD_PATH, LOGIN_PATH, RESET_PASSWORD_PATH, SIGNUP_PATH,
};
use launchpad_core::notify::{Notification, NotificationKind};
use serde::Deserialize;

use super::error::AppError;
use super::flash::redirect_with_flash;
use super::pages::render_page;
use super::shell::Shell;
use crate::state::AppState;

/// One auth operation's worth of state for a single request.
struct AuthScope {
    cookies: RequestCookies,
    before: Option<Session>,
    client: AuthClient,
    effects: Arc<EffectRecorder>,
    context: AuthContext,
}

impl AuthScope {
    fn new(state: &AppState, jar: &CookieJar) -> Self {
        let cookies = request_cookies(jar);
        let client = state.auth.client_for(&cookies);
        let before = client.current_session();
        let effects = Arc::new(EffectRecorder::new());
        let context = AuthContext::new(
            Arc::new(client.clone()),
            effects.clone(),
            effects.clone(),
        );

        Self {
            cookies,
            before,
            client,
            effects,
            context,
        }
    }

    /// Message of the last error notification raised during the operation.
    fn error_message(&self) -> Option<String> {
        self.effects
            .last_notification()
            .filter(|n| n.kind == NotificationKind::Error)
            .map(|n| n.message)
    }

    /// Redirect to where the operation navigated (or `fallback`), carrying
    /// the last notification and the session cookie changes.
    fn finish(self, state: &AppState, fallback: &str) -> Result<Response, AppError> {
        self.context.teardown();

        let after = self.client.current_session();
        let writes =
            state
                .auth
                .session_cookies(self.before.as_ref(), after.as_ref(), &self.cookies)?;

        let location = self
            .effects
            .last_navigation()
            .unwrap_or_else(|| fallback.to_string());

        let mut response = match self.effects.last_notification() {
            Some(notification) => redirect_with_flash(&location, &notification),
            None => Redirect::to(&location).into_response(),
        };
        append_set_cookies(response.headers_mut(), &writes);

        Ok(response)
    }
}

// ==================== login ====================

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub shell: Shell,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// GET /login
pub async fn login_page(jar: CookieJar) -> Response {
    let shell = Shell::new(LOGIN_PATH, &jar, None);
    let shows_flash = shell.flash.is_some();
    let template = LoginTemplate {
        shell,
        email: String::new(),
        errors: FieldErrors::new(),
    };
    render_page(StatusCode::OK, template, shows_flash)
}

/// POST /login
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_string();
    let rerender = |status: StatusCode, errors: FieldErrors, notice: Option<String>| {
        let mut shell = Shell::new(LOGIN_PATH, &jar, None);
        if let Some(message) = notice {
            shell = shell.with_notification(Notification::error(message));
        }
        let shows_flash = shell.flash.is_some();
        render_page(
            status,
            LoginTemplate {
                shell,
                email: email.clone(),
                errors,
            },
            shows_flash,
        )
    };

    if let Err(errors) = validate_login(&email, &form.password) {
        return Ok(rerender(StatusCode::UNPROCESSABLE_ENTITY, errors, None));
    }

    let scope = AuthScope::new(&state, &jar);
    let result = scope.context.sign_in(&email, &form.password).await;
    match result {
        Ok(()) => scope.finish(&state, LOGIN_PATH),
        Err(e) => {
            tracing::info!(error = %e, "Sign-in rejected");
            Ok(rerender(
                StatusCode::BAD_REQUEST,
                FieldErrors::new(),
                scope.error_message(),
            ))
        }
    }
}

// ==================== signup ====================

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub shell: Shell,
    pub email: String,
    pub full_name: String,
    pub errors: FieldErrors,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// GET /signup
pub async fn signup_page(jar: CookieJar) -> Response {
    let shell = Shell::new(SIGNUP_PATH, &jar, None);
    let shows_flash = shell.flash.is_some();
    let template = SignupTemplate {
        shell,
        email: String::new(),
        full_name: String::new(),
        errors: FieldErrors::new(),
    };
    render_page(StatusCode::OK, template, shows_flash)
}

/// POST /signup
pub async fn signup_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_string();
    let full_name = form
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from);

    let rerender = |status: StatusCode, errors: FieldErrors, notice: Option<String>| {
        let mut shell = Shell::new(SIGNUP_PATH, &jar, None);
        if let Some(message) = notice {
            shell = shell.with_notification(Notification::error(message));
        }
        let shows_flash = shell.flash.is_some();
        render_page(
            status,
            SignupTemplate {
                shell,
                email: email.clone(),
                full_name: full_name.clone().unwrap_or_default(),
                errors,
            },
            shows_flash,
        )
    };

    if let Err(errors) = validate_signup(
        &email,
        &form.password,
        &form.confirm_password,
        full_name.as_deref(),
    ) {
        return Ok(rerender(StatusCode::UNPROCESSABLE_ENTITY, errors, None));
    }

    let metadata = match &full_name {
        Some(name) => UserMetadata::default().with_full_name(name.clone()),
        None => UserMetadata::default(),
    };

    let scope = AuthScope::new(&state, &jar);
    let result = scope.context.sign_up(&email, &form.password, &metadata).await;
    match result {
        Ok(_) => scope.finish(&state, SIGNUP_PATH),
        Err(e) => {
            tracing::info!(error = %e, "Sign-up rejected");
            Ok(rerender(
                StatusCode::BAD_REQUEST,
                FieldErrors::new(),
                scope.error_message(),
            ))
        }
    }
}

// ==================== reset password ====================

#[derive(Template)]
#[template(path = "reset_password.html")]
pub struct ResetPasswordTemplate {
    pub shell: Shell,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
}

/// GET /reset-password
pub async fn reset_password_page(jar: CookieJar) -> Response {
    let shell = Shell::new(RESET_PASSWORD_PATH, &jar, None);
    let shows_flash = shell.flash.is_some();
    let template = ResetPasswordTemplate {
        shell,
        email: String::new(),
        errors: FieldErrors::new(),
    };
    render_page(StatusCode::OK, template, shows_flash)
}

/// POST /reset-password
pub async fn reset_password_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_string();
    let rerender = |status: StatusCode, errors: FieldErrors, notice: Option<String>| {
        let mut shell = Shell::new(RESET_PASSWORD_PATH, &jar, None);
        if let Some(message) = notice {
            shell = shell.with_notification(Notification::error(message));
        }
        let shows_flash = shell.flash.is_some();
        render_page(
            status,
            ResetPasswordTemplate {
                shell,
                email: email.clone(),
                errors,
            },
            shows_flash,
        )
    };

    if let Err(errors) = validate_reset(&email) {
        return Ok(rerender(StatusCode::UNPROCESSABLE_ENTITY, errors, None));
    }

    let scope = AuthScope::new(&state, &jar);
    let result = scope.context.reset_password(&email).await;
    match result {
        Ok(()) => scope.finish(&state, RESET_PASSWORD_PATH),
        Err(e) => {
            tracing::info!(error = %e, "Password reset request failed");
            Ok(rerender(
                StatusCode::BAD_REQUEST,
                FieldErrors::new(),
                scope.error_message(),
            ))
        }
    }
}

// ==================== logout ====================

/// POST /logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let scope = AuthScope::new(&state, &jar);
    let result = scope.context.sign_out().await;
    match result {
        Ok(()) => scope.finish(&state, LOGIN_PATH),
        Err(e) => {
            tracing::warn!(error = %e, "Sign-out failed");
            let notification = scope
                .effects
                .last_notification()
                .unwrap_or_else(|| Notification::error(e.to_string()));
            Ok(redirect_with_flash(DASHBOARD_PATH, &notification))
        }
    }
}
