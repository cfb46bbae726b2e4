use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use launchpad_auth::session_gate;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{
        auth_forms::{
            login_page, login_submit, logout, reset_password_page, reset_password_submit,
            signup_page, signup_submit,
        },
        health::livez,
        pages::{dashboard, home, not_found},
        theme::set_theme,
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
///
/// Pages sit behind the session gate. Probes, static assets and the theme
/// switcher do not need a session and are mounted outside it.
pub fn create_app(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login_submit))
        .route("/signup", get(signup_page).post(signup_submit))
        .route(
            "/reset-password",
            get(reset_password_page).post(reset_password_submit),
        )
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.auth.gate(),
            session_gate,
        ));

    Router::new()
        .route("/livez", get(livez))
        .route("/theme", post(set_theme))
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .merge(pages)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
