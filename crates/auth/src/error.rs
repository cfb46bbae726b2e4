use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::ConfigError;

/// Auth errors for the launchpad_auth crate.
///
/// This wraps the core `AuthError` and adds the failures that only exist in
/// the I/O shell: configuration loading and HTTP transport setup.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (provider rejections, validation, etc.)
    #[error(transparent)]
    Core(#[from] launchpad_core::auth::AuthError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    Http(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use launchpad_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            AuthError::Core(core_err) => match core_err {
                CoreError::InvalidCredentials
                | CoreError::EmailNotConfirmed
                | CoreError::WeakPassword(_) => (StatusCode::BAD_REQUEST, self.to_string()),
                CoreError::UserAlreadyExists => (StatusCode::CONFLICT, self.to_string()),
                CoreError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
                CoreError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
                CoreError::Provider { .. }
                | CoreError::Transport(_)
                | CoreError::InvalidResponse(_) => {
                    tracing::error!("Auth provider error: {}", self);
                    (
                        StatusCode::BAD_GATEWAY,
                        "Authentication provider error".to_string(),
                    )
                }
            },
            AuthError::Http(_) => {
                tracing::error!("HTTP error during auth: {}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    "Authentication provider error".to_string(),
                )
            }
            AuthError::Config(_) => {
                tracing::error!("Config error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
