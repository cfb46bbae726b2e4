use thiserror::Error;

/// Failures surfaced by the identity provider or by local input checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("email not confirmed")]
    EmailNotConfirmed,

    #[error("a user with this email address has already been registered")]
    UserAlreadyExists,

    #[error("session is invalid or has expired")]
    Unauthorized,

    #[error("password is too weak: {0}")]
    WeakPassword(String),

    #[error("too many requests, try again later")]
    RateLimited,

    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// True when the provider rejected the credential itself, as opposed to
    /// failing to answer.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::Unauthorized | AuthError::InvalidCredentials
        )
    }
}
