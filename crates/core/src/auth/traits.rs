use std::sync::Arc;

use async_trait::async_trait;

use super::{
    AuthError, RefreshedSession, RequestCookies, Session, SessionChange, SignUpOutcome,
    Subscription, User, UserMetadata,
};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Callback invoked for every session change.
pub type SessionListener = Arc<dyn Fn(&SessionChange) + Send + Sync>;

/// Stateless primitives exposed by the hosted auth service.
///
/// Implementations translate these calls to the provider's wire protocol and
/// map its failures onto [`AuthError`]. They hold no session of their own.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an email/password pair for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Register a new account.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
        email_redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Send a password recovery email.
    async fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>)
        -> Result<()>;

    /// Resolve the user behind an access token, validating it with the provider.
    async fn get_user(&self, access_token: &str) -> Result<User>;

    /// Trade a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session>;
}

/// The auth capability handed to UI code.
///
/// Owns the "current session" slot and announces every change to its
/// listeners. Dropping the returned [`Subscription`] unsubscribes.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn get_current_session(&self) -> Result<Option<Session>>;

    fn on_session_change(&self, listener: SessionListener) -> Subscription;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<SignUpOutcome>;

    async fn sign_out(&self) -> Result<()>;

    async fn reset_password(&self, email: &str) -> Result<()>;
}

/// Request-time session validation used by the access gate.
///
/// Given the request's cookies, returns the user (if any) and the cookie
/// writes needed to persist a refreshed session.
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    async fn refresh(&self, cookies: &RequestCookies) -> Result<RefreshedSession>;
}

/// Moves the UI to another page.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}
