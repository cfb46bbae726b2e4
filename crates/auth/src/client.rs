//! Stateful auth client: one session slot plus change notifications.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use launchpad_core::auth::{
    is_session_expired, AuthChangeEvent, AuthService, IdentityProvider, ListenerRegistry, Result,
    Session, SessionChange, SessionListener, SignUpOutcome, Subscription, UserMetadata,
    DASHBOARD_PATH, RESET_PASSWORD_PATH,
};

use crate::refresher::DEFAULT_REFRESH_MARGIN_SECS;

/// [`AuthService`] over an [`IdentityProvider`].
///
/// Holds the current session and announces every replacement to the
/// listeners registered through [`AuthService::on_session_change`].
#[derive(Clone)]
pub struct AuthClient {
    provider: Arc<dyn IdentityProvider>,
    session: Arc<RwLock<Option<Session>>>,
    listeners: ListenerRegistry,
    app_url: Option<url::Url>,
}

impl AuthClient {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            session: Arc::new(RwLock::new(None)),
            listeners: ListenerRegistry::new(),
            app_url: None,
        }
    }

    /// Seeds the session slot, typically from the request's session cookie.
    pub fn with_session(self, session: Option<Session>) -> Self {
        *self.write_slot() = session;
        self
    }

    /// Public app URL used to build email confirmation and recovery links.
    pub fn with_app_url(mut self, app_url: url::Url) -> Self {
        self.app_url = Some(app_url);
        self
    }

    /// Current session without contacting the provider.
    pub fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn replace_session(&self, event: AuthChangeEvent, session: Option<Session>) {
        *self.write_slot() = session.clone();
        tracing::debug!(%event, "Auth state changed");
        self.listeners.emit(&SessionChange::new(event, session));
    }

    fn app_link(&self, path: &str) -> Option<String> {
        self.app_url
            .as_ref()
            .and_then(|base| base.join(path).ok())
            .map(String::from)
    }
}

#[async_trait]
impl AuthService for AuthClient {
    async fn get_current_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };

        let margin = Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS);
        if !is_session_expired(&session, Utc::now(), margin) {
            return Ok(Some(session));
        }

        match self.provider.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                self.replace_session(AuthChangeEvent::TokenRefreshed, Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(e) if e.is_unauthorized() => {
                self.replace_session(AuthChangeEvent::SignedOut, None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn on_session_change(&self, listener: SessionListener) -> Subscription {
        self.listeners.subscribe(listener)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        self.replace_session(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<SignUpOutcome> {
        let redirect = self.app_link(DASHBOARD_PATH);
        let outcome = self
            .provider
            .sign_up(email, password, metadata, redirect.as_deref())
            .await?;

        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.replace_session(AuthChangeEvent::SignedIn, Some(session.clone()));
        }

        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.current_session() {
            match self.provider.sign_out(&session.access_token).await {
                Ok(()) => {}
                // Already revoked on the provider side; local state still goes.
                Err(e) if e.is_unauthorized() => {
                    tracing::debug!(error = %e, "Sign-out of an already invalid session");
                }
                Err(e) => return Err(e),
            }
        }

        self.replace_session(AuthChangeEvent::SignedOut, None);
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        let redirect = self.app_link(RESET_PASSWORD_PATH);
        self.provider
            .reset_password_for_email(email, redirect.as_deref())
            .await
    }
}
