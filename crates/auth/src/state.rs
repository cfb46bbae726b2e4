//! Application state for auth.

use std::sync::Arc;

use axum::extract::FromRef;
use launchpad_core::auth::{
    CookieMutation, IdentityProvider, RequestCookies, Session, SessionRefresher,
};

use crate::client::AuthClient;
use crate::config::AuthConfig;
use crate::cookies::SessionCookieCodec;
use crate::error::AuthError;
use crate::gate::SessionGate;
use crate::providers::GoTrueProvider;
use crate::refresher::CookieSessionRefresher;

/// Shared state for the gate and the auth form handlers.
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
    pub provider: Arc<dyn IdentityProvider>,
    pub codec: SessionCookieCodec,
    refresher: Arc<dyn SessionRefresher>,
}

impl AuthState {
    /// Creates the state with an explicit provider.
    pub fn new(config: AuthConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let codec = SessionCookieCodec::new(&config.project_ref(), config.cookie_secure);
        let refresher = Arc::new(CookieSessionRefresher::new(provider.clone(), codec.clone()));

        Self {
            config: Arc::new(config),
            provider,
            codec,
            refresher,
        }
    }

    /// Creates the state backed by the hosted auth service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: AuthConfig) -> Result<Self, AuthError> {
        let provider = Arc::new(GoTrueProvider::new(&config)?);
        Ok(Self::new(config, provider))
    }

    /// State for the session gate middleware.
    pub fn gate(&self) -> SessionGate {
        SessionGate::new(self.refresher.clone())
    }

    /// Request-scoped client seeded with the session found in `cookies`.
    pub fn client_for(&self, cookies: &RequestCookies) -> AuthClient {
        let session = self.codec.decode(cookies).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Ignoring unreadable session cookie");
            None
        });

        AuthClient::new(self.provider.clone())
            .with_app_url(self.config.app_url.clone())
            .with_session(session)
    }

    /// Cookie writes that take the browser from `before` to `after`.
    ///
    /// # Errors
    ///
    /// Returns an error if the new session cannot be serialised.
    pub fn session_cookies(
        &self,
        before: Option<&Session>,
        after: Option<&Session>,
        cookies: &RequestCookies,
    ) -> Result<Vec<CookieMutation>, AuthError> {
        match after {
            Some(session) if before != Some(session) => Ok(self.codec.encode(session, cookies)?),
            Some(_) => Ok(Vec::new()),
            None => Ok(self.codec.clear(cookies)),
        }
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::apply_mutations;
    use crate::providers::MockProvider;
    use launchpad_core::auth::{AuthService, UserMetadata};

    fn config() -> AuthConfig {
        AuthConfig::from_lookup(|key| match key {
            "LAUNCHPAD_AUTH_URL" => Some("https://proj.supabase.co".to_string()),
            "LAUNCHPAD_AUTH_ANON_KEY" => Some("anon".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn client_for_round_trips_through_cookies() {
        let provider = MockProvider::new();
        provider
            .add_user("ada@example.com", "secret1", UserMetadata::default())
            .await;
        let state = AuthState::new(config(), Arc::new(provider));
        assert_eq!(state.codec.name(), "sb-proj-auth-token");

        let client = state.client_for(&RequestCookies::new());
        let session = client.sign_in("ada@example.com", "secret1").await.unwrap();
        let writes = state
            .session_cookies(None, Some(&session), &RequestCookies::new())
            .unwrap();

        let cookies = apply_mutations(&RequestCookies::new(), &writes);
        let seeded = state.client_for(&cookies);
        assert_eq!(seeded.current_session(), Some(session.clone()));

        let unchanged = state
            .session_cookies(Some(&session), Some(&session), &cookies)
            .unwrap();
        assert!(unchanged.is_empty());

        let cleared = state.session_cookies(Some(&session), None, &cookies).unwrap();
        assert!(cleared.iter().all(CookieMutation::is_removal));
        assert_eq!(cleared.len(), 1);
    }

    #[test]
    fn from_config_builds_remote_provider() {
        assert!(AuthState::from_config(config()).is_ok());
    }
}
