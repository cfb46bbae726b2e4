//! Cookie-backed implementation of [`SessionRefresher`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use launchpad_core::auth::{
    is_session_expired, IdentityProvider, RefreshedSession, RequestCookies, Result,
    SessionRefresher,
};

use crate::cookies::SessionCookieCodec;

/// Sessions this close to expiry are refreshed before use.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;

/// Validates the session stored in request cookies against the provider.
///
/// An expiring session is traded for a fresh one and the new cookies are
/// returned for the response. A session the provider rejects yields no user
/// and cookie removals. Transport failures are returned as errors.
pub struct CookieSessionRefresher {
    provider: Arc<dyn IdentityProvider>,
    codec: SessionCookieCodec,
    margin: Duration,
}

impl CookieSessionRefresher {
    pub fn new(provider: Arc<dyn IdentityProvider>, codec: SessionCookieCodec) -> Self {
        Self {
            provider,
            codec,
            margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
        }
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    fn cleared(&self, cookies: &RequestCookies) -> RefreshedSession {
        RefreshedSession {
            user: None,
            cookies: self.codec.clear(cookies),
        }
    }
}

#[async_trait]
impl SessionRefresher for CookieSessionRefresher {
    async fn refresh(&self, cookies: &RequestCookies) -> Result<RefreshedSession> {
        let session = match self.codec.decode(cookies) {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(RefreshedSession::anonymous()),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session cookie");
                return Ok(self.cleared(cookies));
            }
        };

        let (session, mutations) = if is_session_expired(&session, Utc::now(), self.margin) {
            match self.provider.refresh_session(&session.refresh_token).await {
                Ok(fresh) => {
                    tracing::debug!(user_id = %fresh.user.id, "Session refreshed");
                    let mutations = self.codec.encode(&fresh, cookies)?;
                    (fresh, mutations)
                }
                Err(e) if e.is_unauthorized() => {
                    tracing::debug!(error = %e, "Refresh token rejected");
                    return Ok(self.cleared(cookies));
                }
                Err(e) => return Err(e),
            }
        } else {
            (session, Vec::new())
        };

        match self.provider.get_user(&session.access_token).await {
            Ok(user) => Ok(RefreshedSession {
                user: Some(user),
                cookies: mutations,
            }),
            Err(e) if e.is_unauthorized() => {
                tracing::debug!(error = %e, "Access token rejected");
                Ok(self.cleared(cookies))
            }
            // The refresh token was already rotated, so the new cookies
            // must still reach the browser.
            Err(e) if !mutations.is_empty() => {
                tracing::warn!(error = %e, "User lookup failed after refresh");
                Ok(RefreshedSession {
                    user: None,
                    cookies: mutations,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::apply_mutations;
    use crate::providers::MockProvider;
    use launchpad_core::auth::{AuthError, UserMetadata};

    async fn signed_in() -> (MockProvider, CookieSessionRefresher, RequestCookies) {
        let provider = MockProvider::new();
        provider
            .add_user("ada@example.com", "secret1", UserMetadata::default())
            .await;
        let session = provider
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap();

        let codec = SessionCookieCodec::new("proj", true);
        let cookies = apply_mutations(
            &RequestCookies::new(),
            &codec.encode(&session, &RequestCookies::new()).unwrap(),
        );
        let refresher = CookieSessionRefresher::new(Arc::new(provider.clone()), codec);

        (provider, refresher, cookies)
    }

    #[tokio::test]
    async fn no_cookie_is_anonymous() {
        let (_, refresher, _) = signed_in().await;

        let refreshed = refresher.refresh(&RequestCookies::new()).await.unwrap();

        assert_eq!(refreshed, RefreshedSession::anonymous());
    }

    #[tokio::test]
    async fn valid_session_resolves_user_without_writes() {
        let (_, refresher, cookies) = signed_in().await;

        let refreshed = refresher.refresh(&cookies).await.unwrap();

        assert_eq!(
            refreshed.user.unwrap().email.as_deref(),
            Some("ada@example.com")
        );
        assert!(refreshed.cookies.is_empty());
    }

    #[tokio::test]
    async fn expiring_session_is_refreshed_and_rewritten() {
        let (provider, refresher, cookies) = signed_in().await;
        provider.expire_access_tokens().await;
        let refresher = refresher.with_margin(Duration::hours(2));

        let refreshed = refresher.refresh(&cookies).await.unwrap();

        assert!(refreshed.user.is_some());
        assert_eq!(refreshed.cookies.len(), 1);
        assert_eq!(refreshed.cookies[0].name, "sb-proj-auth-token");
        assert!(!refreshed.cookies[0].is_removal());
        assert_ne!(cookies["sb-proj-auth-token"], refreshed.cookies[0].value);
    }

    #[tokio::test]
    async fn revoked_session_clears_cookies() {
        let (provider, refresher, cookies) = signed_in().await;
        let codec = SessionCookieCodec::new("proj", true);
        let session = codec.decode(&cookies).unwrap().unwrap();
        provider.sign_out(&session.access_token).await.unwrap();

        let refreshed = refresher.refresh(&cookies).await.unwrap();

        assert!(refreshed.user.is_none());
        assert_eq!(refreshed.cookies.len(), 1);
        assert!(refreshed.cookies[0].is_removal());
    }

    #[tokio::test]
    async fn garbage_cookie_is_cleared() {
        let (_, refresher, _) = signed_in().await;
        let mut cookies = RequestCookies::new();
        cookies.insert("sb-proj-auth-token".to_string(), "base64-%%%".to_string());

        let refreshed = refresher.refresh(&cookies).await.unwrap();

        assert!(refreshed.user.is_none());
        assert!(refreshed.cookies[0].is_removal());
    }

    #[tokio::test]
    async fn provider_outage_is_an_error() {
        let (provider, refresher, cookies) = signed_in().await;
        provider
            .fail_with(Some(AuthError::Transport("connection reset".into())))
            .await;

        let err = refresher.refresh(&cookies).await.unwrap_err();

        assert!(matches!(err, AuthError::Transport(_)));
    }
}
