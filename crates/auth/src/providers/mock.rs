//! In-memory identity provider for development and testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use launchpad_core::auth::{
    AuthError, IdentityProvider, Result, Session, SignUpOutcome, User, UserMetadata,
};
use rand::{distr::Alphanumeric, Rng};
use tokio::sync::RwLock;
use uuid::Uuid;

const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

struct Account {
    user: User,
    password: String,
}

struct AccessGrant {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct MockState {
    /// Accounts keyed by lowercased email.
    accounts: HashMap<String, Account>,
    access_tokens: HashMap<String, AccessGrant>,
    refresh_tokens: HashMap<String, Uuid>,
    recovery_requests: Vec<String>,
    failure: Option<AuthError>,
}

impl MockState {
    fn user_by_id(&self, id: Uuid) -> Option<&User> {
        self.accounts
            .values()
            .map(|account| &account.user)
            .find(|user| user.id == id)
    }
}

/// Identity provider backed by in-memory maps.
///
/// Mirrors the hosted service closely enough for local development:
/// single-use refresh tokens, optional email confirmation and injectable
/// failures. Data is lost when the provider is dropped.
#[derive(Clone)]
pub struct MockProvider {
    state: Arc<RwLock<MockState>>,
    require_confirmation: bool,
    token_ttl: Duration,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            require_confirmation: false,
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    /// New sign-ups must confirm their email before signing in.
    pub fn with_email_confirmation(mut self, required: bool) -> Self {
        self.require_confirmation = required;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Registers a confirmed account.
    pub async fn add_user(&self, email: &str, password: &str, metadata: UserMetadata) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: metadata.into_map(),
            email_confirmed_at: Some(now),
            created_at: now,
            last_sign_in_at: None,
        };

        self.state.write().await.accounts.insert(
            email.to_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );

        user
    }

    /// Marks an account's email as confirmed.
    pub async fn confirm_email(&self, email: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .get_mut(&email.to_lowercase())
            .ok_or(AuthError::InvalidCredentials)?;
        account.user.email_confirmed_at = Some(Utc::now());
        Ok(())
    }

    /// Makes every call fail with `failure` until cleared with `None`.
    pub async fn fail_with(&self, failure: Option<AuthError>) {
        self.state.write().await.failure = failure;
    }

    /// Emails for which a recovery message was requested.
    pub async fn recovery_requests(&self) -> Vec<String> {
        self.state.read().await.recovery_requests.clone()
    }

    /// Expires all outstanding access tokens, leaving refresh tokens valid.
    pub async fn expire_access_tokens(&self) {
        let past = Utc::now() - Duration::seconds(1);
        for grant in self.state.write().await.access_tokens.values_mut() {
            grant.expires_at = past;
        }
    }

    async fn check_failure(&self) -> Result<()> {
        match &self.state.read().await.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn issue_session(&self, state: &mut MockState, user: User) -> Session {
        let expires_at = Utc::now() + self.token_ttl;
        let access_token = generate_token();
        let refresh_token = generate_token();

        state.access_tokens.insert(
            access_token.clone(),
            AccessGrant {
                user_id: user.id,
                expires_at,
            },
        );
        state.refresh_tokens.insert(refresh_token.clone(), user.id);

        Session {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_at,
            user,
        }
    }
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.check_failure().await?;

        let mut state = self.state.write().await;
        let account = state
            .accounts
            .get_mut(&email.to_lowercase())
            .filter(|account| account.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.user.is_email_confirmed() {
            return Err(AuthError::EmailNotConfirmed);
        }

        account.user.last_sign_in_at = Some(Utc::now());
        let user = account.user.clone();

        Ok(self.issue_session(&mut state, user))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
        _email_redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome> {
        self.check_failure().await?;

        let mut state = self.state.write().await;
        let key = email.to_lowercase();
        if state.accounts.contains_key(&key) {
            return Err(AuthError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: metadata.clone().into_map(),
            email_confirmed_at: (!self.require_confirmation).then_some(now),
            created_at: now,
            last_sign_in_at: None,
        };

        state.accounts.insert(
            key,
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );

        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired(user));
        }

        Ok(SignUpOutcome::SignedIn(self.issue_session(&mut state, user)))
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.check_failure().await?;

        let mut state = self.state.write().await;
        let grant = state
            .access_tokens
            .remove(access_token)
            .ok_or(AuthError::Unauthorized)?;
        state
            .refresh_tokens
            .retain(|_, user_id| *user_id != grant.user_id);
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        _redirect_to: Option<&str>,
    ) -> Result<()> {
        self.check_failure().await?;

        // Unknown emails succeed silently so the endpoint cannot probe for accounts.
        self.state
            .write()
            .await
            .recovery_requests
            .push(email.to_string());
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<User> {
        self.check_failure().await?;

        let state = self.state.read().await;
        let grant = state
            .access_tokens
            .get(access_token)
            .filter(|grant| grant.expires_at > Utc::now())
            .ok_or(AuthError::Unauthorized)?;

        state
            .user_by_id(grant.user_id)
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.check_failure().await?;

        let mut state = self.state.write().await;
        let user_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(AuthError::Unauthorized)?;
        let user = state
            .user_by_id(user_id)
            .cloned()
            .ok_or(AuthError::Unauthorized)?;

        Ok(self.issue_session(&mut state, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_and_resolve_user() {
        let provider = MockProvider::new();
        let user = provider
            .add_user("ada@example.com", "secret1", UserMetadata::default())
            .await;

        let session = provider
            .sign_in_with_password("ADA@example.com", "secret1")
            .await
            .unwrap();
        let resolved = provider.get_user(&session.access_token).await.unwrap();

        assert_eq!(resolved.id, user.id);
        assert!(resolved.last_sign_in_at.is_some());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let provider = MockProvider::new();
        provider
            .add_user("ada@example.com", "secret1", UserMetadata::default())
            .await;

        let err = provider
            .sign_in_with_password("ada@example.com", "secret2")
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn confirmation_flow() {
        let provider = MockProvider::new().with_email_confirmation(true);

        let outcome = provider
            .sign_up("new@example.com", "Abcdefg1", &UserMetadata::default(), None)
            .await
            .unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));

        let err = provider
            .sign_in_with_password("new@example.com", "Abcdefg1")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::EmailNotConfirmed);

        provider.confirm_email("new@example.com").await.unwrap();
        provider
            .sign_in_with_password("new@example.com", "Abcdefg1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_sign_up_fails() {
        let provider = MockProvider::new();
        provider
            .sign_up("dup@example.com", "Abcdefg1", &UserMetadata::default(), None)
            .await
            .unwrap();

        let err = provider
            .sign_up("dup@example.com", "Abcdefg1", &UserMetadata::default(), None)
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::UserAlreadyExists);
    }

    #[tokio::test]
    async fn refresh_tokens_are_single_use() {
        let provider = MockProvider::new();
        provider
            .add_user("ada@example.com", "secret1", UserMetadata::default())
            .await;
        let session = provider
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap();

        let refreshed = provider
            .refresh_session(&session.refresh_token)
            .await
            .unwrap();
        assert_ne!(refreshed.access_token, session.access_token);

        let err = provider
            .refresh_session(&session.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn expired_access_token_is_unauthorized() {
        let provider = MockProvider::new();
        provider
            .add_user("ada@example.com", "secret1", UserMetadata::default())
            .await;
        let session = provider
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap();

        provider.expire_access_tokens().await;

        let err = provider.get_user(&session.access_token).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn sign_out_revokes_tokens() {
        let provider = MockProvider::new();
        provider
            .add_user("ada@example.com", "secret1", UserMetadata::default())
            .await;
        let session = provider
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap();

        provider.sign_out(&session.access_token).await.unwrap();

        assert!(provider.get_user(&session.access_token).await.is_err());
        assert!(provider
            .refresh_session(&session.refresh_token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn injected_failure_applies_until_cleared() {
        let provider = MockProvider::new();
        provider
            .fail_with(Some(AuthError::Transport("down".into())))
            .await;

        let err = provider
            .reset_password_for_email("ada@example.com", None)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Transport("down".into()));

        provider.fail_with(None).await;
        provider
            .reset_password_for_email("ada@example.com", None)
            .await
            .unwrap();
        assert_eq!(provider.recovery_requests().await, vec!["ada@example.com"]);
    }
}
