//! Auth state broadcaster.
//!
//! [`AuthContext`] is the single source of truth for "who is signed in"
//! within one UI scope. It is built once at the scope's root and handed to
//! consumers, which read snapshots or watch for changes.

use std::sync::{Arc, Mutex};

use launchpad_core::auth::{
    AuthService, Navigator, Result, Session, SessionChange, SignUpOutcome, Subscription, User,
    UserMetadata, DASHBOARD_PATH, LOGIN_PATH,
};
use launchpad_core::notify::{Notification, Notifier};
use tokio::sync::watch;

pub const SIGNED_IN_MESSAGE: &str = "Signed in successfully!";
pub const SIGNED_UP_MESSAGE: &str = "Account created successfully!";
pub const CONFIRM_EMAIL_MESSAGE: &str = "Check your email to confirm your account.";
pub const SIGNED_OUT_MESSAGE: &str = "Signed out successfully.";
pub const RESET_SENT_MESSAGE: &str = "Password reset email sent. Check your inbox.";

/// What the broadcaster currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    pub session: Option<Session>,
    pub is_loading: bool,
}

impl AuthSnapshot {
    fn loading() -> Self {
        Self {
            user: None,
            session: None,
            is_loading: true,
        }
    }

    fn from_session(session: Option<Session>) -> Self {
        Self {
            user: session.as_ref().map(|s| s.user.clone()),
            session,
            is_loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

pub struct AuthContext {
    service: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    state: Arc<watch::Sender<AuthSnapshot>>,
    subscription: Mutex<Option<Subscription>>,
}

impl AuthContext {
    /// Creates the context and subscribes to session changes right away.
    ///
    /// Every change replaces the held user and session wholesale.
    pub fn new(
        service: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (sender, _) = watch::channel(AuthSnapshot::loading());
        let state = Arc::new(sender);

        let listener_state = state.clone();
        let subscription = service.on_session_change(Arc::new(move |change: &SessionChange| {
            tracing::debug!(event = %change.event, "Auth context received session change");
            listener_state.send_replace(AuthSnapshot::from_session(change.session.clone()));
        }));

        Self {
            service,
            navigator,
            notifier,
            state,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Loads the current session once. Loading ends whether or not the
    /// lookup succeeds.
    pub async fn init(&self) {
        match self.service.get_current_session().await {
            Ok(session) => {
                self.state.send_replace(AuthSnapshot::from_session(session));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load current session");
                self.state.send_modify(|snapshot| snapshot.is_loading = false);
            }
        }
    }

    /// Stops listening for session changes. Idempotent.
    pub fn teardown(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(subscription);
    }

    /// Receiver that observes every state replacement.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    fn fail<T>(&self, e: launchpad_core::auth::AuthError) -> Result<T> {
        self.notifier.notify(Notification::error(e.to_string()));
        Err(e)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        match self.service.sign_in(email, password).await {
            Ok(_) => {
                self.notifier.notify(Notification::success(SIGNED_IN_MESSAGE));
                self.navigator.navigate(DASHBOARD_PATH);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Registers an account. Navigates only when the provider issued a
    /// session; otherwise the user is told to confirm their email.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<SignUpOutcome> {
        match self.service.sign_up(email, password, metadata).await {
            Ok(outcome) => {
                match &outcome {
                    SignUpOutcome::SignedIn(_) => {
                        self.notifier.notify(Notification::success(SIGNED_UP_MESSAGE));
                        self.navigator.navigate(DASHBOARD_PATH);
                    }
                    SignUpOutcome::ConfirmationRequired(_) => {
                        self.notifier.notify(Notification::info(CONFIRM_EMAIL_MESSAGE));
                    }
                }
                Ok(outcome)
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn sign_out(&self) -> Result<()> {
        match self.service.sign_out().await {
            Ok(()) => {
                self.notifier.notify(Notification::success(SIGNED_OUT_MESSAGE));
                self.navigator.navigate(LOGIN_PATH);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        match self.service.reset_password(email).await {
            Ok(()) => {
                self.notifier.notify(Notification::success(RESET_SENT_MESSAGE));
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Navigator and notifier that record what they were asked to do.
///
/// Server-side form handlers use it to turn the broadcaster's side effects
/// into a redirect and a flash message.
#[derive(Debug, Default)]
pub struct EffectRecorder {
    navigations: Mutex<Vec<String>>,
    notifications: Mutex<Vec<Notification>>,
}

impl EffectRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_navigation(&self) -> Option<String> {
        self.navigations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .cloned()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_notification(&self) -> Option<Notification> {
        self.notifications().pop()
    }
}

impl Navigator for EffectRecorder {
    fn navigate(&self, path: &str) {
        self.navigations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());
    }
}

impl Notifier for EffectRecorder {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AuthClient;
    use crate::providers::MockProvider;
    use launchpad_core::auth::{AuthChangeEvent, AuthError, IdentityProvider};
    use launchpad_core::notify::NotificationKind;

    struct Harness {
        provider: MockProvider,
        client: AuthClient,
        effects: Arc<EffectRecorder>,
        context: AuthContext,
    }

    async fn harness(provider: MockProvider) -> Harness {
        provider
            .add_user("ada@example.com", "secret1", UserMetadata::default())
            .await;
        let client = AuthClient::new(Arc::new(provider.clone()));
        let effects = Arc::new(EffectRecorder::new());
        let context = AuthContext::new(
            Arc::new(client.clone()),
            effects.clone(),
            effects.clone(),
        );
        Harness {
            provider,
            client,
            effects,
            context,
        }
    }

    #[tokio::test]
    async fn starts_loading_until_init() {
        let h = harness(MockProvider::new()).await;
        assert!(h.context.is_loading());

        h.context.init().await;

        assert!(!h.context.is_loading());
        assert!(h.context.user().is_none());
    }

    #[tokio::test]
    async fn change_before_init_ends_loading() {
        let h = harness(MockProvider::new()).await;
        assert!(h.context.is_loading());

        h.client.sign_in("ada@example.com", "secret1").await.unwrap();

        assert!(!h.context.is_loading());
        assert_eq!(
            h.context.user().and_then(|u| u.email).as_deref(),
            Some("ada@example.com")
        );
    }

    #[tokio::test]
    async fn init_failure_still_ends_loading() {
        let h = harness(MockProvider::new()).await;
        let session = h
            .provider
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap();
        let client = h
            .client
            .clone()
            .with_session(Some(Session {
                expires_at: chrono::Utc::now(),
                ..session
            }));
        let context = AuthContext::new(Arc::new(client), h.effects.clone(), h.effects.clone());
        h.provider
            .fail_with(Some(AuthError::Transport("offline".into())))
            .await;

        context.init().await;

        assert!(!context.is_loading());
    }

    #[tokio::test]
    async fn sign_in_holds_user_and_sign_out_clears_it() {
        let h = harness(MockProvider::new()).await;
        h.context.init().await;

        h.context.sign_in("ada@example.com", "secret1").await.unwrap();

        let user = h.context.user().unwrap();
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(h.context.session().unwrap().user, user);
        assert_eq!(h.effects.last_navigation().as_deref(), Some(DASHBOARD_PATH));

        h.context.sign_out().await.unwrap();

        assert!(h.context.user().is_none());
        assert!(h.context.session().is_none());
        assert_eq!(h.effects.last_navigation().as_deref(), Some(LOGIN_PATH));
    }

    #[tokio::test]
    async fn failed_sign_in_notifies_and_returns_error() {
        let h = harness(MockProvider::new()).await;

        let err = h.context.sign_in("ada@example.com", "wrong1").await.unwrap_err();

        assert_eq!(err, AuthError::InvalidCredentials);
        let note = h.effects.last_notification().unwrap();
        assert_eq!(note.kind, NotificationKind::Error);
        assert_eq!(note.message, "invalid login credentials");
        assert!(h.effects.navigations().is_empty());
    }

    #[tokio::test]
    async fn sign_up_requiring_confirmation_does_not_navigate() {
        let h = harness(MockProvider::new().with_email_confirmation(true)).await;

        let outcome = h
            .context
            .sign_up("new@example.com", "Abcdefg1", &UserMetadata::default())
            .await
            .unwrap();

        assert!(outcome.session().is_none());
        assert!(h.effects.navigations().is_empty());
        let note = h.effects.last_notification().unwrap();
        assert_eq!(note.kind, NotificationKind::Info);
        assert!(h
            .effects
            .notifications()
            .iter()
            .all(|n| n.kind != NotificationKind::Success));
        assert!(h.context.user().is_none());
    }

    #[tokio::test]
    async fn sign_up_with_session_navigates() {
        let h = harness(MockProvider::new()).await;

        h.context
            .sign_up("new@example.com", "Abcdefg1", &UserMetadata::default())
            .await
            .unwrap();

        assert_eq!(h.effects.last_navigation().as_deref(), Some(DASHBOARD_PATH));
        assert_eq!(
            h.effects.last_notification().unwrap().kind,
            NotificationKind::Success
        );
        assert!(h.context.user().is_some());
    }

    #[tokio::test]
    async fn reset_password_confirms_without_navigating() {
        let h = harness(MockProvider::new()).await;

        h.context.reset_password("ada@example.com").await.unwrap();

        assert_eq!(
            h.effects.last_notification().unwrap().message,
            RESET_SENT_MESSAGE
        );
        assert!(h.effects.navigations().is_empty());
    }

    #[tokio::test]
    async fn external_changes_replace_state() {
        let h = harness(MockProvider::new()).await;
        let mut receiver = h.context.subscribe();

        // A sign-in performed through the client directly, as another tab would.
        h.client.sign_in("ada@example.com", "secret1").await.unwrap();

        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_authenticated());
        assert!(h.effects.notifications().is_empty());
    }

    #[tokio::test]
    async fn teardown_stops_updates() {
        let h = harness(MockProvider::new()).await;
        h.context.init().await;

        h.context.teardown();
        h.client.sign_in("ada@example.com", "secret1").await.unwrap();

        assert!(h.context.user().is_none());
    }

    #[tokio::test]
    async fn each_change_is_a_full_replacement() {
        let h = harness(MockProvider::new()).await;
        h.context.sign_in("ada@example.com", "secret1").await.unwrap();
        let first = h.context.session().unwrap();

        let listeners = Arc::new(Mutex::new(Vec::new()));
        let sink = listeners.clone();
        let _sub = h.client.on_session_change(Arc::new(move |change: &SessionChange| {
            sink.lock().unwrap().push(change.event);
        }));
        h.client.sign_out().await.unwrap();
        h.client.sign_in("ada@example.com", "secret1").await.unwrap();

        let second = h.context.session().unwrap();
        assert_ne!(first.access_token, second.access_token);
        assert_eq!(
            *listeners.lock().unwrap(),
            vec![AuthChangeEvent::SignedOut, AuthChangeEvent::SignedIn]
        );
    }
}
