//! Application state shared by all request handlers.

use launchpad_auth::AuthState;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
}

impl AppState {
    pub fn new(auth: AuthState) -> Self {
        Self { auth }
    }

    /// Whether debug details may be shown on pages.
    pub fn debug(&self) -> bool {
        self.auth.config.debug
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}
