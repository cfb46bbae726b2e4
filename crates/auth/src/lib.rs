//! Session gate and auth provider adapters for launchpad.
//!
//! This crate provides:
//! - A REST adapter for the hosted auth service (and an in-memory mock)
//! - Session cookie storage and request-time refresh
//! - The session gate middleware and axum extractors
//! - The auth state broadcaster used by UI code

mod client;
mod config;
mod context;
mod cookies;
mod error;
mod extractors;
mod gate;
mod providers;
mod refresher;
mod state;

pub use client::AuthClient;
pub use config::{AppEnv, AuthConfig, ConfigError};
pub use context::{
    AuthContext, AuthSnapshot, EffectRecorder, CONFIRM_EMAIL_MESSAGE, RESET_SENT_MESSAGE,
    SIGNED_IN_MESSAGE, SIGNED_OUT_MESSAGE, SIGNED_UP_MESSAGE,
};
pub use cookies::{
    append_set_cookies, apply_mutations, request_cookies, rewrite_cookie_header, to_cookie,
    SessionCookieCodec, CHUNK_SIZE, SESSION_MAX_AGE_SECS,
};
pub use error::AuthError;
pub use extractors::{CurrentUser, OptionalUser};
pub use gate::{session_gate, SessionGate};
pub use providers::GoTrueProvider;
#[cfg(any(test, feature = "mock"))]
pub use providers::MockProvider;
pub use refresher::{CookieSessionRefresher, DEFAULT_REFRESH_MARGIN_SECS};
pub use state::AuthState;
