use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity record as returned by the provider. Read-only on our side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the provider recorded an email confirmation.
    pub fn is_email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    /// Reads a string entry from the metadata map.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Custom profile fields sent along with a sign-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserMetadata {
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Converts into the map shape stored on [`User::user_metadata`].
    pub fn into_map(self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Opaque credential bundle issued by the provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user.id)
            .finish()
    }
}

/// Result of a successful sign-up call.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The provider issued a session straight away.
    SignedIn(Session),
    /// The account exists but the email must be confirmed before a session is issued.
    ConfirmationRequired(User),
}

impl SignUpOutcome {
    pub fn user(&self) -> &User {
        match self {
            Self::SignedIn(session) => &session.user,
            Self::ConfirmationRequired(user) => user,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) => Some(session),
            Self::ConfirmationRequired(_) => None,
        }
    }
}

/// Kind of change announced to session listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl std::fmt::Display for AuthChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
        };
        write!(f, "{name}")
    }
}

/// A session change notification. The session is always a full replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn new(event: AuthChangeEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}

/// Cookies present on an incoming request, by name.
pub type RequestCookies = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

/// Attributes applied to a cookie written back to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    /// `Some(0)` expires the cookie immediately.
    pub max_age_secs: Option<i64>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            max_age_secs: None,
        }
    }
}

/// A cookie write the provider wants propagated onto the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieMutation {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl CookieMutation {
    pub fn set(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    pub fn remove(name: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            options: CookieOptions {
                max_age_secs: Some(0),
                ..options
            },
        }
    }

    pub fn is_removal(&self) -> bool {
        self.options.max_age_secs == Some(0)
    }
}

/// What the provider's refresh call yields for a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshedSession {
    pub user: Option<User>,
    pub cookies: Vec<CookieMutation>,
}

impl RefreshedSession {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_json() -> serde_json::Value {
        serde_json::json!({
            "id": "8d6c7a53-7e2b-4f0a-9f43-0b1b6f0d2a11",
            "aud": "authenticated",
            "email": "ada@example.com",
            "user_metadata": { "full_name": "Ada Lovelace" },
            "email_confirmed_at": "2024-03-01T10:00:00Z",
            "created_at": "2024-03-01T09:59:00Z"
        })
    }

    #[test]
    fn user_deserializes_provider_payload() {
        let user: User = serde_json::from_value(user_json()).unwrap();
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.metadata_str("full_name"), Some("Ada Lovelace"));
        assert!(user.is_email_confirmed());
        assert!(user.last_sign_in_at.is_none());
    }

    #[test]
    fn user_without_optional_fields() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "8d6c7a53-7e2b-4f0a-9f43-0b1b6f0d2a11",
            "created_at": "2024-03-01T09:59:00Z"
        }))
        .unwrap();
        assert!(user.email.is_none());
        assert!(user.user_metadata.is_empty());
        assert!(!user.is_email_confirmed());
    }

    #[test]
    fn metadata_omits_empty_fields() {
        let map = UserMetadata::default().with_full_name("Ada").into_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["full_name"], "Ada");
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = Session {
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
            token_type: "bearer".into(),
            expires_at: Utc::now(),
            user: serde_json::from_value(user_json()).unwrap(),
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }

    #[test]
    fn removal_mutation_expires_immediately() {
        let cookie = CookieMutation::remove("sb-auth", CookieOptions::default());
        assert!(cookie.is_removal());
        assert!(cookie.value.is_empty());
        assert_eq!(cookie.options.path, "/");
    }

    #[test]
    fn auth_change_event_display_matches_wire_name() {
        assert_eq!(AuthChangeEvent::SignedIn.to_string(), "SIGNED_IN");
        let json = serde_json::to_string(&AuthChangeEvent::TokenRefreshed).unwrap();
        assert_eq!(json, "\"TOKEN_REFRESHED\"");
    }
}
